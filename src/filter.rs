//! Message classification for text-only exports.

use crate::models::Message;

/// What kind of entry a history item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Text,
    Deleted,
    /// Service message (chat created, member invited, ...).
    Action,
    AttachmentOnly,
    Empty,
    Malformed,
}

/// Classify a message. Checks run from structural to content problems, so a
/// deleted service message reports `Malformed` only when its ids are broken.
pub fn classify(message: &Message) -> MessageKind {
    if message.id <= 0 || message.from_id == 0 || message.date <= 0 {
        return MessageKind::Malformed;
    }
    if message.is_deleted() {
        return MessageKind::Deleted;
    }
    if message.action.is_some() {
        return MessageKind::Action;
    }
    if message.text().trim().is_empty() {
        if message.has_attachments() {
            return MessageKind::AttachmentOnly;
        }
        return MessageKind::Empty;
    }
    MessageKind::Text
}

/// True only for regular messages carrying some text.
pub fn is_text_message(message: &Message) -> bool {
    classify(message) == MessageKind::Text
}
