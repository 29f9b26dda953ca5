//! VK API payloads used by the exporter.
//!
//! Only the fields the exporter reads are typed. Everything else the API sends
//! is kept in `extra` so JSON exports carry the full objects through.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Group chats are addressed as `2000000000 + chat_id`.
pub const CHAT_PEER_OFFSET: i64 = 2_000_000_000;

/// Peer id of a multi-user chat.
pub fn chat_peer_id(chat_id: i64) -> i64 {
    CHAT_PEER_OFFSET + chat_id
}

/// Whether a peer id points at a multi-user chat.
pub fn is_chat_peer(peer_id: i64) -> bool {
    peer_id > CHAT_PEER_OFFSET
}

/// Keys VK uses for the deletion flag.
const DELETED_KEYS: [&str; 2] = ["deleted", "is_deleted"];

/// A single message from `messages.getHistory`.
///
/// Fields the API omitted stay omitted on the way back out, so a JSON export
/// carries each item exactly as it was received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    /// Unix timestamp, seconds.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub date: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub from_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Value>>,
    /// Service action (chat created, user invited, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,
    /// Everything else, including the deletion flag under whichever key VK
    /// sent it.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    /// Message body; empty when absent.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    pub fn has_attachments(&self) -> bool {
        self.attachments.as_ref().is_some_and(|a| !a.is_empty())
    }

    /// VK reports the flag as `0`/`1`; booleans count too.
    pub fn is_deleted(&self) -> bool {
        DELETED_KEYS
            .iter()
            .filter_map(|key| self.extra.get(*key))
            .any(flag_is_set)
    }
}

/// A user profile from the `profiles` list of an extended response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    /// "First Last", falling back to the screen name.
    pub fn display_name(&self) -> Option<String> {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if !full.is_empty() {
            return Some(full.to_string());
        }
        self.screen_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// A community from the `groups` list. The id is positive here; messages
/// authored by the community carry `-id` as `from_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Group {
    pub fn display_name(&self) -> Option<String> {
        let name = self.name.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
        self.screen_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationPeer {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Conversation metadata from the `conversations` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub peer: ConversationPeer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_settings: Option<ChatSettings>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Conversation {
    pub fn title(&self) -> Option<&str> {
        self.chat_settings.as_ref()?.title.as_deref()
    }
}

/// The `response` object of an extended `messages.getHistory` call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryPage {
    /// Total number of messages in the conversation.
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub items: Vec<Message>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub conversations: Vec<Conversation>,
}

/// Entry of the merged `profiles` list in a JSON export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Author {
    User(Profile),
    Group(Group),
}

/// Everything a JSON export writes.
#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub messages: Vec<Message>,
    pub profiles: Vec<Author>,
    pub chats: Vec<Conversation>,
    pub export_date: String,
    pub total_messages: usize,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn flag_is_set(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}
