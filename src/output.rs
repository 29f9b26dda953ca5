//! Rendering and writing of export files.

use std::path::Path;

use chrono::{DateTime, Utc};
use tokio::fs;

use crate::authors::AuthorDirectory;
use crate::filter::is_text_message;
use crate::models::{ExportResult, Message};
use crate::Result;

/// `YYYY-MM-DD HH:MM:SS` in UTC; out-of-range values are printed raw.
pub fn format_timestamp(unix: i64) -> String {
    DateTime::<Utc>::from_timestamp(unix, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| unix.to_string())
}

/// Message text on a single line.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `[timestamp] Author: text`
pub fn transcript_line(message: &Message, authors: &AuthorDirectory) -> String {
    format!(
        "[{}] {}: {}",
        format_timestamp(message.date),
        authors.resolve(message.from_id),
        single_line(message.text())
    )
}

/// Transcript lines for the text messages, oldest first.
pub fn transcript_lines(messages: &[Message], authors: &AuthorDirectory) -> Vec<String> {
    let mut text_messages: Vec<&Message> =
        messages.iter().filter(|m| is_text_message(m)).collect();
    text_messages.sort_by_key(|m| (m.date, m.id));

    text_messages
        .into_iter()
        .map(|m| transcript_line(m, authors))
        .collect()
}

pub fn render_transcript(lines: &[String]) -> String {
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    content
}

/// Pretty-printed JSON; non-ASCII text is written as-is.
pub fn render_json(result: &ExportResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Write the whole file at once, creating parent directories.
pub async fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, contents).await?;
    Ok(())
}
