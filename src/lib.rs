//! VK Conversation History Exporter Library
//!
//! This library provides tools to:
//! - Page through a conversation's history via `messages.getHistory`
//! - Resolve message authors from the extended profile and group lists
//! - Filter service, deleted and attachment-only messages
//! - Write the history as a JSON document or a plain-text transcript
//! - Obtain a user access token through the implicit OAuth flow

pub mod api;
pub mod auth;
pub mod authors;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod logging;
pub mod models;
pub mod output;

// Re-export common types
pub use api::VkClient;
pub use authors::{resolve_author_name, AuthorDirectory};
pub use config::{Config, OutputFormat};
pub use error::{Error, Result};
pub use export::{ExportOptions, ExportSummary, Exporter};
pub use filter::is_text_message;
pub use models::{ExportResult, HistoryPage, Message};
