//! Conversation history export.
//!
//! Pages through `messages.getHistory`, accumulates messages and the
//! deduplicated author/chat metadata, then writes one JSON document or a
//! plain-text transcript. A failed page ends the loop early; whatever was
//! fetched up to that point is still written.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::api::{VkClient, MAX_PAGE_SIZE};
use crate::authors::AuthorDirectory;
use crate::config::{Config, OutputFormat, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_DELAY_MS};
use crate::filter::{classify, is_text_message, MessageKind};
use crate::models::{Conversation, ExportResult, HistoryPage, Message};
use crate::output;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub page_size: u32,
    /// Pause between consecutive requests.
    pub request_delay: Duration,
    /// Drop non-text messages from JSON exports too.
    pub text_only: bool,
    /// Stop after this many raw messages.
    pub limit: Option<usize>,
    pub format: OutputFormat,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            text_only: false,
            limit: None,
            format: OutputFormat::Json,
        }
    }
}

impl ExportOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.page_size,
            request_delay: config.request_delay,
            text_only: config.text_only,
            limit: config.limit,
            format: config.output_format(),
        }
    }
}

/// Messages and metadata gathered across pages.
#[derive(Debug, Default)]
pub struct ExportAccumulator {
    messages: Vec<Message>,
    authors: AuthorDirectory,
    chats: BTreeMap<i64, Conversation>,
}

impl ExportAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page; returns how many messages it carried.
    pub fn absorb(&mut self, page: HistoryPage) -> usize {
        let received = page.items.len();
        self.messages.extend(page.items);
        self.authors.extend(page.profiles, page.groups);
        for chat in page.conversations {
            self.chats.insert(chat.peer.id, chat);
        }
        received
    }

    pub fn truncate(&mut self, limit: usize) {
        self.messages.truncate(limit);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn authors(&self) -> &AuthorDirectory {
        &self.authors
    }

    pub fn chat_count(&self) -> usize {
        self.chats.len()
    }

    /// Titles of the multi-user chats seen so far, by peer id.
    pub fn chat_titles(&self) -> Vec<&str> {
        self.chats.values().filter_map(Conversation::title).collect()
    }

    /// How many messages of each kind were fetched.
    pub fn tally(&self) -> HashMap<MessageKind, usize> {
        let mut counts = HashMap::new();
        for message in &self.messages {
            *counts.entry(classify(message)).or_insert(0) += 1;
        }
        counts
    }

    pub fn into_result(self, text_only: bool, export_date: DateTime<Local>) -> ExportResult {
        let messages: Vec<Message> = if text_only {
            self.messages.into_iter().filter(is_text_message).collect()
        } else {
            self.messages
        };

        ExportResult {
            total_messages: messages.len(),
            messages,
            profiles: self.authors.into_authors(),
            chats: self.chats.into_values().collect(),
            export_date: export_date.to_rfc3339(),
        }
    }
}

/// Outcome of the paging loop.
#[derive(Debug)]
pub struct Collected {
    pub accumulator: ExportAccumulator,
    pub pages: usize,
    /// The error that ended the loop early, if any.
    pub interrupted: Option<Error>,
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub pages: usize,
    /// Raw messages fetched, before filtering.
    pub fetched: usize,
    /// Messages (or transcript lines) written.
    pub written: usize,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub interrupted: Option<String>,
}

impl ExportSummary {
    pub fn is_complete(&self) -> bool {
        self.interrupted.is_none()
    }
}

pub struct Exporter {
    client: VkClient,
    options: ExportOptions,
}

impl Exporter {
    pub fn new(client: VkClient, options: ExportOptions) -> Result<Self> {
        if options.page_size == 0 || options.page_size > MAX_PAGE_SIZE {
            return Err(Error::InvalidArgument(format!(
                "page size must be within 1..={}, got {}",
                MAX_PAGE_SIZE, options.page_size
            )));
        }
        if options.limit == Some(0) {
            return Err(Error::InvalidArgument("limit must be positive".to_string()));
        }
        Ok(Self { client, options })
    }

    /// Fetch pages until a short or empty page, the limit, or an error.
    pub async fn collect(&self, peer_id: i64) -> Collected {
        let page_size = self.options.page_size;
        let mut accumulator = ExportAccumulator::new();
        let mut pages = 0usize;
        let mut offset: u64 = 0;
        let mut interrupted = None;

        loop {
            if pages > 0 && !self.options.request_delay.is_zero() {
                tokio::time::sleep(self.options.request_delay).await;
            }

            info!(peer_id, offset, "Fetching messages");
            let page = match self.client.fetch_page(peer_id, offset, page_size).await {
                Ok(page) => page,
                Err(err) => {
                    warn!(
                        peer_id,
                        offset,
                        fetched = accumulator.len(),
                        "Stopping export, page request failed: {}",
                        err
                    );
                    interrupted = Some(err);
                    break;
                }
            };
            pages += 1;

            let total = page.count;
            let received = accumulator.absorb(page);
            debug!(received, total, accumulated = accumulator.len(), "Page received");

            if received == 0 {
                break;
            }
            if let Some(limit) = self.options.limit {
                if accumulator.len() >= limit {
                    accumulator.truncate(limit);
                    info!(limit, "Message limit reached");
                    break;
                }
            }
            if received < page_size as usize {
                break;
            }
            offset += u64::from(page_size);
        }

        Collected {
            accumulator,
            pages,
            interrupted,
        }
    }

    /// Fetch the whole history and write it to `output`.
    ///
    /// Page failures end the run early but still produce a file; only local
    /// failures (serialization, IO) are returned as errors.
    pub async fn export_all(&self, peer_id: i64, output: &Path) -> Result<ExportSummary> {
        let Collected {
            accumulator,
            pages,
            interrupted,
        } = self.collect(peer_id).await;

        let fetched = accumulator.len();
        debug!(kinds = ?accumulator.tally(), "Fetched message kinds");
        info!(
            fetched,
            pages,
            profiles = accumulator.authors().profile_count(),
            groups = accumulator.authors().group_count(),
            chats = accumulator.chat_count(),
            "Download finished"
        );
        for title in accumulator.chat_titles() {
            info!(title, "Chat");
        }

        let (contents, written) = match self.options.format {
            OutputFormat::Json => {
                let result = accumulator.into_result(self.options.text_only, Local::now());
                let written = result.total_messages;
                (output::render_json(&result)?, written)
            }
            OutputFormat::Text => {
                let lines = output::transcript_lines(accumulator.messages(), accumulator.authors());
                let written = lines.len();
                (output::render_transcript(&lines), written)
            }
        };

        output::write_file(output, &contents).await?;
        info!(
            written,
            path = %output.display(),
            format = %self.options.format,
            "Saved export"
        );

        Ok(ExportSummary {
            pages,
            fetched,
            written,
            output: output.to_path_buf(),
            format: self.options.format,
            interrupted: interrupted.map(|e| e.to_string()),
        })
    }
}
