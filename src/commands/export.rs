//! Export a conversation's history to a file.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::api::VkClient;
use crate::config::{Config, OutputFormat};
use crate::error::{Error, Result};
use crate::export::{ExportOptions, ExportSummary, Exporter};
use crate::models::{chat_peer_id, is_chat_peer};

/// Command-line overrides on top of [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ExportArgs {
    pub peer: Option<i64>,
    /// Multi-user chat number, mapped to `2000000000 + chat`.
    pub chat: Option<i64>,
    pub output: Option<PathBuf>,
    pub format: Option<String>,
    pub page_size: Option<u32>,
    pub delay_ms: Option<u64>,
    pub limit: Option<usize>,
    pub text_only: bool,
    pub oldest_first: bool,
}

impl ExportArgs {
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if self.peer.is_some() && self.chat.is_some() {
            return Err(Error::InvalidArgument(
                "use either a peer id or a chat number, not both".to_string(),
            ));
        }
        if let Some(peer) = self.peer {
            config.peer_id = Some(peer);
        }
        if let Some(chat) = self.chat {
            config.peer_id = Some(chat_peer_id(chat));
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(format) = &self.format {
            config.format = Some(format.parse::<OutputFormat>()?);
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.request_delay = std::time::Duration::from_millis(delay_ms);
        }
        if let Some(limit) = self.limit {
            config.limit = Some(limit);
        }
        config.text_only |= self.text_only;
        config.oldest_first |= self.oldest_first;
        Ok(())
    }
}

pub async fn run(mut config: Config, args: ExportArgs) -> Result<ExportSummary> {
    args.apply(&mut config)?;
    config.validate()?;
    let peer_id = config.require_peer()?;

    let client = VkClient::with_base_url(config.access_token.clone(), config.api_url.clone())?
        .api_version(config.api_version.clone())
        .oldest_first(config.oldest_first);
    let exporter = Exporter::new(client, ExportOptions::from_config(&config))?;

    info!(
        peer_id,
        chat = is_chat_peer(peer_id),
        output = %config.output.display(),
        format = %config.output_format(),
        "Starting export"
    );
    let summary = exporter.export_all(peer_id, &config.output).await?;

    match &summary.interrupted {
        None => info!(
            "Downloaded {} messages, saved {} to {}",
            summary.fetched,
            summary.written,
            summary.output.display()
        ),
        Some(reason) => warn!(
            "Export interrupted after {} messages ({}); partial output saved to {}",
            summary.fetched,
            reason,
            summary.output.display()
        ),
    }

    Ok(summary)
}

/// Lines printed to the terminal once an export finishes.
pub fn report_lines(summary: &ExportSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Saved {} of {} messages to {}",
        summary.written,
        summary.fetched,
        summary.output.display()
    )];
    if let Some(reason) = &summary.interrupted {
        lines.push(format!("Export stopped early: {}", reason));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    fn base_config(server: &MockServer, output: PathBuf) -> Config {
        let mut config = Config::defaults();
        config.access_token = "test-token".to_string();
        config.api_url = server.base_url();
        config.peer_id = None;
        config.output = output;
        config.format = None;
        config.request_delay = Duration::ZERO;
        config.limit = None;
        config.text_only = false;
        config.oldest_first = false;
        config
    }

    #[test]
    fn apply_overrides_config() {
        let mut config = Config::defaults();
        let args = ExportArgs {
            chat: Some(12),
            output: Some(PathBuf::from("dump.txt")),
            format: Some("json".into()),
            page_size: Some(50),
            delay_ms: Some(0),
            limit: Some(10),
            text_only: true,
            oldest_first: true,
            ..Default::default()
        };

        args.apply(&mut config).unwrap();

        assert_eq!(config.peer_id, Some(2_000_000_012));
        assert_eq!(config.output, PathBuf::from("dump.txt"));
        assert_eq!(config.output_format(), OutputFormat::Json);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.request_delay, Duration::ZERO);
        assert_eq!(config.limit, Some(10));
        assert!(config.text_only);
        assert!(config.oldest_first);
    }

    #[test]
    fn apply_rejects_peer_and_chat_together() {
        let mut config = Config::defaults();
        let args = ExportArgs {
            peer: Some(1),
            chat: Some(1),
            ..Default::default()
        };
        assert!(matches!(args.apply(&mut config), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn apply_rejects_unknown_format() {
        let mut config = Config::defaults();
        let args = ExportArgs {
            format: Some("xml".into()),
            ..Default::default()
        };
        assert!(args.apply(&mut config).is_err());
    }

    #[tokio::test]
    async fn run_requires_peer() {
        let server = MockServer::start_async().await;
        let dir = tempdir().unwrap();
        let config = base_config(&server, dir.path().join("out.json"));

        let err = run(config, ExportArgs::default()).await.unwrap_err();
        assert!(matches!(err, Error::MissingConfig(_)));
    }

    #[tokio::test]
    async fn run_requires_token() {
        let server = MockServer::start_async().await;
        let dir = tempdir().unwrap();
        let mut config = base_config(&server, dir.path().join("out.json"));
        config.access_token.clear();

        let args = ExportArgs {
            peer: Some(5),
            ..Default::default()
        };
        let err = run(config, args).await.unwrap_err();
        assert!(matches!(err, Error::MissingConfig(_)));
    }

    #[tokio::test]
    async fn run_exports_with_cli_overrides() {
        let server = MockServer::start_async().await;

        let history = server.mock(|when, then| {
            when.method(GET)
                .path("/messages.getHistory")
                .query_param("peer_id", "2000000003")
                .query_param("rev", "1")
                .query_param("count", "20");
            then.status(200).json_body(json!({
                "response": {
                    "count": 1,
                    "items": [{"id": 1, "date": 60, "from_id": 4, "text": "hello"}],
                    "profiles": [{"id": 4, "first_name": "Olga", "last_name": "K"}]
                }
            }));
        });

        let dir = tempdir().unwrap();
        let output = dir.path().join("chat.txt");
        let config = base_config(&server, dir.path().join("ignored.json"));
        let args = ExportArgs {
            chat: Some(3),
            output: Some(output.clone()),
            page_size: Some(20),
            oldest_first: true,
            ..Default::default()
        };

        let summary = run(config, args).await.unwrap();

        assert!(summary.is_complete());
        assert_eq!(summary.format, OutputFormat::Text);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "[1970-01-01 00:01:00] Olga K: hello\n"
        );
        history.assert_calls(1);
    }

    fn summary(interrupted: Option<&str>) -> ExportSummary {
        ExportSummary {
            pages: 2,
            fetched: 250,
            written: 225,
            output: PathBuf::from("out.json"),
            format: OutputFormat::Json,
            interrupted: interrupted.map(str::to_string),
        }
    }

    #[test]
    fn report_lines_for_complete_export() {
        assert_eq!(
            report_lines(&summary(None)),
            vec!["Saved 225 of 250 messages to out.json".to_string()]
        );
    }

    #[test]
    fn report_lines_mention_interruption() {
        let lines = report_lines(&summary(Some("API error 6: Too many requests per second")));
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "Export stopped early: API error 6: Too many requests per second"
        );
    }
}
