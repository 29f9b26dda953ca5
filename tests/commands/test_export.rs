//! Tests for the export command

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::{json, Value};
use tempfile::tempdir;
use vk_history_export::commands::{export_run, ExportArgs};
use vk_history_export::{Config, ExportOptions, Exporter, OutputFormat, VkClient};

const PEER: i64 = 2_504_000_332;

fn history_page(start: i64, len: i64) -> Value {
    let items: Vec<Value> = (start..start + len)
        .map(|id| {
            // Every tenth message is a service message.
            if id % 10 == 0 {
                json!({
                    "id": id, "date": 1_600_000_000 + id, "from_id": 11, "peer_id": PEER,
                    "text": "", "attachments": [], "action": {"type": "chat_pin_message"}
                })
            } else {
                let from_id = if id % 2 == 0 { 11 } else { -22 };
                json!({
                    "id": id, "date": 1_600_000_000 + id, "from_id": from_id,
                    "peer_id": PEER, "text": format!("text {id}"), "attachments": []
                })
            }
        })
        .collect();

    json!({
        "response": {
            "count": 250,
            "items": items,
            "profiles": [{"id": 11, "first_name": "Анна", "last_name": "Смирнова"}],
            "groups": [{"id": 22, "name": "Bot Group", "screen_name": "botgroup"}],
            "conversations": [{"peer": {"id": PEER, "type": "chat", "local_id": 504000332},
                               "chat_settings": {"title": "Family"}}]
        }
    })
}

fn mock_two_pages(server: &MockServer) -> (httpmock::Mock<'_>, httpmock::Mock<'_>) {
    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/messages.getHistory")
            .query_param("peer_id", PEER.to_string())
            .query_param("offset", "0")
            .query_param("count", "200")
            .query_param("extended", "1");
        then.status(200).json_body(history_page(1, 200));
    });
    let second = server.mock(|when, then| {
        when.method(GET)
            .path("/messages.getHistory")
            .query_param("peer_id", PEER.to_string())
            .query_param("offset", "200")
            .query_param("count", "200");
        then.status(200).json_body(history_page(201, 50));
    });
    (first, second)
}

fn exporter(server: &MockServer, format: OutputFormat, text_only: bool) -> Exporter {
    let client = VkClient::with_base_url("token", server.base_url()).expect("client");
    Exporter::new(
        client,
        ExportOptions {
            request_delay: Duration::ZERO,
            format,
            text_only,
            ..Default::default()
        },
    )
    .expect("exporter")
}

#[tokio::test]
async fn two_page_export_stops_after_short_page() {
    let server = MockServer::start_async().await;
    let (first, second) = mock_two_pages(&server);

    let dir = tempdir().unwrap();
    let path = dir.path().join("my_messages.json");

    let summary = exporter(&server, OutputFormat::Json, false)
        .export_all(PEER, &path)
        .await
        .expect("export");

    assert_eq!(summary.pages, 2);
    assert_eq!(summary.fetched, 250);
    assert_eq!(summary.written, 250);
    assert!(summary.is_complete());
    first.assert_calls(1);
    second.assert_calls(1);

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("Смирнова"));

    let parsed: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["total_messages"], json!(250));
    assert_eq!(parsed["messages"].as_array().unwrap().len(), 250);
    // Profiles and groups are deduplicated across pages.
    assert_eq!(parsed["profiles"].as_array().unwrap().len(), 2);
    assert_eq!(parsed["chats"].as_array().unwrap().len(), 1);
    assert_eq!(parsed["chats"][0]["chat_settings"]["title"], json!("Family"));
    assert!(parsed["export_date"].as_str().is_some());
}

#[tokio::test]
async fn text_only_json_drops_service_messages() {
    let server = MockServer::start_async().await;
    mock_two_pages(&server);

    let dir = tempdir().unwrap();
    let path = dir.path().join("text_only.json");

    let summary = exporter(&server, OutputFormat::Json, true)
        .export_all(PEER, &path)
        .await
        .expect("export");

    // 25 of the 250 ids are multiples of ten.
    assert_eq!(summary.fetched, 250);
    assert_eq!(summary.written, 225);

    let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed["total_messages"], json!(225));
}

#[tokio::test]
async fn transcript_export_resolves_users_and_groups() {
    let server = MockServer::start_async().await;
    mock_two_pages(&server);

    let dir = tempdir().unwrap();
    let path = dir.path().join("transcript.txt");

    let summary = exporter(&server, OutputFormat::Text, false)
        .export_all(PEER, &path)
        .await
        .expect("export");

    assert_eq!(summary.written, 225);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 225);
    assert_eq!(lines[0], "[2020-09-13 12:26:41] Bot Group: text 1");
    assert_eq!(lines[1], "[2020-09-13 12:26:42] Анна Смирнова: text 2");
    assert!(lines.iter().all(|l| !l.contains("Unknown")));
}

#[tokio::test]
async fn export_command_with_config_file() {
    let server = MockServer::start_async().await;
    let (first, second) = mock_two_pages(&server);

    let dir = tempdir().unwrap();
    let output = dir.path().join("from_config.json");
    let config_path = dir.path().join("config.yml");
    std::fs::write(
        &config_path,
        format!(
            "vk:\n  access_token: \"token\"\n  api_url: \"{}\"\nexport:\n  request_delay_ms: 0\n",
            server.base_url()
        ),
    )
    .unwrap();

    let mut config = Config::load_from_file(&config_path).expect("config");
    // The environment may carry real credentials; the mock needs these.
    config.access_token = "token".to_string();
    config.api_url = server.base_url();
    config.page_size = 200;
    config.format = None;
    config.limit = None;

    let summary = export_run(
        config,
        ExportArgs {
            peer: Some(PEER),
            output: Some(output.clone()),
            delay_ms: Some(0),
            ..Default::default()
        },
    )
    .await
    .expect("export");

    assert_eq!(summary.fetched, 250);
    assert_eq!(summary.format, OutputFormat::Json);
    assert!(output.exists());
    first.assert_calls(1);
    second.assert_calls(1);
}
