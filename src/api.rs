//! Minimal VK API client (message history).

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::models::HistoryPage;
use crate::{Error, Result};

pub const VK_API_URL: &str = "https://api.vk.com/method";
pub const API_VERSION: &str = "5.199";

/// `messages.getHistory` returns at most this many items per call.
pub const MAX_PAGE_SIZE: u32 = 200;

const HISTORY_METHOD: &str = "messages.getHistory";

#[derive(Debug, Clone)]
pub struct VkClient {
    http: Client,
    access_token: String,
    api_version: String,
    base_url: String,
    oldest_first: bool,
}

impl VkClient {
    /// Create client with provided access token.
    pub fn new<S: Into<String>>(access_token: S) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(Error::MissingConfig("VK access token is empty".to_string()));
        }

        let http = Client::builder()
            .user_agent(format!("vk_history_export/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ConnectionError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            access_token,
            api_version: API_VERSION.to_string(),
            base_url: VK_API_URL.to_string(),
            oldest_first: false,
        })
    }

    /// Create client with custom base url (primarily for tests).
    pub fn with_base_url<S1: Into<String>, S2: Into<String>>(
        access_token: S1,
        base_url: S2,
    ) -> Result<Self> {
        let mut client = Self::new(access_token)?;
        client.base_url = base_url.into();
        Ok(client)
    }

    pub fn api_version<S: Into<String>>(mut self, version: S) -> Self {
        self.api_version = version.into();
        self
    }

    /// Ask for history oldest-first (`rev=1`).
    pub fn oldest_first(mut self, oldest_first: bool) -> Self {
        self.oldest_first = oldest_first;
        self
    }

    async fn call<D: DeserializeOwned>(&self, method: &str, params: &[(&str, String)]) -> Result<D> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), method);
        debug!(%url, ?params, "VK request");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("v", self.api_version.as_str()),
            ])
            .query(params)
            .send()
            .await
            .map_err(|e| Error::ConnectionError(format!("failed to reach VK: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::ConnectionError(format!("failed to read VK response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: Envelope<D> = serde_json::from_str(&text).map_err(|e| {
            Error::Decode(format!(
                "{} returned an unexpected body: {} ({})",
                method,
                preview(&text),
                e
            ))
        })?;

        if let Some(error) = envelope.error {
            return Err(Error::Api {
                code: error.error_code,
                message: error.error_msg,
            });
        }

        envelope
            .response
            .ok_or_else(|| Error::Decode(format!("{} returned an empty response", method)))
    }

    /// Fetch one page of a conversation's history with extended author info.
    pub async fn fetch_page(&self, peer_id: i64, offset: u64, count: u32) -> Result<HistoryPage> {
        if count == 0 || count > MAX_PAGE_SIZE {
            return Err(Error::InvalidArgument(format!(
                "page size must be within 1..={}, got {}",
                MAX_PAGE_SIZE, count
            )));
        }

        let params = [
            ("peer_id", peer_id.to_string()),
            ("offset", offset.to_string()),
            ("count", count.to_string()),
            ("extended", "1".to_string()),
            ("rev", if self.oldest_first { "1" } else { "0" }.to_string()),
        ];

        self.call(HISTORY_METHOD, &params).await
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<D> {
    response: Option<D>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error_code: i64,
    #[serde(default)]
    error_msg: String,
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 200;
    if text.chars().count() <= LIMIT {
        return text.to_string();
    }
    let head: String = text.chars().take(LIMIT).collect();
    format!("{}...", head)
}
