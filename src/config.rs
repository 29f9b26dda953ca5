//! Configuration for the VK API and export settings
//!
//! Loads configuration from config.yml (optional) and the environment.
//! Environment variables take precedence over config.yml values.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::api::{API_VERSION, MAX_PAGE_SIZE, VK_API_URL};
use crate::models::chat_peer_id;
use crate::{Error, Result};

/// Default constants (fallback if config.yml not found)
pub const CONFIG_FILE: &str = "config.yml";
pub const DEFAULT_OUTPUT: &str = "messages.json";
pub const DEFAULT_PAGE_SIZE: u32 = MAX_PAGE_SIZE;
/// Three requests per second stays under the VK user-token limit.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 340;

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    /// One `[timestamp] Author: text` line per message.
    Text,
}

impl OutputFormat {
    /// `.txt` files get a transcript, everything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("txt") => OutputFormat::Text,
            _ => OutputFormat::Json,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" | "txt" => Ok(OutputFormat::Text),
            other => Err(Error::InvalidArgument(format!(
                "unknown output format '{}', expected json or text",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Text => f.write_str("text"),
        }
    }
}

/// YAML config structures
#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    vk: Option<VkConfig>,
    export: Option<ExportConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct VkConfig {
    access_token: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    api_version: Option<String>,
    api_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExportConfig {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    peer_id: Option<String>,
    chat_id: Option<i64>,
    output: Option<String>,
    format: Option<String>,
    page_size: Option<u32>,
    request_delay_ms: Option<u64>,
    text_only: Option<bool>,
    oldest_first: Option<bool>,
    limit: Option<usize>,
}

/// Deserialize a value that can be either a string or a number
fn deserialize_string_or_number<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<serde_yaml::Value> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, got {:?}",
            other
        ))),
    }
}

/// Main configuration struct
#[derive(Clone)]
pub struct Config {
    pub access_token: String,
    pub api_version: String,
    pub api_url: String,
    pub peer_id: Option<i64>,
    pub output: PathBuf,
    /// Explicit format; inferred from `output` when unset.
    pub format: Option<OutputFormat>,
    pub page_size: u32,
    pub request_delay: Duration,
    pub text_only: bool,
    pub oldest_first: bool,
    pub limit: Option<usize>,
}

// The token never goes to logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("access_token", &mask_token(&self.access_token))
            .field("api_version", &self.api_version)
            .field("api_url", &self.api_url)
            .field("peer_id", &self.peer_id)
            .field("output", &self.output)
            .field("format", &self.format)
            .field("page_size", &self.page_size)
            .field("request_delay", &self.request_delay)
            .field("text_only", &self.text_only)
            .field("oldest_first", &self.oldest_first)
            .field("limit", &self.limit)
            .finish()
    }
}

fn mask_token(token: &str) -> String {
    if token.is_empty() {
        "<unset>".to_string()
    } else {
        "<redacted>".to_string()
    }
}

impl Config {
    /// Load configuration from ./config.yml, ../config.yml or the environment alone
    pub fn new() -> Result<Self> {
        Self::load_first(&[
            PathBuf::from(CONFIG_FILE),
            Path::new("..").join(CONFIG_FILE),
        ])
    }

    /// Load the first candidate file that exists; fall back to the
    /// environment when none does. A file that exists but fails to load is
    /// an error.
    pub fn load_first(candidates: &[PathBuf]) -> Result<Self> {
        for path in candidates {
            match Self::load_from_file(path) {
                Err(Error::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Ok(config) => {
                    tracing::debug!(path = %path.display(), "Loaded configuration file");
                    return Ok(config);
                }
                Err(err) => return Err(err),
            }
        }
        Self::from_env()
    }

    /// Resolve a string: env keys first, then a `${VAR}` placeholder, then
    /// the literal value.
    fn resolve_env_string(value: Option<String>, env_keys: &[&str]) -> Option<String> {
        for key in env_keys {
            if let Ok(env_val) = std::env::var(key) {
                if !env_val.trim().is_empty() {
                    return Some(env_val);
                }
            }
        }
        match value {
            Some(v) if v.starts_with("${") && v.ends_with('}') => {
                let var_name = &v[2..v.len() - 1];
                std::env::var(var_name).ok().filter(|s| !s.trim().is_empty())
            }
            other => other,
        }
    }

    fn resolve_env_parsed<T: FromStr>(
        value: Option<String>,
        env_keys: &[&str],
        what: &str,
    ) -> Result<Option<T>> {
        match Self::resolve_env_string(value, env_keys) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
                Error::InvalidArgument(format!("{} is not a valid number: '{}'", what, raw))
            }),
        }
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        // Try to load from current directory first, then parent
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let yaml: YamlConfig = serde_yaml::from_str(&content).map_err(|e| {
            Error::InvalidArgument(format!(
                "failed to parse {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml(yaml)
    }

    /// Configuration from the environment (and .env) only
    pub fn from_env() -> Result<Self> {
        Self::from_yaml(YamlConfig::default())
    }

    fn from_yaml(yaml: YamlConfig) -> Result<Self> {
        Self::load_dotenv();

        let vk = yaml.vk.unwrap_or_default();
        let export = yaml.export.unwrap_or_default();

        let access_token =
            Self::resolve_env_string(vk.access_token, &["VK_ACCESS_TOKEN", "API_KEY"])
                .unwrap_or_default();
        let api_version = Self::resolve_env_string(vk.api_version, &["VK_API_VERSION"])
            .unwrap_or_else(|| API_VERSION.to_string());
        let api_url = Self::resolve_env_string(vk.api_url, &["VK_API_URL"])
            .unwrap_or_else(|| VK_API_URL.to_string());

        let peer_id =
            Self::resolve_env_parsed::<i64>(export.peer_id, &["VK_PEER_ID"], "peer id")?
                .or_else(|| export.chat_id.map(chat_peer_id));

        let output = Self::resolve_env_string(export.output, &["VK_OUTPUT"])
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

        let format = Self::resolve_env_string(export.format, &["VK_FORMAT"])
            .map(|f| f.parse::<OutputFormat>())
            .transpose()?;

        let page_size = Self::resolve_env_parsed::<u32>(
            export.page_size.map(|v| v.to_string()),
            &["VK_PAGE_SIZE"],
            "page size",
        )?
        .unwrap_or(DEFAULT_PAGE_SIZE);

        let delay_ms = Self::resolve_env_parsed::<u64>(
            export.request_delay_ms.map(|v| v.to_string()),
            &["VK_REQUEST_DELAY_MS"],
            "request delay",
        )?
        .unwrap_or(DEFAULT_REQUEST_DELAY_MS);

        Ok(Self {
            access_token,
            api_version,
            api_url,
            peer_id,
            output,
            format,
            page_size,
            request_delay: Duration::from_millis(delay_ms),
            text_only: export.text_only.unwrap_or(false),
            oldest_first: export.oldest_first.unwrap_or(false),
            limit: export.limit,
        })
    }

    /// Create config with empty defaults
    pub(crate) fn defaults() -> Self {
        Self {
            access_token: String::new(),
            api_version: API_VERSION.to_string(),
            api_url: VK_API_URL.to_string(),
            peer_id: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            format: None,
            page_size: DEFAULT_PAGE_SIZE,
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            text_only: false,
            oldest_first: false,
            limit: None,
        }
    }

    /// Format to write, explicit or inferred from the output path
    pub fn output_format(&self) -> OutputFormat {
        self.format
            .unwrap_or_else(|| OutputFormat::from_path(&self.output))
    }

    /// Check the settings an export cannot run without
    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(Error::MissingConfig(
                "access token (set VK_ACCESS_TOKEN or vk.access_token)".to_string(),
            ));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::InvalidArgument(format!(
                "page size must be within 1..={}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if self.limit == Some(0) {
            return Err(Error::InvalidArgument("limit must be positive".to_string()));
        }
        Ok(())
    }

    /// Peer id, required for an export
    pub fn require_peer(&self) -> Result<i64> {
        self.peer_id.ok_or_else(|| {
            Error::MissingConfig("peer id (set VK_PEER_ID or export.peer_id)".to_string())
        })
    }
}
