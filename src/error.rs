//! Error types for the VK history exporter

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("VK API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("VK returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Missing configuration: {0}")]
    MissingConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for failures that came from talking to the remote API.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::Api { .. } | Error::HttpStatus { .. } | Error::ConnectionError(_) | Error::Decode(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}
