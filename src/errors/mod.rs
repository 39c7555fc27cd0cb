//! Error types for the uploader.
//!
//! One root error covers the whole pipeline: spooling, the `sendDocument`
//! call, retry exhaustion and batch-level failures. Sub-enums group the
//! configuration, transport and response decoding cases.

use std::time::Duration;
use thiserror::Error;

/// Result type for uploader operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Root error type for the upload pipeline
#[derive(Error, Debug, Clone)]
pub enum UploadError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The source could not be opened or read
    #[error("Source unreadable: {message}")]
    SourceUnreadable {
        /// Error message
        message: String,
    },

    /// Declared size is zero or negative
    #[error("Invalid file size: {size}")]
    InvalidSize {
        /// The declared size
        size: i64,
    },

    /// Local staging file could not be created or written
    #[error("Staging error: {message}")]
    Staging {
        /// Error message
        message: String,
    },

    /// Network or I/O failure before a response was obtained
    #[error("Network error: {0}")]
    Transport(#[from] TransportError),

    /// A response was obtained but indicates failure
    #[error("Upload rejected: {status} {message}")]
    RemoteRejected {
        /// HTTP status (or Telegram `error_code`)
        status: u16,
        /// HTTP reason or Telegram `description`
        message: String,
        /// Seconds to wait before retrying, when the server supplied a hint
        retry_after: Option<u64>,
    },

    /// A success response could not be decoded
    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    /// Every allowed attempt failed
    #[error("Upload failed after {attempts} {}: {source}", attempts_noun(.attempts))]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Error from the last attempt
        source: Box<UploadError>,
    },

    /// Validation left nothing to upload
    #[error("No valid files selected")]
    ValidationEmpty,

    /// Retry was requested without any failed file
    #[error("No failed uploads to retry")]
    NoFailedUploads,

    /// The batch was cancelled
    #[error("Upload cancelled")]
    Cancelled,
}

impl UploadError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "UPLOAD_CONFIG",
            Self::SourceUnreadable { .. } => "UPLOAD_SOURCE_UNREADABLE",
            Self::InvalidSize { .. } => "UPLOAD_INVALID_SIZE",
            Self::Staging { .. } => "UPLOAD_STAGING",
            Self::Transport(_) => "UPLOAD_TRANSPORT",
            Self::RemoteRejected { .. } => "UPLOAD_REMOTE_REJECTED",
            Self::Response(_) => "UPLOAD_RESPONSE",
            Self::RetriesExhausted { .. } => "UPLOAD_RETRIES_EXHAUSTED",
            Self::ValidationEmpty => "UPLOAD_VALIDATION_EMPTY",
            Self::NoFailedUploads => "UPLOAD_NO_FAILED_UPLOADS",
            Self::Cancelled => "UPLOAD_CANCELLED",
        }
    }

    /// Check if this error is a transient failure worth retrying
    ///
    /// Network failures, HTTP 5xx and 429 are transient. Everything else,
    /// including a rejected chat id or a malformed request, is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::RemoteRejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Get retry-after duration if the server supplied one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RemoteRejected {
                retry_after: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }

    /// Get HTTP status code if applicable
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::RemoteRejected { status, .. } => Some(*status),
            Self::RetriesExhausted { source, .. } => source.http_status(),
            _ => None,
        }
    }

    /// Check if this error represents cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Create a source-unreadable error
    pub fn source_unreadable(message: impl Into<String>) -> Self {
        Self::SourceUnreadable {
            message: message.into(),
        }
    }

    /// Create a staging error
    pub fn staging(message: impl Into<String>) -> Self {
        Self::Staging {
            message: message.into(),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone)]
pub enum ConfigurationError {
    /// Missing bot token
    #[error("Bot token is missing")]
    MissingToken,

    /// Invalid token format
    #[error("Invalid token format: {0}")]
    InvalidToken(String),

    /// Missing destination chat
    #[error("Destination chat id is missing")]
    MissingChatId,

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },
}

/// Transport errors
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// Connection failed
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Error message
        message: String,
    },

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Any other HTTP client failure
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL embeds the bot token.
        let err = err.without_url();
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::ConnectionFailed {
                message: describe(&err),
            }
        } else {
            TransportError::Http(describe(&err))
        }
    }
}

/// Error text with its source chain, e.g. `error sending request: tcp connect error`
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn attempts_noun(attempts: &u32) -> &'static str {
    if *attempts == 1 {
        "attempt"
    } else {
        "attempts"
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        UploadError::Transport(TransportError::from(err))
    }
}

/// Response parsing errors
#[derive(Error, Debug, Clone)]
pub enum ResponseError {
    /// JSON deserialization error
    #[error("Deserialization error: {message}")]
    DeserializationError {
        /// Error message
        message: String,
    },

    /// Unexpected response format
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        /// Error message
        message: String,
    },
}

impl From<serde_json::Error> for ResponseError {
    fn from(err: serde_json::Error) -> Self {
        ResponseError::DeserializationError {
            message: err.to_string(),
        }
    }
}
