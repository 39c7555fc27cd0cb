//! Telegram document uploader
//!
//! Uploads batches of local files to a Telegram chat through the Bot API
//! `sendDocument` method:
//! - Batch validation against a size ceiling and allowed MIME prefixes
//! - Spooling of every source into a staged temp file with progress reporting
//! - Multipart upload with bounded retries and exponential backoff
//! - Strictly sequential, cancellable batch orchestration with a state stream
//! - Observability (tracing spans, counters, token redaction)
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use telegram_uploader::{FileReference, FsAccessResolver, TelegramConfig, WatchSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TelegramConfig::builder()
//!         .bot_token("123456:ABC-DEF")?
//!         .chat_id("-1001234567890")
//!         .build()?;
//!
//!     let client = telegram_uploader::create_client(config)?;
//!     let sink = Arc::new(WatchSink::new());
//!     let mut states = sink.subscribe();
//!     let orchestrator = client.orchestrator(sink)?;
//!
//!     orchestrator
//!         .start_batch(
//!             vec![FileReference::new("/tmp/report.pdf")],
//!             Arc::new(FsAccessResolver::new()),
//!         )
//!         .await;
//!
//!     while states.changed().await.is_ok() {
//!         let state = states.borrow().clone();
//!         println!("{state:?}");
//!         if state.is_terminal() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// Core modules
pub mod client;
pub mod config;
pub mod errors;
pub mod transport;
pub mod types;

// Services
pub mod services;

// Upload pipeline
pub mod access;
pub mod pipeline;
pub mod spool;
pub mod validation;

// Resilience
pub mod resilience;

// Observability
pub mod observability;

// Testing utilities
pub mod fixtures;
pub mod mocks;

// Tests
#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use access::{AccessResolver, ByteSource, FsAccessResolver};
pub use client::{TelegramClient, TelegramClientImpl};
pub use config::{TelegramConfig, TelegramConfigBuilder, UploadPolicy};
pub use errors::{UploadError, UploadResult};
pub use pipeline::{StateSink, UploadOrchestrator, WatchSink};
pub use types::{ChatId, FileMetadata, FileReference, RemoteReceipt, UploadState, ValidatedFile};

/// Default base URL for the Telegram Bot API; the bot token is appended directly
pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org/bot";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of upload attempts per file
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default upper bound for a single document (2 GiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// MIME prefixes accepted by the default upload policy
pub const DEFAULT_ALLOWED_MIME_PREFIXES: &[&str] = &[
    "image/",
    "video/",
    "audio/",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument",
    "text/plain",
];

/// Create a Telegram client with the given configuration
pub fn create_client(config: TelegramConfig) -> UploadResult<TelegramClientImpl> {
    TelegramClientImpl::new(config)
}
