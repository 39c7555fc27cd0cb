//! Resilience patterns for the uploader.
//!
//! Provides bounded retry with exponential backoff.

pub mod retry;

pub use retry::{with_retry, RetryAll, RetryConfig, RetryPolicy, TransientOnly};
