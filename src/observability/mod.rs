//! Observability infrastructure for the uploader.
//!
//! Provides tracing spans, upload counters and logging utilities.

pub mod logging;
pub mod metrics;
pub mod tracing_utils;

pub use logging::*;
pub use metrics::*;
pub use tracing_utils::*;
