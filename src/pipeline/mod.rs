//! Upload pipeline: batch orchestration and the state stream.
//!
//! [`UploadOrchestrator`] runs one batch at a time on a background task and
//! reports every transition to a [`StateSink`].

mod orchestrator;
mod sink;

pub use orchestrator::{UploadOrchestrator, UploadOrchestratorBuilder};
pub use sink::{StateSink, WatchSink};
