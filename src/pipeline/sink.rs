//! State stream sinks and the cancellation-aware publisher.

use crate::types::UploadState;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Receives every batch state transition
pub trait StateSink: Send + Sync {
    /// Publish a new current state
    fn publish(&self, state: UploadState);

    /// Subscribe to the stream, if the sink supports it
    fn subscribe(&self) -> Option<watch::Receiver<UploadState>> {
        None
    }
}

/// Sink backed by a `watch` channel
///
/// Subscribers always see the latest state, including those that subscribe
/// after the transition happened.
#[derive(Debug)]
pub struct WatchSink {
    sender: watch::Sender<UploadState>,
}

impl Default for WatchSink {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchSink {
    /// Create a sink starting in [`UploadState::Idle`]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(UploadState::Idle);
        Self { sender }
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.sender.subscribe()
    }

    /// Latest published state
    pub fn current(&self) -> UploadState {
        self.sender.borrow().clone()
    }
}

impl StateSink for WatchSink {
    fn publish(&self, state: UploadState) {
        self.sender.send_replace(state);
    }

    fn subscribe(&self) -> Option<watch::Receiver<UploadState>> {
        Some(self.sender.subscribe())
    }
}

/// Tracks the current state and forwards transitions to the sink
///
/// Batch publications carry the batch's token and are dropped once it is
/// cancelled. Cancelling takes the same lock, so after a cancel returns no
/// state from that batch can reach the sink.
pub(crate) struct StatePublisher {
    sink: Arc<dyn StateSink>,
    current: Mutex<UploadState>,
}

impl StatePublisher {
    pub(crate) fn new(sink: Arc<dyn StateSink>) -> Self {
        Self {
            sink,
            current: Mutex::new(UploadState::Idle),
        }
    }

    pub(crate) fn current(&self) -> UploadState {
        self.current.lock().clone()
    }

    pub(crate) fn subscribe(&self) -> Option<watch::Receiver<UploadState>> {
        self.sink.subscribe()
    }

    /// Publish on behalf of a batch; returns false once the batch is cancelled
    pub(crate) fn publish_for(&self, token: &CancellationToken, state: UploadState) -> bool {
        let mut current = self.current.lock();
        if token.is_cancelled() {
            trace!(state = state.name(), "Dropped state from cancelled batch");
            return false;
        }
        *current = state.clone();
        self.sink.publish(state);
        true
    }

    /// Publish outside of any batch
    pub(crate) fn publish(&self, state: UploadState) {
        let mut current = self.current.lock();
        *current = state.clone();
        self.sink.publish(state);
    }

    /// Cancel `token` and return to idle; publishes only if not already idle
    pub(crate) fn cancel_and_reset(&self, token: Option<&CancellationToken>) -> bool {
        let mut current = self.current.lock();
        if let Some(token) = token {
            token.cancel();
        }
        if current.is_idle() {
            return false;
        }
        *current = UploadState::Idle;
        self.sink.publish(UploadState::Idle);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::RecordingSink;

    #[test]
    fn test_watch_sink_replays_latest() {
        let sink = WatchSink::new();
        sink.publish(UploadState::Preparing { percent: 10 });
        sink.publish(UploadState::Preparing { percent: 20 });

        let late = sink.subscribe();
        assert_eq!(*late.borrow(), UploadState::Preparing { percent: 20 });
        assert_eq!(sink.current(), UploadState::Preparing { percent: 20 });
    }

    #[test]
    fn test_publisher_drops_states_after_cancel() {
        let sink = Arc::new(RecordingSink::new());
        let publisher = StatePublisher::new(sink.clone());
        let token = CancellationToken::new();

        assert!(publisher.publish_for(&token, UploadState::Preparing { percent: 0 }));
        assert!(publisher.cancel_and_reset(Some(&token)));
        assert!(!publisher.publish_for(&token, UploadState::Preparing { percent: 50 }));

        assert_eq!(
            sink.states(),
            vec![UploadState::Preparing { percent: 0 }, UploadState::Idle]
        );
    }

    #[test]
    fn test_reset_is_idempotent() {
        let sink = Arc::new(RecordingSink::new());
        let publisher = StatePublisher::new(sink.clone());
        publisher.publish(UploadState::Error {
            message: "x".to_string(),
            is_retryable: false,
        });

        assert!(publisher.cancel_and_reset(None));
        assert!(!publisher.cancel_and_reset(None));
        assert_eq!(sink.states().iter().filter(|s| s.is_idle()).count(), 1);
    }
}
