//! Span helpers for batch and file uploads.

use tracing::{span, Level, Span};

/// Create the span covering one batch
pub fn create_batch_span(batch_id: &str, file_count: usize, retry: bool) -> Span {
    span!(
        Level::INFO,
        "upload_batch",
        batch.id = %batch_id,
        batch.file_count = file_count,
        batch.retry = retry,
        otel.status_code = tracing::field::Empty,
        error.message = tracing::field::Empty,
    )
}

/// Create the span covering one file of a batch
pub fn create_upload_span(batch_id: &str, file_name: &str, position: usize, total: usize) -> Span {
    span!(
        Level::INFO,
        "upload_file",
        batch.id = %batch_id,
        file.name = %file_name,
        file.position = position,
        file.total = total,
        otel.status_code = tracing::field::Empty,
        error.message = tracing::field::Empty,
        telegram.message_id = tracing::field::Empty,
    )
}

/// Record success on a span
pub fn record_success(span: &Span) {
    span.record("otel.status_code", "OK");
}

/// Record error on a span
pub fn record_error(span: &Span, error: &str) {
    span.record("otel.status_code", "ERROR");
    span.record("error.message", error);
}

/// Record the message id of an uploaded document
pub fn record_message_id(span: &Span, message_id: i64) {
    span.record("telegram.message_id", message_id);
}
