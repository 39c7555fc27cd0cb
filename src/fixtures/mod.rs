//! Test fixtures for Bot API responses.
//!
//! Provides realistic test data for unit and integration tests.

use crate::types::{FileReference, RemoteReceipt};
use chrono::DateTime;
use serde_json::json;

/// Chat id used across fixtures
pub const CHAT_ID: i64 = -1001234567890;

/// Bot token used across fixtures
pub const BOT_TOKEN: &str = "123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11";

/// Create a fixture receipt
pub fn receipt(file_name: &str) -> RemoteReceipt {
    RemoteReceipt {
        ok: true,
        message_id: 42,
        file_id: "BQACAgIAAxkDAAIBY2ZfileId".to_string(),
        file_unique_id: "AgADuniq".to_string(),
        file_name: Some(file_name.to_string()),
        mime_type: Some("application/pdf".to_string()),
        file_size: Some(1024),
        sent_at: DateTime::from_timestamp(1_700_000_000, 0),
    }
}

/// Create a batch of fixture references
pub fn references(names: &[&str]) -> Vec<FileReference> {
    names.iter().map(|name| FileReference::new(*name)).collect()
}

/// Create a successful sendDocument response
pub fn send_document_success(file_name: &str, mime_type: &str, size: u64) -> serde_json::Value {
    json!({
        "ok": true,
        "result": {
            "message_id": 42,
            "date": 1_700_000_000,
            "chat": {
                "id": CHAT_ID,
                "title": "Uploads",
                "type": "supergroup"
            },
            "document": {
                "file_name": file_name,
                "mime_type": mime_type,
                "file_id": "BQACAgIAAxkDAAIBY2ZfileId",
                "file_unique_id": "AgADuniq",
                "file_size": size
            }
        }
    })
}

/// Create a sendDocument response for a message without a document
pub fn send_document_without_document() -> serde_json::Value {
    json!({
        "ok": true,
        "result": {
            "message_id": 43,
            "date": 1_700_000_000,
            "chat": { "id": CHAT_ID, "type": "supergroup" },
            "text": "not a document"
        }
    })
}

/// Create a Bot API error response
pub fn error_response(code: u16, description: &str) -> serde_json::Value {
    json!({
        "ok": false,
        "error_code": code,
        "description": description
    })
}

/// Create a flood-control response
pub fn rate_limited(retry_after: u64) -> serde_json::Value {
    json!({
        "ok": false,
        "error_code": 429,
        "description": format!("Too Many Requests: retry after {}", retry_after),
        "parameters": { "retry_after": retry_after }
    })
}
