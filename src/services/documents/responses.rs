//! Response types for the documents service.

use crate::errors::{ResponseError, UploadError};
use crate::types::RemoteReceipt;
use chrono::DateTime;
use serde::Deserialize;

/// Message returned by `sendDocument`
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Message identifier inside the chat
    pub message_id: i64,
    /// Unix time the message was sent
    #[serde(default)]
    pub date: Option<i64>,
    /// Chat the message belongs to
    #[serde(default)]
    pub chat: Option<Chat>,
    /// The uploaded document
    #[serde(default)]
    pub document: Option<Document>,
}

/// Minimal chat description
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Chat identifier
    pub id: i64,
    /// Chat type (private, group, supergroup, channel)
    #[serde(rename = "type", default)]
    pub chat_type: Option<String>,
}

/// Document attached to a message
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    /// Identifier for reusing the file
    pub file_id: String,
    /// Unique identifier, stable across bots
    pub file_unique_id: String,
    /// Original file name
    #[serde(default)]
    pub file_name: Option<String>,
    /// MIME type
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Size in bytes
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl TryFrom<Message> for RemoteReceipt {
    type Error = UploadError;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        let document = message.document.ok_or_else(|| ResponseError::UnexpectedResponse {
            message: "sendDocument result has no document".to_string(),
        })?;

        Ok(RemoteReceipt {
            ok: true,
            message_id: message.message_id,
            file_id: document.file_id,
            file_unique_id: document.file_unique_id,
            file_name: document.file_name,
            mime_type: document.mime_type,
            file_size: document.file_size,
            sent_at: message.date.and_then(|secs| DateTime::from_timestamp(secs, 0)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_into_receipt() {
        let message: Message = serde_json::from_value(json!({
            "message_id": 12,
            "date": 1700000000,
            "chat": {"id": -100, "type": "channel"},
            "document": {
                "file_id": "BQAC",
                "file_unique_id": "AgAD",
                "file_name": "a.pdf",
                "mime_type": "application/pdf",
                "file_size": 3
            }
        }))
        .unwrap();

        let receipt = RemoteReceipt::try_from(message).unwrap();
        assert!(receipt.ok);
        assert_eq!(receipt.message_id, 12);
        assert_eq!(receipt.file_id, "BQAC");
        assert_eq!(receipt.file_name.as_deref(), Some("a.pdf"));
        assert_eq!(receipt.file_size, Some(3));
        assert_eq!(receipt.sent_at.map(|t| t.timestamp()), Some(1700000000));
    }

    #[test]
    fn test_message_without_document_is_unexpected() {
        let message: Message = serde_json::from_value(json!({"message_id": 1})).unwrap();
        assert!(matches!(
            RemoteReceipt::try_from(message),
            Err(UploadError::Response(ResponseError::UnexpectedResponse { .. }))
        ));
    }
}
