//! Batch lifecycle states and upload receipts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of one upload batch, published on every transition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadState {
    /// No batch running; also reached through cancellation
    #[default]
    Idle,
    /// Spooling the current file into staging
    Preparing {
        /// Percentage copied, 0..=100
        percent: u8,
    },
    /// Starting file `current` of `total`
    Progress {
        /// 1-based position in the batch
        current: usize,
        /// Number of files in the batch
        total: usize,
        /// Display name of the file
        file_name: String,
    },
    /// An upload attempt is being sent
    Uploading {
        /// Bytes acknowledged so far (network progress is not tracked)
        bytes_sent: u64,
        /// Size of the staged file
        total_bytes: u64,
    },
    /// Every file in the batch was uploaded
    Success {
        /// One receipt per uploaded file, in batch order
        receipts: Vec<RemoteReceipt>,
    },
    /// The batch stopped on an error
    Error {
        /// Human-readable message
        message: String,
        /// Whether a retry action makes sense
        is_retryable: bool,
    },
}

impl UploadState {
    /// Terminal states end a batch
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Error { .. })
    }

    /// Check for the idle state
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preparing { .. } => "preparing",
            Self::Progress { .. } => "progress",
            Self::Uploading { .. } => "uploading",
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
        }
    }
}

/// Decoded acknowledgment of one uploaded document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteReceipt {
    /// Success flag from the response envelope
    pub ok: bool,
    /// Identifier of the message carrying the document
    pub message_id: i64,
    /// Identifier for reusing the uploaded file
    pub file_id: String,
    /// Stable unique identifier of the file
    pub file_unique_id: String,
    /// Echoed file name
    pub file_name: Option<String>,
    /// Echoed MIME type
    pub mime_type: Option<String>,
    /// Echoed size in bytes
    pub file_size: Option<u64>,
    /// When the message was sent, if reported
    pub sent_at: Option<DateTime<Utc>>,
}
