//! Request types for the documents service.

use crate::spool::StagedFile;
use crate::types::ChatId;
use std::path::PathBuf;

/// Request to send a staged file as a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendDocumentRequest {
    /// Destination chat
    pub chat_id: ChatId,
    /// File name shown in the chat
    pub file_name: String,
    /// Content type of the document part
    pub mime_type: String,
    /// Location of the staged content
    pub path: PathBuf,
    /// Size of the staged content
    pub size: u64,
    /// Optional caption
    pub caption: Option<String>,
}

impl SendDocumentRequest {
    /// Create a request for content at `path`
    pub fn new(
        chat_id: impl Into<ChatId>,
        path: impl Into<PathBuf>,
        size: u64,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            path: path.into(),
            size,
            caption: None,
        }
    }

    /// Create a request for a staged file
    pub fn from_staged(
        chat_id: impl Into<ChatId>,
        staged: &StagedFile,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self::new(chat_id, staged.path(), staged.size(), file_name, mime_type)
    }

    /// Set the caption
    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Set the caption if one is given
    pub fn maybe_caption(mut self, caption: Option<String>) -> Self {
        self.caption = caption;
        self
    }
}
