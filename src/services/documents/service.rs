//! Documents service implementation.

use super::*;
use crate::config::TelegramConfig;
use crate::errors::UploadResult;
use crate::transport::{parse_api_response, FilePart, HttpTransport, MultipartRequest};
use crate::types::RemoteReceipt;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Multipart field carrying the document
pub const DOCUMENT_FIELD: &str = "document";

const SEND_DOCUMENT: &str = "sendDocument";

/// Trait for documents service operations
#[async_trait]
pub trait DocumentsServiceTrait: Send + Sync {
    /// Send one document; exactly one request, no retries
    async fn send_document(&self, request: SendDocumentRequest) -> UploadResult<RemoteReceipt>;
}

/// Documents service implementation
pub struct DocumentsService {
    transport: Arc<dyn HttpTransport>,
    config: Arc<TelegramConfig>,
}

impl DocumentsService {
    /// Create a new documents service
    pub fn new(transport: Arc<dyn HttpTransport>, config: Arc<TelegramConfig>) -> Self {
        Self { transport, config }
    }

    fn build_request(&self, request: SendDocumentRequest) -> UploadResult<MultipartRequest> {
        let url = self.config.method_url(SEND_DOCUMENT)?;

        let part = FilePart::new(DOCUMENT_FIELD, request.file_name, request.path, request.size)
            .with_mime_type(request.mime_type);

        let mut multipart = MultipartRequest::new(url)
            .query("chat_id", request.chat_id.as_str())
            .file(part)
            .with_timeout(self.config.timeout);

        if let Some(caption) = request.caption {
            multipart = multipart.query("caption", caption);
        }

        Ok(multipart)
    }
}

impl std::fmt::Debug for DocumentsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentsService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentsServiceTrait for DocumentsService {
    #[instrument(skip(self, request), fields(chat_id = %request.chat_id, file_name = %request.file_name, size = request.size))]
    async fn send_document(&self, request: SendDocumentRequest) -> UploadResult<RemoteReceipt> {
        let multipart = self.build_request(request)?;
        let response = self.transport.send_multipart(multipart).await?;

        let message: Message = parse_api_response(&response)?;
        let receipt = RemoteReceipt::try_from(message)?;

        debug!(message_id = receipt.message_id, file_id = %receipt.file_id, "Document sent");
        Ok(receipt)
    }
}
