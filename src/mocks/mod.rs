//! Mock implementations for testing.
//!
//! Provides a mock transport, a mock documents service, an in-memory access
//! resolver and a recording state sink.

use crate::access::{AccessResolver, ByteSource};
use crate::errors::{ResponseError, UploadError, UploadResult};
use crate::pipeline::StateSink;
use crate::services::documents::{DocumentsServiceTrait, SendDocumentRequest};
use crate::transport::{HttpTransport, MultipartRequest, TransportResponse};
use crate::types::{FileMetadata, FileReference, RemoteReceipt, UploadState};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, ReadBuf};

/// Mock response configuration
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// Response body
    pub body: String,
    /// HTTP status code
    pub status: u16,
    /// Delay before response
    pub delay_ms: Option<u64>,
    /// Error to return instead
    pub error: Option<UploadError>,
}

impl MockResponse {
    /// Create a successful JSON response
    pub fn json<T: Serialize>(data: &T) -> Self {
        Self::status_json(200, data)
    }

    /// Create a JSON response with the given status
    pub fn status_json<T: Serialize>(status: u16, data: &T) -> Self {
        Self {
            body: serde_json::to_string(data).unwrap_or_default(),
            status,
            delay_ms: None,
            error: None,
        }
    }

    /// Create a response with a raw body
    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            status,
            delay_ms: None,
            error: None,
        }
    }

    /// Fail the request instead of responding
    pub fn failure(error: UploadError) -> Self {
        Self {
            body: String::new(),
            status: 0,
            delay_ms: None,
            error: Some(error),
        }
    }

    /// Add delay to response
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = Some(ms);
        self
    }
}

/// File part as seen by the mock transport
#[derive(Debug, Clone)]
pub struct RecordedFile {
    /// Form field name
    pub field_name: String,
    /// File name
    pub file_name: String,
    /// MIME type
    pub mime_type: String,
    /// Declared length
    pub size: u64,
    /// Content read from the staged path at send time
    pub content: Option<Bytes>,
}

/// Recorded request for verification
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request URL
    pub url: String,
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// Text fields
    pub fields: Vec<(String, String)>,
    /// File parts
    pub files: Vec<RecordedFile>,
}

/// Mock HTTP transport for testing
pub struct MockHttpTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
    default_response: Option<MockResponse>,
}

impl MockHttpTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            default_response: None,
        }
    }

    /// Add a response to the queue
    pub fn add_response(&self, response: MockResponse) -> &Self {
        self.responses.lock().push_back(response);
        self
    }

    /// Set default response when queue is empty
    pub fn with_default_response(mut self, response: MockResponse) -> Self {
        self.default_response = Some(response);
        self
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Get the last recorded request
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().last().cloned()
    }

    /// Number of requests received
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Get remaining response count
    pub fn remaining_responses(&self) -> usize {
        self.responses.lock().len()
    }

    fn next_response(&self) -> Option<MockResponse> {
        let mut queue = self.responses.lock();
        queue.pop_front().or_else(|| self.default_response.clone())
    }
}

impl Default for MockHttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send_multipart(&self, request: MultipartRequest) -> UploadResult<TransportResponse> {
        let mut files = Vec::with_capacity(request.files.len());
        for file in &request.files {
            let content = tokio::fs::read(&file.path).await.ok().map(Bytes::from);
            files.push(RecordedFile {
                field_name: file.field_name.clone(),
                file_name: file.file_name.clone(),
                mime_type: file.mime_type.clone(),
                size: file.size,
                content,
            });
        }
        self.requests.lock().push(RecordedRequest {
            url: request.url,
            query: request.query,
            fields: request.fields,
            files,
        });

        let response = self.next_response().ok_or_else(|| ResponseError::UnexpectedResponse {
            message: "No mock response configured".to_string(),
        })?;

        if let Some(delay) = response.delay_ms {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if let Some(error) = response.error {
            return Err(error);
        }

        Ok(TransportResponse::new(response.status, response.body))
    }
}

impl std::fmt::Debug for MockHttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHttpTransport")
            .field("pending_responses", &self.responses.lock().len())
            .field("recorded_requests", &self.requests.lock().len())
            .finish()
    }
}

/// Mock documents service
///
/// Answers from a queue of results, then from per-file failures, then with a
/// receipt echoing the request.
#[derive(Default)]
pub struct MockDocumentsService {
    results: Mutex<VecDeque<UploadResult<RemoteReceipt>>>,
    failing_files: Mutex<HashMap<String, UploadError>>,
    requests: Mutex<Vec<SendDocumentRequest>>,
    contents: Mutex<Vec<Option<Vec<u8>>>>,
    delay: Option<Duration>,
}

impl MockDocumentsService {
    /// Create a service that accepts every document
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait this long before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a result for the next call
    pub fn push_result(&self, result: UploadResult<RemoteReceipt>) -> &Self {
        self.results.lock().push_back(result);
        self
    }

    /// Fail the next `times` calls with `error`
    pub fn fail_times(&self, times: usize, error: UploadError) -> &Self {
        let mut results = self.results.lock();
        for _ in 0..times {
            results.push_back(Err(error.clone()));
        }
        drop(results);
        self
    }

    /// Always fail documents with this file name
    pub fn fail_file(&self, file_name: impl Into<String>, error: UploadError) -> &Self {
        self.failing_files.lock().insert(file_name.into(), error);
        self
    }

    /// Stop failing documents with this file name
    pub fn heal_file(&self, file_name: &str) -> &Self {
        self.failing_files.lock().remove(file_name);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<SendDocumentRequest> {
        self.requests.lock().clone()
    }

    /// File names of the requests received so far
    pub fn sent_file_names(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| r.file_name.clone())
            .collect()
    }

    /// Staged content observed for each request
    pub fn contents(&self) -> Vec<Option<Vec<u8>>> {
        self.contents.lock().clone()
    }

    /// Number of calls received
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Receipt echoing a request
    pub fn receipt_for(request: &SendDocumentRequest, message_id: i64) -> RemoteReceipt {
        RemoteReceipt {
            ok: true,
            message_id,
            file_id: format!("file-{}", message_id),
            file_unique_id: format!("unique-{}", message_id),
            file_name: Some(request.file_name.clone()),
            mime_type: Some(request.mime_type.clone()),
            file_size: Some(request.size),
            sent_at: None,
        }
    }
}

#[async_trait]
impl DocumentsServiceTrait for MockDocumentsService {
    async fn send_document(&self, request: SendDocumentRequest) -> UploadResult<RemoteReceipt> {
        let content = tokio::fs::read(&request.path).await.ok();
        let message_id = {
            let mut requests = self.requests.lock();
            requests.push(request.clone());
            requests.len() as i64
        };
        self.contents.lock().push(content);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(result) = self.results.lock().pop_front() {
            return result;
        }
        if let Some(error) = self.failing_files.lock().get(&request.file_name) {
            return Err(error.clone());
        }
        Ok(Self::receipt_for(&request, message_id))
    }
}

impl std::fmt::Debug for MockDocumentsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDocumentsService")
            .field("calls", &self.requests.lock().len())
            .finish()
    }
}

#[derive(Debug, Clone)]
enum MockContent {
    Bytes(Vec<u8>),
    Stalled,
    Unreadable,
}

#[derive(Debug, Clone)]
struct MockEntry {
    metadata: FileMetadata,
    content: MockContent,
}

/// In-memory access resolver
#[derive(Debug, Default)]
pub struct MockAccessResolver {
    entries: HashMap<String, MockEntry>,
    opens: Mutex<HashMap<String, usize>>,
}

impl MockAccessResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a readable file
    pub fn with_file(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl AsRef<[u8]>,
    ) -> Self {
        let content = content.as_ref().to_vec();
        self.entries.insert(
            id.into(),
            MockEntry {
                metadata: FileMetadata {
                    name: Some(name.into()),
                    mime_type: Some(mime_type.into()),
                    size_bytes: Some(content.len() as u64),
                },
                content: MockContent::Bytes(content),
            },
        );
        self
    }

    /// Add a file whose stream never yields data
    pub fn with_stalled_file(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
    ) -> Self {
        self.entries.insert(
            id.into(),
            MockEntry {
                metadata: FileMetadata {
                    name: Some(name.into()),
                    mime_type: Some(mime_type.into()),
                    size_bytes: Some(size),
                },
                content: MockContent::Stalled,
            },
        );
        self
    }

    /// Add metadata only; opening the file fails
    pub fn with_metadata(mut self, id: impl Into<String>, metadata: FileMetadata) -> Self {
        self.entries.insert(
            id.into(),
            MockEntry {
                metadata,
                content: MockContent::Unreadable,
            },
        );
        self
    }

    /// Number of times `id` was opened
    pub fn open_count(&self, id: &str) -> usize {
        self.opens.lock().get(id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl AccessResolver for MockAccessResolver {
    async fn resolve_metadata(&self, reference: &FileReference) -> UploadResult<FileMetadata> {
        self.entries
            .get(&reference.id)
            .map(|entry| entry.metadata.clone())
            .ok_or_else(|| UploadError::source_unreadable(format!("No such file: {}", reference.id)))
    }

    async fn open(&self, reference: &FileReference) -> UploadResult<ByteSource> {
        *self.opens.lock().entry(reference.id.clone()).or_insert(0) += 1;

        match self.entries.get(&reference.id).map(|entry| &entry.content) {
            Some(MockContent::Bytes(content)) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockContent::Stalled) => Ok(Box::new(StalledReader)),
            _ => Err(UploadError::source_unreadable(format!(
                "Failed to read file {}",
                reference.id
            ))),
        }
    }
}

/// Reader that never produces data
struct StalledReader;

impl AsyncRead for StalledReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Poll::Pending
    }
}

/// Sink that records every published state
#[derive(Debug, Default)]
pub struct RecordingSink {
    states: Mutex<Vec<UploadState>>,
}

impl RecordingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All states in publication order
    pub fn states(&self) -> Vec<UploadState> {
        self.states.lock().clone()
    }

    /// Only `Progress`, `Success`, `Error` and `Idle` states
    pub fn milestones(&self) -> Vec<UploadState> {
        self.states
            .lock()
            .iter()
            .filter(|s| {
                !matches!(
                    s,
                    UploadState::Preparing { .. } | UploadState::Uploading { .. }
                )
            })
            .cloned()
            .collect()
    }

    /// Forget recorded states
    pub fn clear(&self) {
        self.states.lock().clear();
    }
}

impl StateSink for RecordingSink {
    fn publish(&self, state: UploadState) {
        self.states.lock().push(state);
    }
}
