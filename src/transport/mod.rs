//! HTTP transport layer for the Bot API.
//!
//! Sends multipart requests whose file parts are streamed from disk, and
//! decodes the Telegram response envelope into typed results or
//! [`UploadError::RemoteRejected`].

use crate::errors::{ResponseError, TransportError, UploadError, UploadResult};
use crate::observability::redact_url;
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, ClientBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument, warn};

/// HTTP transport trait for making API requests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a multipart POST and return the raw response
    async fn send_multipart(&self, request: MultipartRequest) -> UploadResult<TransportResponse>;
}

/// Raw response as received from the server
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Bytes,
}

impl TransportResponse {
    /// Create a response
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Multipart request for file uploads
#[derive(Debug, Clone)]
pub struct MultipartRequest {
    /// Full URL
    pub url: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// Text form fields
    pub fields: Vec<(String, String)>,
    /// Files to upload
    pub files: Vec<FilePart>,
    /// Request timeout
    pub timeout: Option<Duration>,
}

impl MultipartRequest {
    /// Create a new multipart request
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            fields: Vec::new(),
            files: Vec::new(),
            timeout: None,
        }
    }

    /// Add a query parameter
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Add a form field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Add a file
    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A file part whose content is streamed from a local path
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name
    pub field_name: String,
    /// File name sent in the part's Content-Disposition
    pub file_name: String,
    /// Local path of the content
    pub path: PathBuf,
    /// Content length in bytes
    pub size: u64,
    /// MIME type
    pub mime_type: String,
}

impl FilePart {
    /// Create a new file part
    pub fn new(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        path: impl Into<PathBuf>,
        size: u64,
    ) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .to_string();

        Self {
            field_name: field_name.into(),
            file_name,
            path: path.into(),
            size,
            mime_type,
        }
    }

    /// Set the MIME type
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    async fn into_part(self) -> UploadResult<Part> {
        let file = tokio::fs::File::open(&self.path).await.map_err(|e| {
            UploadError::staging(format!("Failed to open staged file: {}", e))
        })?;
        let body = Body::wrap_stream(ReaderStream::new(file));

        let mime_type = self
            .mime_type
            .parse::<mime::Mime>()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM);

        Part::stream_with_length(body, self.size)
            .file_name(self.file_name)
            .mime_str(mime_type.as_ref())
            .map_err(UploadError::from)
    }
}

/// Default HTTP transport implementation using reqwest
pub struct ReqwestTransport {
    client: Client,
    default_timeout: Duration,
}

impl ReqwestTransport {
    /// Create a new transport with the given timeout
    pub fn new(timeout: Duration) -> UploadResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| UploadError::Transport(TransportError::Http(e.to_string())))?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Create a new transport with a pre-built client
    pub fn with_client(client: Client, default_timeout: Duration) -> Self {
        Self {
            client,
            default_timeout,
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(
        skip(self, request),
        fields(url = %redact_url(&request.url), file_count = request.files.len())
    )]
    async fn send_multipart(&self, request: MultipartRequest) -> UploadResult<TransportResponse> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let mut form = Form::new();
        for (name, value) in request.fields {
            form = form.text(name, value);
        }
        for file in request.files {
            let field_name = file.field_name.clone();
            form = form.part(field_name, file.into_part().await?);
        }

        let response = self
            .client
            .post(&request.url)
            .headers(request.headers)
            .query(&request.query)
            .multipart(form)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Request failed with non-success status");
        }

        let body = response.bytes().await?;
        debug!(status = status.as_u16(), body_len = body.len(), "Received response");

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

/// Bot API response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the call succeeded
    pub ok: bool,
    /// Payload on success
    pub result: Option<T>,
    /// Error description on failure
    #[serde(default)]
    pub description: Option<String>,
    /// Error code on failure
    #[serde(default)]
    pub error_code: Option<u16>,
    /// Extra failure details
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

/// Failure details attached to some error responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseParameters {
    /// Seconds to wait before repeating the request
    #[serde(default)]
    pub retry_after: Option<u64>,
    /// The group moved to a supergroup with this id
    #[serde(default)]
    pub migrate_to_chat_id: Option<i64>,
}

/// Decode a Bot API response into its `result` payload
///
/// Non-2xx statuses and `"ok": false` bodies become `RemoteRejected`, using
/// the envelope's `description` when one is present. A 2xx body that cannot
/// be decoded is a `Response` error.
pub fn parse_api_response<T: DeserializeOwned>(response: &TransportResponse) -> UploadResult<T> {
    if !response.is_success() {
        let envelope = serde_json::from_slice::<ApiResponse<serde_json::Value>>(&response.body).ok();
        return Err(rejection(response.status, envelope));
    }

    let envelope: ApiResponse<T> =
        serde_json::from_slice(&response.body).map_err(ResponseError::from)?;

    if !envelope.ok {
        let status = envelope.error_code.unwrap_or(response.status);
        return Err(UploadError::RemoteRejected {
            status,
            message: envelope
                .description
                .unwrap_or_else(|| reason_phrase(status)),
            retry_after: envelope.parameters.and_then(|p| p.retry_after),
        });
    }

    envelope.result.ok_or_else(|| {
        ResponseError::UnexpectedResponse {
            message: "Missing result in successful response".to_string(),
        }
        .into()
    })
}

fn rejection(status: u16, envelope: Option<ApiResponse<serde_json::Value>>) -> UploadError {
    match envelope {
        Some(envelope) => UploadError::RemoteRejected {
            status,
            message: envelope
                .description
                .unwrap_or_else(|| reason_phrase(status)),
            retry_after: envelope.parameters.and_then(|p| p.retry_after),
        },
        None => UploadError::RemoteRejected {
            status,
            message: reason_phrase(status),
            retry_after: None,
        },
    }
}

fn reason_phrase(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown Status")
        .to_string()
}
