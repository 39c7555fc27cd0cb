//! Client tests.

use crate::client::{TelegramClient, TelegramClientImpl};
use crate::config::TelegramConfig;
use crate::fixtures;
use crate::mocks::{MockAccessResolver, MockHttpTransport, MockResponse, RecordingSink};
use crate::services::documents::SendDocumentRequest;
use crate::types::{FileReference, UploadState};
use crate::UploadError;
use std::sync::Arc;

fn client(transport: Arc<MockHttpTransport>, staging: &tempfile::TempDir) -> TelegramClientImpl {
    let config = TelegramConfig::builder()
        .bot_token(fixtures::BOT_TOKEN)
        .unwrap()
        .chat_id(fixtures::CHAT_ID)
        .staging_dir(staging.path())
        .caption("weekly report")
        .max_attempts(2)
        .build()
        .unwrap();
    TelegramClientImpl::with_transport(config, transport).unwrap()
}

#[tokio::test]
async fn test_documents_service_through_client() {
    let staging = tempfile::tempdir().unwrap();
    let transport = Arc::new(MockHttpTransport::new());
    transport.add_response(MockResponse::json(&fixtures::send_document_success(
        "r.pdf",
        "application/pdf",
        3,
    )));
    let client = client(transport.clone(), &staging);

    let path = staging.path().join("content");
    std::fs::write(&path, b"pdf").unwrap();
    let receipt = client
        .documents()
        .send_document(SendDocumentRequest::new(
            fixtures::CHAT_ID,
            &path,
            3,
            "r.pdf",
            "application/pdf",
        ))
        .await
        .unwrap();

    assert_eq!(receipt.message_id, 42);
    assert_eq!(receipt.file_size, Some(3));
    assert!(receipt.sent_at.is_some());
    assert!(transport.recorded_requests()[0]
        .url
        .ends_with("/bot123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11/sendDocument"));
}

#[tokio::test]
async fn test_orchestrator_uses_configured_chat_and_caption() {
    let staging = tempfile::tempdir().unwrap();
    let transport = Arc::new(
        MockHttpTransport::new().with_default_response(MockResponse::json(
            &fixtures::send_document_success("notes.txt", "text/plain", 5),
        )),
    );
    let client = client(transport.clone(), &staging);
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = client.orchestrator(sink.clone()).unwrap();

    let resolver = Arc::new(MockAccessResolver::new().with_file(
        "n",
        "notes.txt",
        "text/plain",
        b"hello",
    ));
    orchestrator
        .start_batch(vec![FileReference::new("n")], resolver)
        .await;
    orchestrator.wait_for_completion().await;

    assert!(matches!(orchestrator.current_state(), UploadState::Success { .. }));
    let request = transport.last_request().unwrap();
    assert_eq!(
        request.query,
        vec![
            ("chat_id".to_string(), fixtures::CHAT_ID.to_string()),
            ("caption".to_string(), "weekly report".to_string()),
        ]
    );
    assert_eq!(request.files[0].content.as_deref(), Some(&b"hello"[..]));
}

#[tokio::test(start_paused = true)]
async fn test_orchestrator_honors_configured_attempts() {
    let staging = tempfile::tempdir().unwrap();
    let transport = Arc::new(MockHttpTransport::new().with_default_response(
        MockResponse::status_json(502, &fixtures::error_response(502, "Bad Gateway")),
    ));
    let client = client(transport.clone(), &staging);
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = client.orchestrator(sink).unwrap();

    let resolver = Arc::new(MockAccessResolver::new().with_file("n", "notes.txt", "text/plain", b"x"));
    orchestrator
        .start_batch(vec![FileReference::new("n")], resolver)
        .await;
    orchestrator.wait_for_completion().await;

    assert_eq!(transport.request_count(), 2);
    assert_eq!(
        orchestrator.current_state(),
        UploadState::Error {
            message: "Failed to upload notes.txt: Upload failed after 2 attempts: \
                      Upload rejected: 502 Bad Gateway"
                .to_string(),
            is_retryable: true,
        }
    );
}

#[test]
fn test_orchestrator_requires_chat_id() {
    let config = TelegramConfig::builder()
        .bot_token(fixtures::BOT_TOKEN)
        .unwrap()
        .build_unchecked();
    let result = TelegramClientImpl::with_transport(config, Arc::new(MockHttpTransport::new()));
    assert!(matches!(result, Err(UploadError::Configuration(_))));
}
