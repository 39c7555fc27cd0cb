//! Integration tests for document uploads

use super::*;
use std::sync::Arc;
use telegram_uploader::fixtures;
use telegram_uploader::mocks::RecordingSink;
use telegram_uploader::services::documents::SendDocumentRequest;
use telegram_uploader::{FileReference, FsAccessResolver, TelegramClient, UploadError, UploadState};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_string_contains, query_param};

fn write_file(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_send_document_multipart_request() {
    let server = setup_mock_server().await;
    let staging = tempfile::tempdir().unwrap();

    send_document()
        .and(query_param("chat_id", CHAT_ID))
        .and(body_string_contains("name=\"document\""))
        .and(body_string_contains("filename=\"report.txt\""))
        .and(body_string_contains("quarterly numbers"))
        .respond_with(success_response(fixtures::send_document_success(
            "report.txt",
            "text/plain",
            17,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &staging, 1);
    let path = staging.path().join("staged-report");
    std::fs::write(&path, b"quarterly numbers").unwrap();

    let receipt = assert_ok!(
        client
            .documents()
            .send_document(SendDocumentRequest::new(
                CHAT_ID,
                &path,
                17,
                "report.txt",
                "text/plain",
            ))
            .await
    );

    assert_eq!(receipt.message_id, 42);
    assert_eq!(receipt.file_name.as_deref(), Some("report.txt"));
    assert_eq!(receipt.file_size, Some(17));
}

#[tokio::test]
async fn test_send_document_rejected() {
    let server = setup_mock_server().await;
    let staging = tempfile::tempdir().unwrap();

    send_document()
        .respond_with(error_response(
            400,
            fixtures::error_response(400, "Bad Request: chat not found"),
        ))
        .mount(&server)
        .await;

    let client = client_for(&server, &staging, 1);
    let path = staging.path().join("staged");
    std::fs::write(&path, b"abc").unwrap();

    let err = assert_err!(
        client
            .documents()
            .send_document(SendDocumentRequest::new(CHAT_ID, &path, 3, "a.txt", "text/plain"))
            .await
    );

    match err {
        UploadError::RemoteRejected { status, message, .. } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Bad Request: chat not found");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let server = setup_mock_server().await;
    let staging = tempfile::tempdir().unwrap();

    send_document()
        .respond_with(error_response(429, fixtures::rate_limited(5)))
        .mount(&server)
        .await;

    let client = client_for(&server, &staging, 1);
    let path = staging.path().join("staged");
    std::fs::write(&path, b"abc").unwrap();

    let err = assert_err!(
        client
            .documents()
            .send_document(SendDocumentRequest::new(CHAT_ID, &path, 3, "a.txt", "text/plain"))
            .await
    );

    assert!(err.is_transient());
    assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(5)));
}

#[tokio::test]
async fn test_batch_from_disk_end_to_end() {
    let server = setup_mock_server().await;
    let staging = tempfile::tempdir().unwrap();
    let sources = tempfile::tempdir().unwrap();

    send_document()
        .and(body_string_contains("filename=\"notes.txt\""))
        .respond_with(success_response(fixtures::send_document_success(
            "notes.txt",
            "text/plain",
            11,
        )))
        .expect(1)
        .mount(&server)
        .await;
    send_document()
        .and(body_string_contains("filename=\"photo.png\""))
        .respond_with(success_response(fixtures::send_document_success(
            "photo.png",
            "image/png",
            7,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let notes = write_file(&sources, "notes.txt", b"hello there");
    let photo = write_file(&sources, "photo.png", b"PNGDATA");
    let binary = write_file(&sources, "tool.exe", b"MZ");

    let client = client_for(&server, &staging, 1);
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = client.orchestrator(sink.clone()).unwrap();

    orchestrator
        .start_batch(
            vec![
                FileReference::new(notes),
                FileReference::new(binary),
                FileReference::new(photo),
            ],
            Arc::new(FsAccessResolver::new()),
        )
        .await;
    orchestrator.wait_for_completion().await;

    match orchestrator.current_state() {
        UploadState::Success { receipts } => {
            let names: Vec<_> = receipts.iter().filter_map(|r| r.file_name.clone()).collect();
            assert_eq!(names, vec!["notes.txt", "photo.png"]);
        }
        other => panic!("expected success, got {:?}", other),
    }
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
    assert!(sink.states().contains(&UploadState::Progress {
        current: 2,
        total: 2,
        file_name: "photo.png".to_string(),
    }));
}

#[tokio::test]
async fn test_server_error_is_retried_then_succeeds() {
    let server = setup_mock_server().await;
    let staging = tempfile::tempdir().unwrap();
    let sources = tempfile::tempdir().unwrap();

    send_document()
        .respond_with(error_response(
            500,
            fixtures::error_response(500, "Internal Server Error"),
        ))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    send_document()
        .respond_with(success_response(fixtures::send_document_success(
            "notes.txt",
            "text/plain",
            5,
        )))
        .mount(&server)
        .await;

    let notes = write_file(&sources, "notes.txt", b"hello");
    let client = client_for(&server, &staging, 2);
    let orchestrator = client.orchestrator(Arc::new(RecordingSink::new())).unwrap();

    orchestrator
        .start_batch(vec![FileReference::new(notes)], Arc::new(FsAccessResolver::new()))
        .await;
    orchestrator.wait_for_completion().await;

    assert!(matches!(orchestrator.current_state(), UploadState::Success { .. }));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_connection_failure_does_not_expose_token() {
    let staging = tempfile::tempdir().unwrap();
    let sources = tempfile::tempdir().unwrap();
    let notes = write_file(&sources, "a.txt", b"hello");

    let config = TelegramConfig::builder()
        .bot_token("123456:SUPERSECRETTOKEN")
        .unwrap()
        .base_url("http://127.0.0.1:1/bot")
        .unwrap()
        .chat_id("-100")
        .staging_dir(staging.path())
        .max_attempts(1)
        .build()
        .unwrap();
    let client = TelegramClientImpl::new(config).unwrap();
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = client.orchestrator(sink.clone()).unwrap();

    orchestrator
        .start_batch(vec![FileReference::new(notes)], Arc::new(FsAccessResolver::new()))
        .await;
    orchestrator.wait_for_completion().await;

    match orchestrator.current_state() {
        UploadState::Error { message, is_retryable } => {
            assert!(
                message.starts_with("Failed to upload a.txt: Upload failed after 1 attempt: Network error"),
                "{}",
                message
            );
            assert!(is_retryable);
        }
        other => panic!("expected error, got {:?}", other),
    }
    for state in sink.states() {
        assert!(!format!("{:?}", state).contains("SUPERSECRETTOKEN"));
    }
}
