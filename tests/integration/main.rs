//! Integration tests using WireMock
//!
//! These tests run the client against a mock Bot API server and cover the
//! full multipart request/response cycle, from a file on disk to the receipt.

mod upload;

use telegram_uploader::{TelegramClientImpl, TelegramConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

pub const TOKEN: &str = "123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11";
pub const CHAT_ID: &str = "-1001234567890";

/// Helper to create a mock server
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Helper to build a client pointed at the mock server
pub fn client_for(server: &MockServer, staging: &tempfile::TempDir, max_attempts: u32) -> TelegramClientImpl {
    let config = TelegramConfig::builder()
        .bot_token(TOKEN)
        .expect("valid token")
        .base_url(&format!("{}/bot", server.uri()))
        .expect("valid base url")
        .chat_id(CHAT_ID)
        .staging_dir(staging.path())
        .max_attempts(max_attempts)
        .build()
        .expect("valid config");
    TelegramClientImpl::new(config).expect("Failed to build client")
}

/// Helper to match sendDocument calls for the test bot
pub fn send_document() -> MockBuilder {
    Mock::given(method("POST")).and(path(format!("/bot{}/sendDocument", TOKEN)))
}

/// Helper to create success response templates
pub fn success_response(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Helper to create error response templates
pub fn error_response(status: u16, body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}
