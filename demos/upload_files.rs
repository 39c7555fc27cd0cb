//! Document Upload Example
//!
//! This example demonstrates how to:
//! - Configure the client from environment variables
//! - Upload a batch of local files to a chat
//! - Follow the state stream and retry failed files once
//!
//! Usage:
//!
//! ```text
//! TELEGRAM_BOT_TOKEN=123456:ABC TELEGRAM_CHAT_ID=-100123 \
//!     cargo run --example upload_files -- report.pdf photo.jpg
//! ```

use std::sync::Arc;
use telegram_uploader::observability::{LogFormat, LogLevel, LoggingConfig};
use telegram_uploader::{FileReference, FsAccessResolver, TelegramConfig, UploadState, WatchSink};
use tokio::sync::watch;

async fn follow(states: &mut watch::Receiver<UploadState>) -> UploadState {
    loop {
        let state = states.borrow_and_update().clone();
        match &state {
            UploadState::Idle => {}
            UploadState::Preparing { percent } => println!("  staging... {}%", percent),
            UploadState::Progress {
                current,
                total,
                file_name,
            } => println!("[{}/{}] {}", current, total, file_name),
            UploadState::Uploading { total_bytes, .. } => println!("  sending {} bytes", total_bytes),
            UploadState::Success { receipts } => {
                for receipt in receipts {
                    println!(
                        "  sent {} as message {}",
                        receipt.file_name.as_deref().unwrap_or("document"),
                        receipt.message_id
                    );
                }
                return state;
            }
            UploadState::Error { message, .. } => {
                println!("  error: {}", message);
                return state;
            }
        }
        if states.changed().await.is_err() {
            return state;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    LoggingConfig::new()
        .with_level(LogLevel::Info)
        .with_format(LogFormat::Compact)
        .init()?;

    let token = std::env::var("TELEGRAM_BOT_TOKEN")?;
    let chat_id = std::env::var("TELEGRAM_CHAT_ID")?;
    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: upload_files <path>...");
        return Ok(());
    }

    let config = TelegramConfig::builder()
        .bot_token(&token)?
        .chat_id(chat_id)
        .build()?;

    println!("Creating Telegram client...");
    let client = telegram_uploader::create_client(config)?;
    let sink = Arc::new(WatchSink::new());
    let mut states = sink.subscribe();
    let orchestrator = client.orchestrator(sink)?;

    let references = paths.into_iter().map(FileReference::new).collect();
    orchestrator
        .start_batch(references, Arc::new(FsAccessResolver::new()))
        .await;

    let outcome = follow(&mut states).await;
    if let UploadState::Error {
        is_retryable: true, ..
    } = outcome
    {
        println!("Retrying failed files...");
        orchestrator.retry_failed().await?;
        follow(&mut states).await;
    }

    orchestrator.wait_for_completion().await;
    Ok(())
}
