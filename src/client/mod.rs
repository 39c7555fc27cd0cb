//! Telegram client implementation.
//!
//! Wires configuration, transport and services together and hands out
//! upload orchestrators bound to the configured chat.

use crate::config::TelegramConfig;
use crate::errors::{ConfigurationError, UploadResult};
use crate::pipeline::{StateSink, UploadOrchestrator};
use crate::resilience::RetryConfig;
use crate::services::documents::{DocumentsService, DocumentsServiceTrait};
use crate::spool::SpoolingReader;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::validation::BatchValidator;
use std::sync::Arc;

/// Trait defining the Telegram client interface
pub trait TelegramClient: Send + Sync {
    /// Get the configuration
    fn config(&self) -> &TelegramConfig;

    /// Get the documents service
    fn documents(&self) -> &dyn DocumentsServiceTrait;
}

/// Telegram client implementation
pub struct TelegramClientImpl {
    config: Arc<TelegramConfig>,
    documents: Arc<DocumentsService>,
}

impl TelegramClientImpl {
    /// Create a new client with the given configuration
    pub fn new(config: TelegramConfig) -> UploadResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
        Self::with_transport(config, transport)
    }

    /// Create a client over a custom transport
    pub fn with_transport(
        config: TelegramConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> UploadResult<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let documents = Arc::new(DocumentsService::new(transport, config.clone()));
        Ok(Self { config, documents })
    }

    /// Create an orchestrator that uploads to the configured chat
    ///
    /// Validation, staging, attempt count and caption all come from the
    /// configuration; failed attempts are retried regardless of cause.
    pub fn orchestrator(&self, sink: Arc<dyn StateSink>) -> UploadResult<UploadOrchestrator> {
        let chat_id = self
            .config
            .chat_id
            .clone()
            .ok_or(ConfigurationError::MissingChatId)?;

        let mut spooler = SpoolingReader::new();
        if let Some(dir) = &self.config.staging_dir {
            spooler = spooler.with_staging_dir(dir);
        }

        let documents: Arc<dyn DocumentsServiceTrait> = self.documents.clone();
        Ok(UploadOrchestrator::builder(documents, chat_id, sink)
            .validator(BatchValidator::new(self.config.upload_policy.clone()))
            .spooler(spooler)
            .retry_config(RetryConfig::new().max_attempts(self.config.max_attempts))
            .caption(self.config.caption.clone())
            .build())
    }
}

impl TelegramClient for TelegramClientImpl {
    fn config(&self) -> &TelegramConfig {
        &self.config
    }

    fn documents(&self) -> &dyn DocumentsServiceTrait {
        self.documents.as_ref()
    }
}

impl std::fmt::Debug for TelegramClientImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClientImpl")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::UploadError;
    use crate::mocks::{MockHttpTransport, RecordingSink};

    #[test]
    fn test_client_requires_valid_config() {
        let config = TelegramConfig::builder()
            .bot_token("1:abc")
            .unwrap()
            .build_unchecked();
        let result = TelegramClientImpl::with_transport(config, Arc::new(MockHttpTransport::new()));
        assert!(matches!(
            result,
            Err(UploadError::Configuration(ConfigurationError::MissingChatId))
        ));
    }

    #[test]
    fn test_client_exposes_config() {
        let config = TelegramConfig::builder()
            .bot_token("1:abc")
            .unwrap()
            .chat_id("5")
            .max_attempts(2)
            .build()
            .unwrap();
        let client = TelegramClientImpl::with_transport(config, Arc::new(MockHttpTransport::new())).unwrap();
        assert_eq!(client.config().max_attempts, 2);
    }

    #[tokio::test]
    async fn test_orchestrator_starts_idle() {
        let config = TelegramConfig::builder()
            .bot_token("1:abc")
            .unwrap()
            .chat_id("5")
            .build()
            .unwrap();
        let client = TelegramClientImpl::with_transport(config, Arc::new(MockHttpTransport::new())).unwrap();
        let orchestrator = client.orchestrator(Arc::new(RecordingSink::new())).unwrap();
        assert!(orchestrator.current_state().is_idle());
        assert!(orchestrator.failed_files().is_empty());
    }
}
