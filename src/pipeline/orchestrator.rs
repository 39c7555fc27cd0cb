//! Sequential, cancellable batch orchestration.

use super::sink::{StatePublisher, StateSink};
use crate::access::AccessResolver;
use crate::errors::{UploadError, UploadResult};
use crate::observability::{
    create_batch_span, create_upload_span, record_error, record_message_id, record_success,
    MetricsSnapshot, UploadMetrics,
};
use crate::resilience::{with_retry, RetryAll, RetryConfig, RetryPolicy};
use crate::services::documents::{DocumentsServiceTrait, SendDocumentRequest};
use crate::spool::SpoolingReader;
use crate::types::{ChatId, FileReference, RemoteReceipt, UploadState, ValidatedFile};
use crate::validation::BatchValidator;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

/// Drives validation, spooling and upload for one batch at a time
///
/// Every operation first stops the batch in flight and waits for its task to
/// finish, so at most one batch touches the state stream and the failed-files
/// list. Files are processed strictly in order and the first failure aborts
/// the rest of the batch.
pub struct UploadOrchestrator {
    inner: Arc<Inner>,
    running: tokio::sync::Mutex<Option<RunningBatch>>,
}

struct RunningBatch {
    id: String,
    token: CancellationToken,
    done: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct BatchContext {
    failed: Vec<ValidatedFile>,
    resolver: Option<Arc<dyn AccessResolver>>,
}

struct Inner {
    documents: Arc<dyn DocumentsServiceTrait>,
    validator: BatchValidator,
    spooler: SpoolingReader,
    retry_config: RetryConfig,
    retry_policy: Arc<dyn RetryPolicy>,
    chat_id: ChatId,
    caption: Option<String>,
    publisher: StatePublisher,
    context: Mutex<BatchContext>,
    metrics: UploadMetrics,
}

/// Builder for [`UploadOrchestrator`]
pub struct UploadOrchestratorBuilder {
    documents: Arc<dyn DocumentsServiceTrait>,
    chat_id: ChatId,
    sink: Arc<dyn StateSink>,
    validator: BatchValidator,
    spooler: SpoolingReader,
    retry_config: RetryConfig,
    retry_policy: Arc<dyn RetryPolicy>,
    caption: Option<String>,
}

impl UploadOrchestratorBuilder {
    /// Set the batch validator
    pub fn validator(mut self, validator: BatchValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Set the spooling reader
    pub fn spooler(mut self, spooler: SpoolingReader) -> Self {
        self.spooler = spooler;
        self
    }

    /// Set the retry configuration
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Set the retry policy
    pub fn retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry_policy = Arc::new(policy);
        self
    }

    /// Set a caption for every document
    pub fn caption(mut self, caption: Option<String>) -> Self {
        self.caption = caption;
        self
    }

    /// Build the orchestrator
    pub fn build(self) -> UploadOrchestrator {
        UploadOrchestrator {
            inner: Arc::new(Inner {
                documents: self.documents,
                validator: self.validator,
                spooler: self.spooler,
                retry_config: self.retry_config,
                retry_policy: self.retry_policy,
                chat_id: self.chat_id,
                caption: self.caption,
                publisher: StatePublisher::new(self.sink),
                context: Mutex::new(BatchContext::default()),
                metrics: UploadMetrics::new(),
            }),
            running: tokio::sync::Mutex::new(None),
        }
    }
}

impl UploadOrchestrator {
    /// Create a builder with default validation, spooling and retry settings
    pub fn builder(
        documents: Arc<dyn DocumentsServiceTrait>,
        chat_id: impl Into<ChatId>,
        sink: Arc<dyn StateSink>,
    ) -> UploadOrchestratorBuilder {
        UploadOrchestratorBuilder {
            documents,
            chat_id: chat_id.into(),
            sink,
            validator: BatchValidator::default(),
            spooler: SpoolingReader::default(),
            retry_config: RetryConfig::default(),
            retry_policy: Arc::new(RetryAll),
            caption: None,
        }
    }

    /// Start a new batch, cancelling any batch in flight
    ///
    /// Validation runs on the batch task. When nothing survives it, the batch
    /// ends in an error state and the previous failed-files list is kept;
    /// otherwise that list is cleared before the first upload.
    pub async fn start_batch(
        &self,
        references: Vec<FileReference>,
        resolver: Arc<dyn AccessResolver>,
    ) {
        let mut running = self.running.lock().await;
        self.stop(&mut running).await;

        self.inner.context.lock().resolver = Some(resolver.clone());

        let inner = self.inner.clone();
        *running = Some(self.spawn(references.len(), false, move |token, batch_id| async move {
            inner.run_fresh(&batch_id, references, resolver, &token).await
        }));
    }

    /// Cancel the batch in flight and return to idle
    ///
    /// Safe to call repeatedly; only the first call after a state change
    /// publishes [`UploadState::Idle`].
    pub async fn cancel_batch(&self) {
        let mut running = self.running.lock().await;
        self.stop(&mut running).await;
    }

    /// Upload the files that failed in the previous pass again, using the
    /// resolver of the last batch
    pub async fn retry_failed(&self) -> UploadResult<()> {
        self.retry_failed_inner(None).await
    }

    /// Upload the files that failed in the previous pass again with `resolver`
    pub async fn retry_failed_with(&self, resolver: Arc<dyn AccessResolver>) -> UploadResult<()> {
        self.retry_failed_inner(Some(resolver)).await
    }

    async fn retry_failed_inner(&self, resolver: Option<Arc<dyn AccessResolver>>) -> UploadResult<()> {
        let mut running = self.running.lock().await;

        let resolver = {
            let mut context = self.inner.context.lock();
            if let Some(resolver) = resolver {
                context.resolver = Some(resolver);
            }
            match (&context.resolver, context.failed.is_empty()) {
                (Some(resolver), false) => Some(resolver.clone()),
                _ => None,
            }
        };
        let Some(resolver) = resolver else {
            warn!("Retry requested without failed uploads");
            self.inner.publisher.publish(UploadState::Error {
                message: UploadError::NoFailedUploads.to_string(),
                is_retryable: false,
            });
            return Err(UploadError::NoFailedUploads);
        };

        self.stop(&mut running).await;

        let files = std::mem::take(&mut self.inner.context.lock().failed);
        if files.is_empty() {
            self.inner.publisher.publish(UploadState::Error {
                message: UploadError::NoFailedUploads.to_string(),
                is_retryable: false,
            });
            return Err(UploadError::NoFailedUploads);
        }

        let inner = self.inner.clone();
        *running = Some(self.spawn(files.len(), true, move |token, batch_id| async move {
            inner.process(&batch_id, files, resolver, &token, true).await
        }));
        Ok(())
    }

    /// Wait until the batch in flight, if any, has finished
    pub async fn wait_for_completion(&self) {
        let done = {
            let running = self.running.lock().await;
            running.as_ref().map(|batch| batch.done.clone())
        };
        if let Some(done) = done {
            done.cancelled().await;
        }
    }

    /// Current state of the stream
    pub fn current_state(&self) -> UploadState {
        self.inner.publisher.current()
    }

    /// Subscribe to the state stream if the sink supports subscriptions
    pub fn subscribe(&self) -> Option<watch::Receiver<UploadState>> {
        self.inner.publisher.subscribe()
    }

    /// Files recorded for the next retry pass
    pub fn failed_files(&self) -> Vec<ValidatedFile> {
        self.inner.context.lock().failed.clone()
    }

    /// Upload counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    fn spawn<F, Fut>(&self, file_count: usize, retry: bool, run: F) -> RunningBatch
    where
        F: FnOnce(CancellationToken, String) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let id = uuid::Uuid::new_v4().to_string();
        let token = CancellationToken::new();
        let done = CancellationToken::new();

        self.inner.metrics.record_batch_started();
        info!(batch_id = %id, file_count, retry, "Starting upload batch");

        let span = create_batch_span(&id, file_count, retry);
        let guard = done.clone().drop_guard();
        let task = run(token.clone(), id.clone());
        let handle = tokio::spawn(
            async move {
                let _guard = guard;
                task.await;
            }
            .instrument(span),
        );

        RunningBatch {
            id,
            token,
            done,
            handle,
        }
    }

    async fn stop(&self, running: &mut Option<RunningBatch>) {
        let batch = running.take();
        let token = batch.as_ref().map(|b| &b.token);
        self.inner.publisher.cancel_and_reset(token);

        if let Some(batch) = batch {
            if !batch.handle.is_finished() {
                self.inner.metrics.record_batch_cancelled();
                info!(batch_id = %batch.id, "Cancelling upload batch");
            }
            if let Err(e) = batch.handle.await {
                warn!(batch_id = %batch.id, error = %e, "Upload batch task ended abnormally");
            }
        }
    }
}

impl Drop for UploadOrchestrator {
    fn drop(&mut self) {
        if let Ok(running) = self.running.try_lock() {
            if let Some(batch) = running.as_ref() {
                batch.token.cancel();
            }
        }
    }
}

impl std::fmt::Debug for UploadOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOrchestrator")
            .field("chat_id", &self.inner.chat_id)
            .field("state", &self.inner.publisher.current())
            .finish_non_exhaustive()
    }
}

impl Inner {
    async fn run_fresh(
        &self,
        batch_id: &str,
        references: Vec<FileReference>,
        resolver: Arc<dyn AccessResolver>,
        token: &CancellationToken,
    ) {
        let files = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            files = self.validator.validate(&references, resolver.as_ref()) => files,
        };

        if files.is_empty() {
            warn!(batch_id, "No valid files in batch");
            if self.publisher.publish_for(
                token,
                UploadState::Error {
                    message: UploadError::ValidationEmpty.to_string(),
                    is_retryable: false,
                },
            ) {
                self.metrics.record_batch_finished(false);
            }
            return;
        }

        self.context.lock().failed.clear();
        self.process(batch_id, files, resolver, token, false).await;
    }

    async fn process(
        &self,
        batch_id: &str,
        files: Vec<ValidatedFile>,
        resolver: Arc<dyn AccessResolver>,
        token: &CancellationToken,
        retry: bool,
    ) {
        let total = files.len();
        let mut receipts = Vec::with_capacity(total);

        for (index, file) in files.iter().enumerate() {
            let progress = UploadState::Progress {
                current: index + 1,
                total,
                file_name: file.name.clone(),
            };
            if !self.publisher.publish_for(token, progress) {
                self.restore_unfinished(retry, &files[index..]);
                return;
            }

            let span = create_upload_span(batch_id, &file.name, index + 1, total);
            let result = self
                .upload_file(file, resolver.as_ref(), token)
                .instrument(span.clone())
                .await;

            match result {
                Ok(receipt) => {
                    record_success(&span);
                    record_message_id(&span, receipt.message_id);
                    self.metrics.record_file(true);
                    receipts.push(receipt);
                }
                Err(_) if token.is_cancelled() => {
                    debug!(batch_id, file = %file.name, "Batch cancelled mid-file");
                    self.restore_unfinished(retry, &files[index..]);
                    return;
                }
                Err(error) => {
                    record_error(&span, &error.to_string());
                    warn!(batch_id, file = %file.name, error = %error, code = error.error_code(), "File upload failed");
                    self.metrics.record_file(false);
                    self.context.lock().failed.push(file.clone());

                    let state = UploadState::Error {
                        message: format!("Failed to upload {}: {}", file.name, error),
                        is_retryable: true,
                    };
                    if self.publisher.publish_for(token, state) {
                        self.metrics.record_batch_finished(false);
                    }
                    return;
                }
            }
        }

        info!(batch_id, uploaded = receipts.len(), "Upload batch finished");
        if self
            .publisher
            .publish_for(token, UploadState::Success { receipts })
        {
            self.metrics.record_batch_finished(true);
        }
    }

    /// A cancelled retry pass hands its untried files back to the failed list
    fn restore_unfinished(&self, retry: bool, remaining: &[ValidatedFile]) {
        if retry && !remaining.is_empty() {
            self.context.lock().failed.extend_from_slice(remaining);
        }
    }

    async fn upload_file(
        &self,
        file: &ValidatedFile,
        resolver: &dyn AccessResolver,
        token: &CancellationToken,
    ) -> UploadResult<RemoteReceipt> {
        self.publisher
            .publish_for(token, UploadState::Preparing { percent: 0 });

        let declared_size = i64::try_from(file.size).unwrap_or(i64::MAX);
        let mut last_percent = 0u8;
        let staged = self
            .spooler
            .spool(resolver, &file.reference, declared_size, token, |percent| {
                if percent != last_percent {
                    last_percent = percent;
                    self.publisher
                        .publish_for(token, UploadState::Preparing { percent });
                }
            })
            .await?;
        self.metrics.record_bytes_staged(staged.size());

        let request = SendDocumentRequest::from_staged(
            self.chat_id.clone(),
            &staged,
            file.name.clone(),
            file.mime_type.clone(),
        )
        .maybe_caption(self.caption.clone());
        let total_bytes = staged.size();

        let result = with_retry(
            &self.retry_config,
            self.retry_policy.as_ref(),
            token,
            |attempt| {
                self.metrics.record_attempt(attempt);
                self.publisher.publish_for(
                    token,
                    UploadState::Uploading {
                        bytes_sent: 0,
                        total_bytes,
                    },
                );
                let documents = self.documents.clone();
                let request = request.clone();
                async move { documents.send_document(request).await }
            },
        )
        .await;

        if let Err(e) = staged.delete() {
            warn!(error = %e, "Failed to remove staged file");
        }

        result
    }
}
