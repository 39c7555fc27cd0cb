//! Spooling of source streams into staged temp files.
//!
//! A staged copy gives the upload a stable file with a known length. The
//! copy is owned by a [`StagedFile`]; it is removed either explicitly through
//! [`StagedFile::delete`] or when the value is dropped, so it cannot outlive
//! the code that created it and cannot be removed twice.

use crate::access::AccessResolver;
use crate::errors::{UploadError, UploadResult};
use crate::types::FileReference;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Default copy buffer size (8 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

const STAGING_PREFIX: &str = "upload";

/// A local staged copy of a source file
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    size: u64,
}

impl StagedFile {
    /// Location of the staged copy
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes actually copied
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Remove the staged copy now, surfacing any I/O error
    pub fn delete(self) -> UploadResult<()> {
        self.path
            .close()
            .map_err(|e| UploadError::staging(format!("Failed to delete staged file: {}", e)))
    }
}

/// Copies sources into staged files with progress reporting
#[derive(Debug, Clone)]
pub struct SpoolingReader {
    buffer_size: usize,
    staging_dir: Option<PathBuf>,
}

impl Default for SpoolingReader {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            staging_dir: None,
        }
    }
}

impl SpoolingReader {
    /// Create a reader with the default buffer size and system temp dir
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the copy buffer size
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Stage copies under the given directory
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Copy `reference` into a staged file
    ///
    /// `declared_size` must be positive; zero or negative sizes fail with
    /// [`UploadError::InvalidSize`] before the source is opened. After each
    /// chunk is written `on_progress` receives the copied percentage of the
    /// declared size, capped at 100. Cancellation is checked before every
    /// chunk and interrupts a pending read.
    #[instrument(skip(self, resolver, cancel, on_progress), fields(reference = %reference.id))]
    pub async fn spool<F>(
        &self,
        resolver: &dyn AccessResolver,
        reference: &FileReference,
        declared_size: i64,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> UploadResult<StagedFile>
    where
        F: FnMut(u8) + Send,
    {
        if declared_size <= 0 {
            return Err(UploadError::InvalidSize {
                size: declared_size,
            });
        }
        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        let mut source = resolver.open(reference).await?;

        let (file, path) = self.create_staging_file()?.into_parts();
        let mut output = tokio::fs::File::from_std(file);

        let mut buffer = vec![0u8; self.buffer_size];
        let mut written: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                debug!(written, "Spooling cancelled");
                return Err(UploadError::Cancelled);
            }

            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(UploadError::Cancelled),
                read = source.read(&mut buffer) => read.map_err(|e| {
                    UploadError::source_unreadable(format!("Failed to read {}: {}", reference.id, e))
                })?,
            };
            if read == 0 {
                break;
            }

            output
                .write_all(&buffer[..read])
                .await
                .map_err(|e| UploadError::staging(format!("Failed to write staged file: {}", e)))?;
            written += read as u64;

            on_progress(percent_of(written, declared_size as u64));
        }

        output
            .flush()
            .await
            .map_err(|e| UploadError::staging(format!("Failed to flush staged file: {}", e)))?;
        drop(output);

        if written != declared_size as u64 {
            warn!(written, declared_size, "Source length differs from declared size");
        }
        debug!(written, path = %path.display(), "Spooled source");

        Ok(StagedFile {
            path,
            size: written,
        })
    }

    fn create_staging_file(&self) -> UploadResult<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);
        let created = match &self.staging_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        created.map_err(|e| UploadError::staging(format!("Failed to create staged file: {}", e)))
    }
}

fn percent_of(written: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = (written as u128 * 100) / total as u128;
    percent.min(100) as u8
}
