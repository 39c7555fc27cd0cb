//! Access to the bytes and metadata behind a [`FileReference`].
//!
//! The pipeline never touches storage directly; it asks an
//! [`AccessResolver`] for metadata during validation and for a byte stream
//! while spooling.

use crate::errors::{UploadError, UploadResult};
use crate::types::{FileMetadata, FileReference};
use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncRead;
use tracing::debug;

/// Readable byte stream for one source file
pub type ByteSource = Box<dyn AsyncRead + Send + Unpin>;

/// Resolves file references to metadata and readable streams
#[async_trait]
pub trait AccessResolver: Send + Sync {
    /// Best-effort metadata lookup
    async fn resolve_metadata(&self, reference: &FileReference) -> UploadResult<FileMetadata>;

    /// Open the source for reading
    ///
    /// Failures are reported as [`UploadError::SourceUnreadable`].
    async fn open(&self, reference: &FileReference) -> UploadResult<ByteSource>;
}

/// Resolver for references whose identifier is a local path
#[derive(Debug, Clone, Default)]
pub struct FsAccessResolver;

impl FsAccessResolver {
    /// Create a new filesystem resolver
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AccessResolver for FsAccessResolver {
    async fn resolve_metadata(&self, reference: &FileReference) -> UploadResult<FileMetadata> {
        let path = Path::new(&reference.id);
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            UploadError::source_unreadable(format!("{}: {}", reference.id, e))
        })?;

        if !metadata.is_file() {
            return Err(UploadError::source_unreadable(format!(
                "{}: not a regular file",
                reference.id
            )));
        }

        let name = reference.display_name.clone().or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
        });

        // Unknown extensions stay untyped and are rejected by validation.
        let mime_type = reference
            .content_type
            .clone()
            .or_else(|| mime_guess::from_path(path).first().map(|m| m.to_string()));

        debug!(path = %reference.id, size = metadata.len(), ?mime_type, "Resolved file metadata");

        Ok(FileMetadata {
            name,
            mime_type,
            size_bytes: Some(metadata.len()),
        })
    }

    async fn open(&self, reference: &FileReference) -> UploadResult<ByteSource> {
        let file = tokio::fs::File::open(&reference.id).await.map_err(|e| {
            UploadError::source_unreadable(format!("Failed to read file {}: {}", reference.id, e))
        })?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_resolve_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello world").unwrap();

        let resolver = FsAccessResolver::new();
        let reference = FileReference::new(path.to_string_lossy());
        let metadata = resolver.resolve_metadata(&reference).await.unwrap();

        assert_eq!(metadata.name.as_deref(), Some("notes.txt"));
        assert_eq!(metadata.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(metadata.size_bytes, Some(11));
    }

    #[tokio::test]
    async fn test_unknown_extension_has_no_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.zzunknown");
        std::fs::write(&path, b"x").unwrap();

        let metadata = FsAccessResolver::new()
            .resolve_metadata(&FileReference::new(path.to_string_lossy()))
            .await
            .unwrap();
        assert_eq!(metadata.mime_type, None);
    }

    #[tokio::test]
    async fn test_open_missing_file_is_unreadable() {
        let resolver = FsAccessResolver::new();
        let result = resolver
            .open(&FileReference::new("/definitely/not/here.pdf"))
            .await;
        assert!(matches!(result, Err(UploadError::SourceUnreadable { .. })));
    }

    #[tokio::test]
    async fn test_open_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let mut source = FsAccessResolver::new()
            .open(&FileReference::new(path.to_string_lossy()))
            .await
            .unwrap();
        let mut content = Vec::new();
        source.read_to_end(&mut content).await.unwrap();
        assert_eq!(content, b"%PDF-1.4");
    }
}
