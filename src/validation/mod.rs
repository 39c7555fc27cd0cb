//! Batch validation against the upload policy.
//!
//! Validation never fails as a whole: references that cannot be inspected
//! or that break the policy are dropped and reported, and the accepted ones
//! keep their input order.

use crate::access::AccessResolver;
use crate::config::UploadPolicy;
use crate::types::{FileReference, ValidatedFile};
use tracing::{debug, warn};

/// Display name used when neither the resolver nor the identifier yields one
pub const UNKNOWN_FILE_NAME: &str = "Unknown";

/// Why a reference was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// No content type could be determined
    MissingMimeType,
    /// Content type not covered by any allowed prefix
    UnsupportedMimeType(String),
    /// Size above the ceiling
    TooLarge {
        /// Resolved size
        size: u64,
        /// Configured ceiling
        max: u64,
    },
    /// The resolver failed
    Unreadable(String),
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingMimeType => write!(f, "Invalid file type"),
            Self::UnsupportedMimeType(mime) => write!(f, "Unsupported file type {}", mime),
            Self::TooLarge { size, max } => write!(f, "File too large ({} > {} bytes)", size, max),
            Self::Unreadable(message) => write!(f, "Error processing file: {}", message),
        }
    }
}

/// A dropped reference together with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// The dropped reference
    pub reference: FileReference,
    /// Best-effort display name
    pub name: String,
    /// Why it was dropped
    pub reason: RejectionReason,
}

/// Outcome of validating a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Accepted files, in input order
    pub accepted: Vec<ValidatedFile>,
    /// Dropped references, in input order
    pub rejected: Vec<Rejection>,
}

/// Filters references by size ceiling and allowed MIME prefixes
#[derive(Debug, Clone, Default)]
pub struct BatchValidator {
    policy: UploadPolicy,
}

impl BatchValidator {
    /// Create a validator for the given policy
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }

    /// The policy in use
    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Validate references, returning only the accepted files
    pub async fn validate(
        &self,
        references: &[FileReference],
        resolver: &dyn AccessResolver,
    ) -> Vec<ValidatedFile> {
        self.validate_with_report(references, resolver)
            .await
            .accepted
    }

    /// Validate references, keeping the rejections as well
    pub async fn validate_with_report(
        &self,
        references: &[FileReference],
        resolver: &dyn AccessResolver,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();

        for reference in references {
            match self.check(reference, resolver).await {
                Ok(file) => {
                    debug!(name = %file.name, mime_type = %file.mime_type, size = file.size, "Accepted file");
                    report.accepted.push(file);
                }
                Err(rejection) => {
                    warn!(name = %rejection.name, reason = %rejection.reason, "Dropped file");
                    report.rejected.push(rejection);
                }
            }
        }

        report
    }

    async fn check(
        &self,
        reference: &FileReference,
        resolver: &dyn AccessResolver,
    ) -> Result<ValidatedFile, Rejection> {
        let fallback_name = || {
            reference
                .display_name
                .clone()
                .or_else(|| reference.last_path_segment().map(str::to_string))
                .unwrap_or_else(|| UNKNOWN_FILE_NAME.to_string())
        };

        let metadata = resolver
            .resolve_metadata(reference)
            .await
            .map_err(|e| Rejection {
                reference: reference.clone(),
                name: fallback_name(),
                reason: RejectionReason::Unreadable(e.to_string()),
            })?;

        let name = metadata
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(fallback_name);
        let reject = |reason| Rejection {
            reference: reference.clone(),
            name: name.clone(),
            reason,
        };

        let mime_type = match metadata.mime_type.or_else(|| reference.content_type.clone()) {
            Some(mime) => mime,
            None => return Err(reject(RejectionReason::MissingMimeType)),
        };
        if !self.policy.allows_mime(&mime_type) {
            return Err(reject(RejectionReason::UnsupportedMimeType(mime_type)));
        }

        let size = metadata.size_bytes.unwrap_or(reference.declared_size);
        if !self.policy.allows_size(size) {
            return Err(reject(RejectionReason::TooLarge {
                size,
                max: self.policy.max_file_size_bytes,
            }));
        }

        Ok(ValidatedFile {
            reference: reference.clone(),
            name,
            mime_type,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockAccessResolver;
    use crate::types::FileMetadata;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn validator() -> BatchValidator {
        BatchValidator::new(UploadPolicy::default())
    }

    #[test_case("image/jpeg", true ; "image")]
    #[test_case("video/mp4", true ; "video")]
    #[test_case("audio/ogg", true ; "audio")]
    #[test_case("application/pdf", true ; "pdf")]
    #[test_case("application/msword", true ; "word")]
    #[test_case("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", true ; "ooxml")]
    #[test_case("text/plain", true ; "plain text")]
    #[test_case("text/html", false ; "html")]
    #[test_case("application/zip", false ; "zip")]
    #[test_case("application/x-msdownload", false ; "executable")]
    #[tokio::test]
    async fn test_mime_policy(mime: &str, accepted: bool) {
        let resolver = MockAccessResolver::new().with_file("f", "file", mime, b"1234");
        let files = validator().validate(&[FileReference::new("f")], &resolver).await;
        assert_eq!(files.len() == 1, accepted);
        if accepted {
            assert_eq!(files[0].mime_type, mime);
            assert_eq!(files[0].size, 4);
        }
    }

    #[tokio::test]
    async fn test_order_preserved_and_rejects_dropped() {
        let resolver = MockAccessResolver::new()
            .with_file("1", "one.pdf", "application/pdf", b"a")
            .with_file("2", "two.zip", "application/zip", b"b")
            .with_file("3", "three.png", "image/png", b"c")
            .with_file("4", "four.txt", "text/plain", b"d");
        let references: Vec<_> = ["4", "2", "1", "missing", "3"]
            .into_iter()
            .map(FileReference::new)
            .collect();

        let report = validator().validate_with_report(&references, &resolver).await;

        let names: Vec<_> = report.accepted.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["four.txt", "one.pdf", "three.png"]);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].name, "two.zip");
        assert!(matches!(report.rejected[1].reason, RejectionReason::Unreadable(_)));
    }

    #[tokio::test]
    async fn test_size_ceiling() {
        let policy = UploadPolicy {
            max_file_size_bytes: 4,
            ..UploadPolicy::default()
        };
        let resolver = MockAccessResolver::new()
            .with_file("ok", "ok.txt", "text/plain", b"1234")
            .with_file("big", "big.txt", "text/plain", b"12345");

        let report = BatchValidator::new(policy)
            .validate_with_report(&[FileReference::new("ok"), FileReference::new("big")], &resolver)
            .await;

        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].name, "ok.txt");
        assert_eq!(
            report.rejected[0].reason,
            RejectionReason::TooLarge { size: 5, max: 4 }
        );
    }

    #[tokio::test]
    async fn test_missing_mime_rejected() {
        let resolver = MockAccessResolver::new().with_metadata(
            "x",
            FileMetadata {
                name: Some("x".to_string()),
                mime_type: None,
                size_bytes: Some(1),
            },
        );
        let report = validator()
            .validate_with_report(&[FileReference::new("x")], &resolver)
            .await;
        assert!(report.accepted.is_empty());
        assert_eq!(report.rejected[0].reason, RejectionReason::MissingMimeType);
    }

    #[tokio::test]
    async fn test_name_falls_back_to_path_segment_then_unknown() {
        let unnamed = FileMetadata {
            name: None,
            mime_type: Some("image/png".to_string()),
            size_bytes: Some(3),
        };
        let resolver = MockAccessResolver::new()
            .with_metadata("content://media/images/77", unnamed.clone())
            .with_metadata("", unnamed);

        let files = validator()
            .validate(
                &[FileReference::new("content://media/images/77"), FileReference::new("")],
                &resolver,
            )
            .await;

        assert_eq!(files[0].name, "77");
        assert_eq!(files[1].name, UNKNOWN_FILE_NAME);
    }

    #[tokio::test]
    async fn test_zero_size_is_accepted() {
        let resolver = MockAccessResolver::new().with_file("e", "empty.txt", "text/plain", b"");
        let files = validator().validate(&[FileReference::new("e")], &resolver).await;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].size, 0);
    }
}
