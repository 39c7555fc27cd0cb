//! Common types for the upload pipeline.
//!
//! File handles flow through the pipeline as [`FileReference`] (what the
//! caller selected), [`FileMetadata`] (what the access resolver reports) and
//! [`ValidatedFile`] (what survived policy checks).

use serde::{Deserialize, Serialize};

pub mod state;

pub use state::*;

/// Telegram chat identifier (numeric id or `@channelusername`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl ChatId {
    /// Create a new chat ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this is a channel username (`@name`)
    pub fn is_username(&self) -> bool {
        self.0.starts_with('@')
    }
}

impl From<String> for ChatId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ChatId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a user-selected file
///
/// The identifier is interpreted by an [`AccessResolver`](crate::AccessResolver);
/// for the filesystem resolver it is a path. Optional attributes are hints the
/// caller may already know; the resolver fills in the rest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileReference {
    /// Identifier understood by the access resolver
    pub id: String,
    /// Display name, if already known
    #[serde(default)]
    pub display_name: Option<String>,
    /// Declared content type, if already known
    #[serde(default)]
    pub content_type: Option<String>,
    /// Declared size in bytes (0 when unknown)
    #[serde(default)]
    pub declared_size: u64,
}

impl FileReference {
    /// Create a reference from an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            content_type: None,
            declared_size: 0,
        }
    }

    /// Set the display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the declared content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the declared size
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = size;
        self
    }

    /// Last non-empty path segment of the identifier
    pub fn last_path_segment(&self) -> Option<&str> {
        let trimmed = self.id.split(['?', '#']).next().unwrap_or_default();
        trimmed
            .trim_end_matches(['/', '\\'])
            .rsplit(['/', '\\'])
            .next()
            .filter(|segment| !segment.is_empty())
    }
}

impl From<&str> for FileReference {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FileReference {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// Metadata reported by an access resolver; every field is best effort
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Display name
    pub name: Option<String>,
    /// MIME type
    pub mime_type: Option<String>,
    /// Size in bytes
    pub size_bytes: Option<u64>,
}

/// A file that passed the upload policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedFile {
    /// The originating reference, needed to reopen the source
    pub reference: FileReference,
    /// Resolved display name
    pub name: String,
    /// Resolved MIME type
    pub mime_type: String,
    /// Resolved size in bytes
    pub size: u64,
}
