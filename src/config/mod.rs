//! Configuration management for the uploader.
//!
//! Values are supplied explicitly through [`TelegramConfigBuilder`]; the
//! library never reads the environment on its own.

use crate::errors::{ConfigurationError, UploadError, UploadResult};
use crate::types::ChatId;
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Secure wrapper for a Telegram bot token (`<bot id>:<secret>`)
#[derive(Clone)]
pub struct BotToken {
    token: SecretString,
    bot_id: u64,
}

impl BotToken {
    /// Create a new token, checking its `<digits>:<secret>` shape
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigurationError> {
        let token_str = token.into();
        let (id, secret) = token_str.split_once(':').ok_or_else(|| {
            ConfigurationError::InvalidToken("Token must look like <bot id>:<secret>".to_string())
        })?;

        let bot_id = id.parse::<u64>().map_err(|_| {
            ConfigurationError::InvalidToken("Bot id must be numeric".to_string())
        })?;

        if secret.is_empty() || secret.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(ConfigurationError::InvalidToken(
                "Token secret is empty or contains invalid characters".to_string(),
            ));
        }

        Ok(Self {
            token: SecretString::new(token_str),
            bot_id,
        })
    }

    /// Numeric bot id (the public half of the token)
    pub fn bot_id(&self) -> u64 {
        self.bot_id
    }

    /// Expose the token for use in request URLs
    pub(crate) fn expose(&self) -> &str {
        self.token.expose_secret()
    }
}

impl std::fmt::Debug for BotToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BotToken({}, [REDACTED])", self.bot_id)
    }
}

/// Size and content-type policy applied by the batch validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Largest accepted file, in bytes
    pub max_file_size_bytes: u64,
    /// A file is accepted when its MIME type starts with one of these
    pub allowed_mime_prefixes: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size_bytes: crate::DEFAULT_MAX_FILE_SIZE,
            allowed_mime_prefixes: crate::DEFAULT_ALLOWED_MIME_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl UploadPolicy {
    /// Check a MIME type against the allowed prefixes
    pub fn allows_mime(&self, mime_type: &str) -> bool {
        self.allowed_mime_prefixes
            .iter()
            .any(|prefix| mime_type.starts_with(prefix.as_str()))
    }

    /// Check a size against the ceiling
    pub fn allows_size(&self, size_bytes: u64) -> bool {
        size_bytes <= self.max_file_size_bytes
    }
}

/// Configuration for the Telegram client
#[derive(Clone)]
pub struct TelegramConfig {
    pub(crate) bot_token: Option<BotToken>,
    /// Destination chat for uploaded documents
    pub chat_id: Option<ChatId>,
    /// Base URL; the token and method are appended directly
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Upload attempts per file
    pub max_attempts: u32,
    /// Caption attached to every document
    pub caption: Option<String>,
    /// Directory for staged copies (system temp dir when unset)
    pub staging_dir: Option<PathBuf>,
    /// Validation policy
    pub upload_policy: UploadPolicy,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token)
            .field("chat_id", &self.chat_id)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .field("caption", &self.caption)
            .field("staging_dir", &self.staging_dir)
            .field("upload_policy", &self.upload_policy)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            base_url: crate::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECS),
            max_attempts: crate::DEFAULT_MAX_ATTEMPTS,
            caption: None,
            staging_dir: None,
            upload_policy: UploadPolicy::default(),
        }
    }
}

impl TelegramConfig {
    /// Create a new configuration builder
    pub fn builder() -> TelegramConfigBuilder {
        TelegramConfigBuilder::new()
    }

    /// Get the bot token if available
    pub fn bot_token(&self) -> Option<&BotToken> {
        self.bot_token.as_ref()
    }

    /// Build the full URL for a Bot API method: `{base}{token}/{method}`
    pub fn method_url(&self, method: &str) -> UploadResult<String> {
        let token = self
            .bot_token
            .as_ref()
            .ok_or(UploadError::Configuration(ConfigurationError::MissingToken))?;
        Ok(format!(
            "{}{}/{}",
            self.base_url,
            token.expose(),
            method.trim_start_matches('/')
        ))
    }

    /// Validate the configuration
    pub fn validate(&self) -> UploadResult<()> {
        if self.bot_token.is_none() {
            return Err(ConfigurationError::MissingToken.into());
        }
        if self.chat_id.is_none() {
            return Err(ConfigurationError::MissingChatId.into());
        }
        if self.max_attempts == 0 {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "max_attempts must be at least 1".to_string(),
            }
            .into());
        }
        if self.upload_policy.allowed_mime_prefixes.is_empty() {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "at least one allowed MIME prefix is required".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Builder for TelegramConfig
#[derive(Default)]
pub struct TelegramConfigBuilder {
    config: TelegramConfig,
}

impl TelegramConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: TelegramConfig::default(),
        }
    }

    /// Set the bot token
    pub fn bot_token(mut self, token: &str) -> Result<Self, ConfigurationError> {
        self.config.bot_token = Some(BotToken::new(token)?);
        Ok(self)
    }

    /// Set the destination chat
    pub fn chat_id(mut self, chat_id: impl Into<ChatId>) -> Self {
        self.config.chat_id = Some(chat_id.into());
        self
    }

    /// Set the base URL
    ///
    /// The token is appended without a separator, so the value normally ends
    /// in `/bot`.
    pub fn base_url(mut self, url: &str) -> Result<Self, ConfigurationError> {
        Url::parse(url).map_err(|e| ConfigurationError::InvalidConfiguration {
            message: format!("Invalid URL: {}", e),
        })?;
        self.config.base_url = url.to_string();
        Ok(self)
    }

    /// Set the timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the number of upload attempts per file
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Set a caption for every uploaded document
    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.config.caption = Some(caption.into());
        self
    }

    /// Set the staging directory
    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.staging_dir = Some(dir.into());
        self
    }

    /// Set the maximum file size
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.upload_policy.max_file_size_bytes = bytes;
        self
    }

    /// Replace the allowed MIME prefixes
    pub fn allowed_mime_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.upload_policy.allowed_mime_prefixes =
            prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the whole upload policy
    pub fn upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.config.upload_policy = policy;
        self
    }

    /// Build the configuration
    pub fn build(self) -> UploadResult<TelegramConfig> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Build the configuration without validation (for testing)
    pub fn build_unchecked(self) -> TelegramConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_validation() {
        assert_eq!(BotToken::new("123456:ABC-DEF").unwrap().bot_id(), 123456);
        assert!(BotToken::new("no-colon").is_err());
        assert!(BotToken::new("abc:secret").is_err());
        assert!(BotToken::new("123:").is_err());
        assert!(BotToken::new("123:se/cret").is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = TelegramConfigBuilder::new()
            .bot_token("123456:ABC-DEF")
            .unwrap()
            .chat_id("-100200")
            .timeout(Duration::from_secs(30))
            .max_attempts(5)
            .caption("hello")
            .build()
            .unwrap();

        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.caption.as_deref(), Some("hello"));
        assert_eq!(config.chat_id, Some(ChatId::new("-100200")));
    }

    #[test]
    fn test_defaults() {
        let config = TelegramConfig::default();
        assert_eq!(config.base_url, "https://api.telegram.org/bot");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.upload_policy.max_file_size_bytes, 2 * 1024 * 1024 * 1024);
        assert_eq!(config.upload_policy.allowed_mime_prefixes.len(), 7);
    }

    #[test]
    fn test_build_requires_token_and_chat() {
        let missing_token = TelegramConfig::builder().chat_id("1").build();
        assert!(matches!(
            missing_token,
            Err(UploadError::Configuration(ConfigurationError::MissingToken))
        ));

        let missing_chat = TelegramConfig::builder()
            .bot_token("1:abc")
            .unwrap()
            .build();
        assert!(matches!(
            missing_chat,
            Err(UploadError::Configuration(ConfigurationError::MissingChatId))
        ));
    }

    #[test]
    fn test_method_url() {
        let config = TelegramConfig::builder()
            .bot_token("42:secret")
            .unwrap()
            .chat_id("7")
            .base_url("http://localhost:8080/bot")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            config.method_url("sendDocument").unwrap(),
            "http://localhost:8080/bot42:secret/sendDocument"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = TelegramConfig::builder()
            .bot_token("42:supersecret")
            .unwrap()
            .build_unchecked();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_policy_predicates() {
        let policy = UploadPolicy::default();
        assert!(policy.allows_mime("image/png"));
        assert!(policy.allows_mime("application/vnd.openxmlformats-officedocument.wordprocessingml.document"));
        assert!(!policy.allows_mime("application/zip"));
        assert!(policy.allows_size(2 * 1024 * 1024 * 1024));
        assert!(!policy.allows_size(2 * 1024 * 1024 * 1024 + 1));
    }
}
