//! Logging setup and redaction of sensitive values.
//!
//! The bot token travels in the URL path (`/bot<token>/method`), so every URL
//! that reaches a log line goes through [`redact_url`].

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt as fmt_layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Redact a bot token, keeping only the public bot id
pub fn redact_token(token: &str) -> String {
    match token.split_once(':') {
        Some((id, _)) if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) => {
            format!("{}:[REDACTED]", id)
        }
        _ => "[REDACTED]".to_string(),
    }
}

/// Redact a URL: the `/bot<token>` path segment and sensitive query values
pub fn redact_url(url: &str) -> String {
    let (base, query) = match url.find('?') {
        Some(pos) => url.split_at(pos),
        None => (url, ""),
    };

    let base = redact_bot_path(base);
    if query.is_empty() {
        base
    } else {
        format!("{}{}", base, redact_query_params(query))
    }
}

fn redact_bot_path(base: &str) -> String {
    let Some(pos) = base.find("/bot") else {
        return base.to_string();
    };
    let token_start = pos + "/bot".len();
    let rest = &base[token_start..];
    let token_end = rest.find('/').unwrap_or(rest.len());
    if token_end == 0 {
        return base.to_string();
    }

    format!(
        "{}{}{}",
        &base[..token_start],
        redact_token(&rest[..token_end]),
        &rest[token_end..]
    )
}

/// Redact sensitive query parameters
fn redact_query_params(query: &str) -> String {
    let sensitive_params = ["token", "key", "secret", "password", "api_key"];

    let mut result = String::from("?");
    let params = query.trim_start_matches('?');

    for (i, pair) in params.split('&').enumerate() {
        if i > 0 {
            result.push('&');
        }

        match pair.split_once('=') {
            Some((key, _)) if sensitive_params.iter().any(|s| key.eq_ignore_ascii_case(s)) => {
                result.push_str(key);
                result.push_str("=[REDACTED]");
            }
            _ => result.push_str(pair),
        }
    }

    result
}

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Trace level
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warning level
    Warn,
    /// Error level
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output
    Pretty,
    /// One JSON object per event
    Json,
    /// Single-line output
    Compact,
}

/// Logging configuration for applications embedding the uploader
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
    /// Include the event target
    pub include_target: bool,
    /// Include source file and line
    pub include_file_line: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            include_target: true,
            include_file_line: false,
        }
    }
}

impl LoggingConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the level
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Include or omit the event target
    pub fn with_target(mut self, include: bool) -> Self {
        self.include_target = include;
        self
    }

    /// Include or omit file and line
    pub fn with_file_line(mut self, include: bool) -> Self {
        self.include_file_line = include;
        self
    }

    /// Install a global subscriber
    ///
    /// `RUST_LOG` directives are honored on top of the configured level.
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed.
    pub fn init(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from(self.level).into())
            .from_env_lossy();

        match self.format {
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        fmt_layer::layer()
                            .with_target(self.include_target)
                            .with_file(self.include_file_line)
                            .with_line_number(self.include_file_line),
                    )
                    .try_init()?;
            }
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer::layer().json().with_target(self.include_target))
                    .try_init()?;
            }
            LogFormat::Compact => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer::layer().compact().with_target(self.include_target))
                    .try_init()?;
            }
        }

        Ok(())
    }
}
