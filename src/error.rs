//! Error types for stackapi
//!
//! Every failure of a fetch or send is returned as [`Error`]. Failures that happen
//! while talking to the API (connection problems, unreadable bodies, and errors the
//! API reports itself) all share the [`ApiError`] shape so callers can inspect the
//! failing URL and error code uniformly.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The main error type for stackapi
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Caller Errors
    // ============================================================================
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    // ============================================================================
    // API Errors
    // ============================================================================
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// The API error carried by this error, if any
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Check whether retrying the same call later could succeed.
    ///
    /// The client never retries on its own; this is advice for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api(err) => match err.kind {
                ApiErrorKind::Transport => true,
                ApiErrorKind::Parse => false,
                ApiErrorKind::Remote => matches!(err.error_id.code(), Some(502 | 503)),
            },
            _ => false,
        }
    }
}

/// Where an [`ApiError`] originated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The request never produced a response (connect failure, timeout, ...)
    Transport,
    /// The response body was not a JSON object
    Parse,
    /// The API answered with an `error_id`
    Remote,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::Parse => write!(f, "parse"),
            ApiErrorKind::Remote => write!(f, "api"),
        }
    }
}

/// The `error_id` of a failed call.
///
/// The API reports numeric ids; transport and parse failures carry their error
/// text instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorId {
    Code(i64),
    Text(String),
}

impl ErrorId {
    /// Build an id from the raw `error_id` field of a response
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map_or_else(|| ErrorId::Text(n.to_string()), ErrorId::Code),
            Value::String(s) => s
                .parse()
                .map_or_else(|_| ErrorId::Text(s.clone()), ErrorId::Code),
            other => ErrorId::Text(other.to_string()),
        }
    }

    /// The numeric code, when the id is one
    pub fn code(&self) -> Option<i64> {
        match self {
            ErrorId::Code(code) => Some(*code),
            ErrorId::Text(_) => None,
        }
    }
}

impl fmt::Display for ErrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorId::Code(code) => write!(f, "{code}"),
            ErrorId::Text(text) => write!(f, "{text}"),
        }
    }
}

/// An error raised while calling the API.
///
/// Field names follow the API's error object: `error_id`, `error_name` and
/// `error_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The URL that was called
    pub url: String,
    /// Where the failure came from
    pub kind: ApiErrorKind,
    /// Numeric error code reported by the API
    pub error_id: ErrorId,
    /// Short machine-readable error name (e.g. `throttle_violation`)
    pub error_name: String,
    /// Human-readable description
    pub error_message: String,
}

impl ApiError {
    /// An error the API reported in a response body
    pub fn remote(
        url: impl Into<String>,
        error_id: ErrorId,
        error_name: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            kind: ApiErrorKind::Remote,
            error_id,
            error_name: error_name.into(),
            error_message: error_message.into(),
        }
    }

    /// A failure to reach the server; the text fills every error field
    pub fn transport(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self::from_text(url, ApiErrorKind::Transport, text.into())
    }

    /// A failure to decode the response; the text fills every error field
    pub fn parse(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self::from_text(url, ApiErrorKind::Parse, text.into())
    }

    fn from_text(url: impl Into<String>, kind: ApiErrorKind, text: String) -> Self {
        Self {
            url: url.into(),
            kind,
            error_id: ErrorId::Text(text.clone()),
            error_name: text.clone(),
            error_message: text,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ApiErrorKind::Remote => write!(
                f,
                "API error {} ({}) at {}: {}",
                self.error_id, self.error_name, self.url, self.error_message
            ),
            kind => write!(f, "{kind} error at {}: {}", self.url, self.error_message),
        }
    }
}

impl std::error::Error for ApiError {}

/// Result type alias for stackapi
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
