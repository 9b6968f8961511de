//! Error types for api-util
//!
//! This module defines the error hierarchy for the entire crate.
//! Handlers can return `Result<Response>` directly: `Error` renders itself
//! through the viewer with the status from `Error::status_code`.

use axum::http::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

/// The main error type for api-util
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Invalid settings YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // Query Errors
    // ============================================================================
    #[error("Query on collection '{collection}' failed: {source}")]
    Query {
        collection: String,
        #[source]
        source: QueryError,
    },

    // ============================================================================
    // Request/Response Errors
    // ============================================================================
    #[error("Invalid request body: {message}")]
    Body { message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Logging Errors
    // ============================================================================
    #[error("A global logger has already been installed")]
    LoggerAlreadyInstalled,

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

/// Failures of a single paginated query.
///
/// Callers see these wrapped in [`Error::Query`]; the variants are kept so the
/// underlying cause can be logged and mapped to an HTTP status.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("invalid cursor token '{token}': {source}")]
    InvalidCursor {
        token: String,
        #[source]
        source: bson::oid::Error,
    },

    #[error("{phase} timed out after {timeout_ms}ms")]
    Timeout { phase: QueryPhase, timeout_ms: u64 },

    #[error("query cancelled by the originating request")]
    Cancelled,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to decode document: {message}")]
    Decode { message: String },
}

/// The two independently timed phases of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    /// Submitting the find operation
    Submit,
    /// Draining the result cursor
    Collect,
}

impl std::fmt::Display for QueryPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submit => write!(f, "query submission"),
            Self::Collect => write!(f, "result collection"),
        }
    }
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a query error for a collection
    pub fn query(collection: impl Into<String>, source: QueryError) -> Self {
        Self::Query {
            collection: collection.into(),
            source,
        }
    }

    /// Create a request body error
    pub fn body(message: impl Into<String>) -> Self {
        Self::Body {
            message: message.into(),
        }
    }

    /// The HTTP status a handler should answer with for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Query { source, .. } => match source {
                QueryError::InvalidCursor { .. } => StatusCode::BAD_REQUEST,
                QueryError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Body { .. } | Error::JsonParse(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Result type alias for api-util
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }
}
