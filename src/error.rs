//! Error types for insights-relay
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! The pagination driver relies on [`Error::is_transient`] to decide whether a
//! failed page attempt is retried at the same cursor or ends the pull.

use serde_json::Value;
use thiserror::Error;

/// The main error type for insights-relay
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Invalid input '{field}': {message}")]
    InvalidInput { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    // ============================================================================
    // Upstream / Page Errors
    // ============================================================================
    #[error("GraphQL query failed: {errors}")]
    UpstreamQuery { errors: Value },

    #[error("Malformed page: {message}")]
    MalformedPage { message: String },

    #[error("Empty page returned at cursor {cursor:?}")]
    EmptyPage { cursor: Option<String> },

    #[error("Max retries ({max_retries}) exceeded: {cause}")]
    MaxRetriesExceeded { max_retries: u32, cause: String },

    #[error("Pull cancelled")]
    Cancelled,

    // ============================================================================
    // Warehouse Errors
    // ============================================================================
    #[error("Warehouse error: {message}")]
    Warehouse { message: String },

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    // ============================================================================
    // Server Errors
    // ============================================================================
    #[error("Server error: {message}")]
    Server { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create an upstream query error from the reported `errors` list
    pub fn upstream_query(errors: Value) -> Self {
        Self::UpstreamQuery { errors }
    }

    /// Create a malformed page error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPage {
            message: message.into(),
        }
    }

    /// Create an empty page error
    pub fn empty_page(cursor: Option<&str>) -> Self {
        Self::EmptyPage {
            cursor: cursor.map(String::from),
        }
    }

    /// Create a max retries error naming the last cause
    pub fn max_retries(max_retries: u32, cause: &Error) -> Self {
        Self::MaxRetriesExceeded {
            max_retries,
            cause: cause.to_string(),
        }
    }

    /// Create a warehouse error
    pub fn warehouse(message: impl Into<String>) -> Self {
        Self::Warehouse {
            message: message.into(),
        }
    }

    /// Create a server error
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    /// Check if this error is expected to clear up on a retry of the same page
    ///
    /// Transport failures, upstream `errors` payloads, malformed pages and
    /// spurious empty pages are transient. Everything else ends the pull.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => !e.is_builder(),
            Error::HttpStatus { .. }
            | Error::UpstreamQuery { .. }
            | Error::MalformedPage { .. }
            | Error::EmptyPage { .. }
            | Error::JsonParse(_) => true,
            _ => false,
        }
    }

    /// Check if this error came from bad caller input or configuration
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Config { .. } | Error::InvalidConfigValue { .. } | Error::InvalidInput { .. }
        )
    }
}

/// Result type alias for insights-relay
pub type Result<T> = std::result::Result<T, Error>;
