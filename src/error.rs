//! Error types for ferro-locus
//!
//! This module provides the crate-wide error type together with:
//! - Error codes for categorization
//! - A split between locally recoverable validation failures and
//!   provider failures that must be surfaced to the user

use std::fmt;
use thiserror::Error;

use crate::coords::ValidationError;

/// Error codes for categorizing errors
///
/// These codes can be used for programmatic error handling
/// and for documentation lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // Validation errors (E1xxx)
    /// Coordinate is not an integer
    NotANumber = 1001,
    /// Start is not before end
    InvertedRange = 1002,
    /// Start is below the gene minimum
    BelowMinimum = 1003,
    /// End is above the gene maximum
    AboveMaximum = 1004,
    /// Range is wider than the viewer allows
    SpanTooLarge = 1005,

    // Provider errors (E2xxx)
    /// Transport failure or timeout
    NetworkError = 2001,
    /// Provider reported an error
    ProviderError = 2002,
    /// Provider response violates its contract
    MalformedResponse = 2003,
    /// Gene bounds not yet known
    MissingGeneBounds = 2004,
    /// Gene has no identifier
    MissingGeneId = 2005,

    // Analysis errors (E3xxx)
    /// Required analysis field missing
    IncompleteInput = 3001,
    /// Analysis field has the wrong format
    InvalidFormat = 3002,
    /// Scoring backend returned an unknown classification
    UnexpectedClassification = 3003,
    /// Scoring backend returned a score outside `[0, 1]`
    InvalidScore = 3004,

    // IO errors (E9xxx)
    /// File IO error
    IoError = 9001,
    /// JSON parsing error
    JsonError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the error code as a string (e.g., "E1001")
    pub fn as_str(&self) -> String {
        format!("E{:04}", *self as u16)
    }

    /// Get a brief description of this error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::NotANumber => "coordinate is not a number",
            ErrorCode::InvertedRange => "start position is not before end position",
            ErrorCode::BelowMinimum => "start position below gene minimum",
            ErrorCode::AboveMaximum => "end position above gene maximum",
            ErrorCode::SpanTooLarge => "range exceeds maximum view span",
            ErrorCode::NetworkError => "network request failed",
            ErrorCode::ProviderError => "data provider reported an error",
            ErrorCode::MalformedResponse => "malformed provider response",
            ErrorCode::MissingGeneBounds => "gene bounds not available",
            ErrorCode::MissingGeneId => "gene identifier missing",
            ErrorCode::IncompleteInput => "incomplete analysis input",
            ErrorCode::InvalidFormat => "invalid analysis input format",
            ErrorCode::UnexpectedClassification => "unexpected classification",
            ErrorCode::InvalidScore => "score out of range",
            ErrorCode::IoError => "file I/O error",
            ErrorCode::JsonError => "JSON parsing error",
            ErrorCode::ConfigError => "configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for ferro-locus operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocusError {
    /// A user-supplied coordinate range was rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transport failure (connection, timeout, HTTP status)
    #[error("Network error during {operation}: {msg}")]
    Network { operation: String, msg: String },

    /// The provider answered but reported a failure
    #[error("{operation} failed: {msg}")]
    Provider { operation: String, msg: String },

    /// The provider answered with data that breaks its contract
    #[error("Malformed response from {operation}: {msg}")]
    MalformedProviderResponse { operation: String, msg: String },

    /// Gene bounds are required but not loaded yet
    #[error("Gene bounds are not available yet")]
    MissingGeneBounds,

    /// The selected gene has no identifier to look up
    #[error("Gene ID is missing for {symbol}, cannot fetch details")]
    MissingGeneId { symbol: String },

    /// Invalid configuration
    #[error("Configuration error: {msg}")]
    Config { msg: String },

    /// IO error (for file operations)
    #[error("IO error: {msg}")]
    Io { msg: String },

    /// JSON parsing error
    #[error("JSON error: {msg}")]
    Json { msg: String },
}

impl LocusError {
    /// Create a network error for the named operation
    pub fn network(operation: impl Into<String>, msg: impl Into<String>) -> Self {
        LocusError::Network {
            operation: operation.into(),
            msg: msg.into(),
        }
    }

    /// Create a provider error for the named operation
    pub fn provider(operation: impl Into<String>, msg: impl Into<String>) -> Self {
        LocusError::Provider {
            operation: operation.into(),
            msg: msg.into(),
        }
    }

    /// Create a malformed-response error for the named operation
    pub fn malformed(operation: impl Into<String>, msg: impl Into<String>) -> Self {
        LocusError::MalformedProviderResponse {
            operation: operation.into(),
            msg: msg.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            LocusError::Validation(e) => e.code(),
            LocusError::Network { .. } => ErrorCode::NetworkError,
            LocusError::Provider { .. } => ErrorCode::ProviderError,
            LocusError::MalformedProviderResponse { .. } => ErrorCode::MalformedResponse,
            LocusError::MissingGeneBounds => ErrorCode::MissingGeneBounds,
            LocusError::MissingGeneId { .. } => ErrorCode::MissingGeneId,
            LocusError::Config { .. } => ErrorCode::ConfigError,
            LocusError::Io { .. } => ErrorCode::IoError,
            LocusError::Json { .. } => ErrorCode::JsonError,
        }
    }

    /// True for failures of an external data provider
    ///
    /// These are surfaced to the user and can be retried by re-invoking the
    /// same operation.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            LocusError::Network { .. }
                | LocusError::Provider { .. }
                | LocusError::MalformedProviderResponse { .. }
        )
    }
}

impl From<std::io::Error> for LocusError {
    fn from(err: std::io::Error) -> Self {
        LocusError::Io {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LocusError {
    fn from(err: serde_json::Error) -> Self {
        LocusError::Json {
            msg: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for LocusError {
    fn from(err: toml::de::Error) -> Self {
        LocusError::Config {
            msg: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for LocusError {
    fn from(err: toml::ser::Error) -> Self {
        LocusError::Config {
            msg: err.to_string(),
        }
    }
}
