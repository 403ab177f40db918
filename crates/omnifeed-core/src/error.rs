//! Error types for the OmniFeed telemetry bridge.
//!
//! Every failure a feed can hit is described here, from provider connection
//! problems to configuration mistakes. The supervisor treats all runtime
//! errors as recoverable; only startup errors end the process.

use std::io;
use thiserror::Error;

/// Result type alias using OmniFeedError as the error type.
pub type Result<T> = std::result::Result<T, OmniFeedError>;

/// Top-level error type for all OmniFeed operations.
#[derive(Debug, Error)]
pub enum OmniFeedError {
    /// Connection-related errors
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Parsing and deserialization errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(#[from] TimeoutError),
}

impl OmniFeedError {
    /// Returns true if a retry after the backoff delay may succeed.
    ///
    /// Configuration errors are the only ones a retry cannot fix.
    pub fn is_transient(&self) -> bool {
        match self {
            OmniFeedError::Connection(e) => !e.is_permanent(),
            OmniFeedError::Config(_) => false,
            _ => true,
        }
    }
}

/// Errors related to provider connections.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Failed to establish a connection
    #[error("Failed to connect to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// Connection was closed by the remote end
    #[error("Connection closed: {reason}")]
    ConnectionClosed { reason: String },

    /// Subscription handshake was rejected or could not be sent
    #[error("Subscription handshake failed: {reason}")]
    HandshakeFailed { reason: String },

    /// Request reached the provider but the exchange failed
    #[error("Request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    /// Authentication failed
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    /// Connection is not established
    #[error("Not connected")]
    NotConnected,
}

impl ConnectionError {
    /// Creates a connection failed error.
    pub fn failed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates a connection closed error.
    pub fn closed(reason: impl Into<String>) -> Self {
        Self::ConnectionClosed {
            reason: reason.into(),
        }
    }

    /// Creates a request failed error.
    pub fn request_failed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ConnectionError::ConnectionFailed { .. }
                | ConnectionError::ConnectionClosed { .. }
                | ConnectionError::RequestFailed { .. }
                | ConnectionError::NotConnected
        )
    }

    /// Returns true if this error is permanent and retrying won't help.
    pub fn is_permanent(&self) -> bool {
        matches!(self, ConnectionError::AuthenticationFailed { .. })
    }
}

/// Errors related to parsing provider payloads and user input.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to parse JSON data
    #[error("JSON parse error at line {line}, column {column}: {message}")]
    JsonError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Invalid data format
    #[error("Invalid data format: expected {expected}, got {actual}")]
    InvalidFormat { expected: String, actual: String },

    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Invalid field value
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ParseError {
    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InvalidFormat {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for OmniFeedError {
    fn from(err: serde_json::Error) -> Self {
        OmniFeedError::Parse(err.into())
    }
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {reason}")]
    InvalidFormat { reason: String },

    /// Missing required configuration field
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// Invalid filter token
    #[error("Invalid filter rule: {reason}")]
    InvalidFilterRule { reason: String },
}

impl ConfigError {
    /// Creates a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Wrapper for I/O errors that keeps the kind alongside the message.
#[derive(Debug, Error)]
#[error("I/O error: {kind:?}: {message}")]
pub struct IoError {
    pub kind: io::ErrorKind,
    pub message: String,
}

impl From<io::Error> for IoError {
    fn from(err: io::Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<io::Error> for OmniFeedError {
    fn from(err: io::Error) -> Self {
        OmniFeedError::Io(err.into())
    }
}

/// Timeout errors for provider operations.
#[derive(Debug, Error)]
pub enum TimeoutError {
    /// Operation timed out
    #[error("Operation timed out after {timeout_secs}s: {operation}")]
    OperationTimeout {
        operation: String,
        timeout_secs: u64,
    },

    /// No message arrived within the idle window
    #[error("No data received for {timeout_secs}s")]
    IdleTimeout { timeout_secs: u64 },

    /// Connection timeout
    #[error("Connection timeout after {timeout_secs}s")]
    ConnectTimeout { timeout_secs: u64 },
}

impl TimeoutError {
    /// Creates an operation timeout error.
    pub fn operation(operation: impl Into<String>, timeout_secs: u64) -> Self {
        Self::OperationTimeout {
            operation: operation.into(),
            timeout_secs,
        }
    }
}
