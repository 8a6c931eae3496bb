//! Error types for the baremetal client

use thiserror::Error;

/// Core error type for baremetal client operations
#[derive(Error, Debug)]
pub enum BaremetalError {
    /// Unsupported field or filter combination, raised before any request
    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    /// The requested resource does not exist (or a lookup was ambiguous)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid command-line input
    #[error("{0}")]
    Command(String),

    /// Non-success HTTP status reported by the service
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request could not be sent or the connection failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// Response body could not be decoded or had an unexpected shape
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BaremetalError {
    /// Whether this error means the resource is absent, either by lookup
    /// or because the service answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BaremetalError::NotFound(_) | BaremetalError::Http { status: 404, .. }
        )
    }

    /// Shorthand for a [`BaremetalError::Command`] error.
    pub fn command(message: impl Into<String>) -> Self {
        BaremetalError::Command(message.into())
    }
}

/// Result type alias for baremetal client operations
pub type Result<T> = std::result::Result<T, BaremetalError>;

impl From<serde_json::Error> for BaremetalError {
    fn from(err: serde_json::Error) -> Self {
        BaremetalError::Serialization(err.to_string())
    }
}
