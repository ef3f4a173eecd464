//! Error types for rowsmith

use thiserror::Error;

/// Result type alias for rowsmith operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for compilation and execution
#[derive(Debug, Error)]
pub enum Error {
    /// Temporal text matches none of the recognized shapes
    #[error("Format error: {0}")]
    Format(String),

    /// Caller violated an operation's contract
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The storage engine rejected a statement
    #[error("Storage error: {0}")]
    Storage(String),

    /// PostgreSQL driver error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// A connection handle was required before any successful initialization
    #[error("Connection not initialized")]
    Uninitialized,

    /// Record decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl Error {
    /// Create a format error
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a format error
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if the storage engine rejected the statement
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Query(_))
    }

    /// Check if this is an uninitialized-connection error
    pub fn is_uninitialized(&self) -> bool {
        matches!(self, Self::Uninitialized)
    }

    /// Parse a tokio_postgres error, keeping constraint details when the server reports them.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            if let Some(constraint) = db_err.constraint() {
                return Self::Storage(format!(
                    "{} ({}): {}",
                    constraint,
                    db_err.code().code(),
                    db_err.message()
                ));
            }
        }
        Self::Query(err)
    }
}
