//! # Storage Errors

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage backend errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Remote state changed underneath the write; never retried
    #[error("Conflicting update: {0}")]
    Conflict(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// Stored bytes are not a readable record
    #[error("Cannot decode {path}: {reason}")]
    Decode { path: String, reason: String },

    /// The remote could not list a directory completely
    #[error("Listing of {0} is truncated")]
    Truncated(String),

    #[error("Cannot encode {path}: {reason}")]
    Encode { path: String, reason: String },

    #[error("Invalid backend configuration: {0}")]
    Config(String),
}

impl StorageError {
    pub fn decode(path: impl Into<String>, reason: impl ToString) -> Self {
        StorageError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn encode(path: impl Into<String>, reason: impl ToString) -> Self {
        StorageError::Encode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Get HTTP-like status code
    pub fn status_code(&self) -> u16 {
        match self {
            StorageError::NotFound(_) => 404,
            StorageError::Conflict(_) => 409,
            StorageError::InvalidPath(_) => 400,
            StorageError::Io(_) => 500,
            StorageError::Network(_) => 503,
            StorageError::Api { status, .. } => *status,
            StorageError::Decode { .. } => 422,
            StorageError::Truncated(_) => 507,
            StorageError::Encode { .. } => 500,
            StorageError::Config(_) => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}
