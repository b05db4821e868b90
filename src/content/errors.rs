//! # Content Access Errors

use thiserror::Error;

use crate::schema::SchemaError;
use crate::storage::StorageError;
use crate::validation::{ValidationError, ViolationList};

/// Result type for content access
pub type ContentResult<T> = Result<T, ContentError>;

/// Errors surfaced to consumers of the content layer
#[derive(Debug, Error)]
pub enum ContentError {
    /// Configuration error; the schema is unusable
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Storage failure; no partial result is returned
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("No valid record \"{identity}\" in collection \"{collection}\"")]
    NotFound { collection: String, identity: String },

    #[error("Singleton \"{0}\" has no stored record")]
    SingletonMissing(String),

    /// Stored record exists but does not validate
    #[error("{locator} is invalid: {violations}")]
    Invalid {
        locator: String,
        violations: ViolationList,
    },

    /// Write refused; nothing was persisted
    #[error("Record rejected: {violations}")]
    Rejected { violations: ViolationList },
}

impl ContentError {
    /// Violations carried by the error, if any
    pub fn violations(&self) -> Option<&ViolationList> {
        match self {
            ContentError::Invalid { violations, .. } | ContentError::Rejected { violations } => {
                Some(violations)
            }
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ContentError::NotFound { .. } | ContentError::SingletonMissing(_)
        )
    }
}

impl From<ValidationError> for ContentError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Schema(e) => ContentError::Schema(e),
            ValidationError::Violations(violations) => ContentError::Rejected { violations },
        }
    }
}
