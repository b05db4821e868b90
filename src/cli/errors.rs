//! CLI-specific error types
//!
//! Every failure maps to a stable code printed in the JSON error object.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::content::ContentError;
use crate::schema::SchemaError;
use crate::storage::StorageError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// Schema declaration or lookup error
    SchemaError,
    /// Storage backend failure
    StorageError,
    /// Requested record does not exist or is invalid
    NotFound,
    /// Stored or submitted content failed validation
    InvalidContent,
    /// Content check found problems
    CheckFailed,
    /// I/O error (stdout)
    IoError,
    /// Async runtime could not start
    RuntimeError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "SITE_CLI_CONFIG_ERROR",
            Self::SchemaError => "SITE_CLI_SCHEMA_ERROR",
            Self::StorageError => "SITE_CLI_STORAGE_ERROR",
            Self::NotFound => "SITE_CLI_NOT_FOUND",
            Self::InvalidContent => "SITE_CLI_INVALID_CONTENT",
            Self::CheckFailed => "SITE_CLI_CHECK_FAILED",
            Self::IoError => "SITE_CLI_IO_ERROR",
            Self::RuntimeError => "SITE_CLI_RUNTIME_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
    details: Option<serde_json::Value>,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach structured data printed alongside the message
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Check found rejected records or missing singletons
    pub fn check_failed(problems: usize) -> Self {
        Self::new(
            CliErrorCode::CheckFailed,
            format!("{} content problem(s) found", problems),
        )
    }

    /// Runtime error
    pub fn runtime_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::RuntimeError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&serde_json::Value> {
        self.details.as_ref()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::new(CliErrorCode::SchemaError, e.to_string())
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Config(msg) => Self::config_error(msg),
            StorageError::NotFound(path) => {
                Self::new(CliErrorCode::NotFound, format!("not found: {}", path))
            }
            other => Self::new(CliErrorCode::StorageError, other.to_string()),
        }
    }
}

impl From<ContentError> for CliError {
    fn from(e: ContentError) -> Self {
        match e {
            ContentError::Schema(e) => e.into(),
            ContentError::Storage(e) => e.into(),
            e @ (ContentError::NotFound { .. } | ContentError::SingletonMissing(_)) => {
                Self::new(CliErrorCode::NotFound, e.to_string())
            }
            e @ (ContentError::Invalid { .. } | ContentError::Rejected { .. }) => {
                Self::new(CliErrorCode::InvalidContent, e.to_string())
            }
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
