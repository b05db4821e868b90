//! Schema declaration loading
//!
//! A declaration enumerates every collection and singleton definition.
//! It is either built in code (see `site::site_schema`) or read from a
//! JSON file at startup. Unreadable or malformed files are FATAL.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::definition::{CollectionDefinition, SingletonDefinition};
use super::errors::{SchemaError, SchemaResult};

/// Every definition consumed by the registry at boot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDeclaration {
    #[serde(default)]
    pub collections: Vec<CollectionDefinition>,
    #[serde(default)]
    pub singletons: Vec<SingletonDefinition>,
}

impl SchemaDeclaration {
    /// Loads a declaration from a JSON file.
    pub fn load(path: &Path) -> SchemaResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        Self::from_json(&content)
            .map_err(|e| SchemaError::malformed(path.display().to_string(), e.message().to_string()))
    }

    /// Parses a declaration from JSON text.
    pub fn from_json(content: &str) -> SchemaResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| SchemaError::malformed("<inline>", format!("Invalid JSON: {}", e)))
    }

    /// Serializes the declaration as pretty JSON.
    pub fn to_json(&self) -> SchemaResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SchemaError::malformed("<in-memory>", format!("Failed to serialize: {}", e)))
    }
}
