//! Content configuration
//!
//! Loaded from a JSON file; every field has a default so the file itself
//! is optional.
//!
//! ```json
//! {
//!   "root": ".",
//!   "schema": "schema.json",
//!   "github": { "owner": "q1b", "repo": "q1b", "branch": "main" }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::schema::site::site_schema;
use crate::schema::{SchemaDeclaration, SchemaRegistry, SchemaResult};
use crate::storage::{github, GitHubConfig, StorageError, StorageResult};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sitecontent.json";

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Working tree served by the local backend (default: ".")
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// JSON schema declaration; the built-in site schema when absent
    #[serde(default)]
    pub schema: Option<PathBuf>,

    /// Remote repository served by the GitHub backend
    #[serde(default)]
    pub github: GitHubSettings,
}

/// Remote repository settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSettings {
    #[serde(default = "default_owner")]
    pub owner: String,

    #[serde(default = "default_repo")]
    pub repo: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Environment variable holding the bearer token (default: "GITHUB_TOKEN")
    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_owner() -> String {
    "q1b".to_string()
}
fn default_repo() -> String {
    "q1b".to_string()
}
fn default_branch() -> String {
    "main".to_string()
}
fn default_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
fn default_timeout_secs() -> u64 {
    github::DEFAULT_TIMEOUT_SECS
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
            branch: default_branch(),
            api_url: default_api_url(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            schema: None,
            github: GitHubSettings::default(),
        }
    }
}

impl ContentConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Explicit path must exist; otherwise the default file is used if present.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: ContentConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let github = &self.github;
        for (name, value) in [
            ("github.owner", &github.owner),
            ("github.repo", &github.repo),
            ("github.branch", &github.branch),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
            }
        }

        Url::parse(&github.api_url).map_err(|e| {
            ConfigError::Invalid(format!("github.api_url '{}': {}", github.api_url, e))
        })?;

        if github.timeout_secs == 0 {
            return Err(ConfigError::Invalid("github.timeout_secs must be > 0".into()));
        }

        Ok(())
    }

    /// Builds the schema registry this configuration points at.
    pub fn load_registry(&self) -> SchemaResult<SchemaRegistry> {
        let declaration = match &self.schema {
            Some(path) => SchemaDeclaration::load(path)?,
            None => site_schema(),
        };
        SchemaRegistry::from_declaration(declaration)
    }
}

impl GitHubSettings {
    /// Backend settings, with the token read from the environment
    pub fn to_backend_config(&self) -> StorageResult<GitHubConfig> {
        let api_url = Url::parse(&self.api_url)
            .map_err(|e| StorageError::Config(format!("github.api_url: {}", e)))?;
        let token = std::env::var(&self.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty());

        Ok(GitHubConfig {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            branch: self.branch.clone(),
            api_url,
            token,
            timeout_secs: self.timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ContentConfig::from_json("{}").unwrap();
        assert_eq!(config.root, PathBuf::from("."));
        assert!(config.schema.is_none());
        assert_eq!(config.github.owner, "q1b");
        assert_eq!(config.github.repo, "q1b");
        assert_eq!(config.github.branch, "main");
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.token_env, "GITHUB_TOKEN");
    }

    #[test]
    fn test_partial_github_section() {
        let config =
            ContentConfig::from_json(r#"{"github": {"branch": "content"}}"#).unwrap();
        assert_eq!(config.github.branch, "content");
        assert_eq!(config.github.owner, "q1b");
    }

    #[test]
    fn test_rejects_empty_repo() {
        let err = ContentConfig::from_json(r#"{"github": {"repo": " "}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_api_url() {
        let err = ContentConfig::from_json(r#"{"github": {"api_url": "not a url"}}"#).unwrap_err();
        assert!(err.to_string().contains("api_url"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            ContentConfig::from_json("{root:"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sitecontent.json");
        fs::write(&path, r#"{"root": "/srv/site"}"#).unwrap();
        let config = ContentConfig::load(&path).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/site"));
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.json");
        assert!(matches!(
            ContentConfig::load_or_default(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_builtin_registry() {
        let registry = ContentConfig::default().load_registry().unwrap();
        assert!(registry.exists("posts"));
        assert!(registry.exists("profile"));
    }
}
