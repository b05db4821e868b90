//! # GitHub Repository Backend
//!
//! Reads and writes records through the GitHub contents API of one branch
//! of a remote repository. Each write or delete is a single commit.
//!
//! Conflicts (HTTP 409/422, usually a stale blob sha) surface as
//! `StorageError::Conflict` and are not retried here.
//!
//! The contents API lists at most 1,000 entries per directory. A listing
//! that reaches the cap is redone from the recursive git tree of the
//! branch, and a truncated tree fails the listing.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::backend::StorageBackend;
use super::errors::{StorageError, StorageResult};
use super::StorageKind;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Most entries the contents API returns for one directory
pub const CONTENTS_LISTING_LIMIT: usize = 1000;

/// Connection settings for the GitHub backend
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// API root, `https://api.github.com` for github.com
    pub api_url: Url,
    /// Bearer token passed through verbatim
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl GitHubConfig {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, api_url: Url) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: "main".into(),
            api_url,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Entry of a directory listing
#[derive(Debug, Deserialize)]
struct DirectoryEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Recursive git tree of a branch
#[derive(Debug, Deserialize)]
struct GitTree {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// File metadata and content
#[derive(Debug, Deserialize)]
struct FileContent {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    message: String,
    sha: String,
    branch: &'a str,
}

/// Remote repository storage backend
#[derive(Debug, Clone)]
pub struct GitHubBackend {
    client: reqwest::Client,
    config: GitHubConfig,
}

impl GitHubBackend {
    pub fn new(config: GitHubConfig) -> StorageResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("sitecontent"));
        headers.insert("x-github-api-version", HeaderValue::from_static("2022-11-28"));
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| StorageError::Config("invalid token characters".into()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| StorageError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// `{api}/repos/{owner}/{repo}/{section...}/{path}`
    fn repo_url(&self, section: &[&str], path: &str) -> StorageResult<Url> {
        let mut url = self.config.api_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                StorageError::Config(format!("{} cannot be a base URL", self.config.api_url))
            })?;
            segments.pop_if_empty().extend([
                "repos",
                self.config.owner.as_str(),
                self.config.repo.as_str(),
            ]);
            segments.extend(section);
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    fn contents_url(&self, path: &str) -> StorageResult<Url> {
        self.repo_url(&["contents"], path)
    }

    /// Files directly under `directory`, read from the branch's git tree
    async fn list_tree(&self, directory: &str) -> StorageResult<Vec<String>> {
        let mut url = self.repo_url(&["git", "trees"], &self.config.branch)?;
        url.query_pairs_mut().append_pair("recursive", "1");
        debug!(%url, "github tree");
        let tree: GitTree = self
            .send(self.client.get(url), directory)
            .await?
            .json()
            .await
            .map_err(|e| StorageError::decode(directory, e))?;
        if tree.truncated {
            return Err(StorageError::Truncated(directory.to_string()));
        }

        let prefix = format!("{}/", directory.trim_end_matches('/'));
        let mut paths: Vec<_> = tree
            .tree
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .filter(|entry| {
                entry
                    .path
                    .strip_prefix(&prefix)
                    .is_some_and(|name| !name.contains('/'))
            })
            .map(|entry| entry.path)
            .collect();
        paths.sort();
        Ok(paths)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> StorageResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| StorageError::Network(format!("{path}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => StorageError::NotFound(path.to_string()),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                StorageError::Conflict(format!("{path}: {body}"))
            }
            _ => StorageError::Api {
                status: status.as_u16(),
                body,
            },
        })
    }

    async fn get(&self, path: &str) -> StorageResult<reqwest::Response> {
        let mut url = self.contents_url(path)?;
        url.query_pairs_mut().append_pair("ref", &self.config.branch);
        debug!(%url, "github get");
        self.send(self.client.get(url), path).await
    }

    async fn file(&self, path: &str) -> StorageResult<FileContent> {
        self.get(path)
            .await?
            .json::<FileContent>()
            .await
            .map_err(|e| StorageError::decode(path, e))
    }

    /// Current blob sha, `None` when the file does not exist yet
    async fn current_sha(&self, path: &str) -> StorageResult<Option<String>> {
        match self.file(path).await {
            Ok(file) => Ok(Some(file.sha)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl StorageBackend for GitHubBackend {
    fn kind(&self) -> StorageKind {
        StorageKind::GitHub
    }

    async fn list_dir(&self, directory: &str) -> StorageResult<Vec<String>> {
        let response = match self.get(directory).await {
            Ok(response) => response,
            Err(StorageError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let entries: Vec<DirectoryEntry> = response
            .json()
            .await
            .map_err(|e| StorageError::decode(directory, e))?;
        if entries.len() >= CONTENTS_LISTING_LIMIT {
            warn!(directory, entries = entries.len(), "contents listing at its cap");
            return self.list_tree(directory).await;
        }

        let mut paths: Vec<_> = entries
            .into_iter()
            .filter(|entry| entry.kind == "file")
            .map(|entry| entry.path)
            .collect();
        paths.sort();
        Ok(paths)
    }

    async fn read_bytes(&self, path: &str) -> StorageResult<Vec<u8>> {
        let file = self.file(path).await?;
        match file.encoding.as_deref() {
            Some("base64") | None => {}
            Some(other) => {
                return Err(StorageError::decode(
                    path,
                    format!("unsupported encoding {other}"),
                ))
            }
        }
        let content: String = file
            .content
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD
            .decode(content)
            .map_err(|e| StorageError::decode(path, e))
    }

    async fn write_bytes(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let sha = self.current_sha(path).await?;
        let message = match sha {
            Some(_) => format!("Update {path}"),
            None => format!("Create {path}"),
        };
        let body = PutRequest {
            message,
            content: STANDARD.encode(data),
            branch: &self.config.branch,
            sha,
        };
        let url = self.contents_url(path)?;
        self.send(self.client.put(url).json(&body), path).await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> StorageResult<()> {
        let sha = self
            .current_sha(path)
            .await?
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        let body = DeleteRequest {
            message: format!("Delete {path}"),
            sha,
            branch: &self.config.branch,
        };
        let url = self.contents_url(path)?;
        self.send(self.client.request(Method::DELETE, url).json(&body), path)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(api: &str) -> GitHubBackend {
        let config = GitHubConfig::new("q1b", "q1b", Url::parse(api).unwrap());
        GitHubBackend::new(config).unwrap()
    }

    #[test]
    fn test_contents_url() {
        let url = backend("https://api.github.com")
            .contents_url("src/content/tags")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/q1b/q1b/contents/src/content/tags"
        );
    }

    #[test]
    fn test_contents_url_with_api_prefix() {
        let url = backend("https://ghe.example.com/api/v3/")
            .contents_url("a.yaml")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/q1b/q1b/contents/a.yaml"
        );
    }

    #[test]
    fn test_invalid_token_rejected() {
        let mut config = GitHubConfig::new("q1b", "q1b", Url::parse("https://api.github.com").unwrap());
        config.token = Some("bad\ntoken".into());
        assert!(matches!(
            GitHubBackend::new(config),
            Err(StorageError::Config(_))
        ));
    }
}
