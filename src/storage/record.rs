//! Stored record units and their on-disk encoding
//!
//! Data-typed records are a YAML mapping:
//!
//! ```text
//! name: Rust
//! ```
//!
//! Content-typed records carry YAML frontmatter followed by the body:
//!
//! ```text
//! ---
//! title: Hello World
//! tags:
//!   - rust
//! ---
//! Body text...
//! ```
//!
//! Decoding is part of reading. Bytes that cannot be decoded are a
//! storage error and never reach the validator.

use std::fmt;

use serde_json::{Map, Value};

use super::errors::{StorageError, StorageResult};
use crate::schema::RecordFormat;

const FENCE: &str = "---";

/// Address of a stored record inside the content tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordLocator {
    path: String,
    format: RecordFormat,
}

impl RecordLocator {
    /// Locator of a data-typed record
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_format(path, RecordFormat::Data)
    }

    pub fn with_format(path: impl Into<String>, format: RecordFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Relative path using `/` separators
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }
}

impl fmt::Display for RecordLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// A stored record before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// Structured fields
    pub data: Map<String, Value>,
    /// Long-form document body, for content-typed records
    pub body: Option<String>,
}

impl RawRecord {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data, body: None }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Builds a record from a JSON object; non-objects yield empty data
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(data) => Self::new(data),
            _ => Self::default(),
        }
    }
}

/// Serializes a record for the given locator's format.
pub fn encode(locator: &RecordLocator, record: &RawRecord) -> StorageResult<Vec<u8>> {
    let yaml = if record.data.is_empty() {
        String::new()
    } else {
        serde_yaml::to_string(&record.data)
            .map_err(|e| StorageError::encode(locator.path(), e))?
    };

    match locator.format() {
        RecordFormat::Data => Ok(yaml.into_bytes()),
        RecordFormat::Content => {
            let body = record.body.as_deref().unwrap_or_default();
            let mut out = String::with_capacity(yaml.len() + body.len() + 8);
            out.push_str(FENCE);
            out.push('\n');
            out.push_str(&yaml);
            out.push_str(FENCE);
            out.push('\n');
            out.push_str(body);
            Ok(out.into_bytes())
        }
    }
}

/// Parses stored bytes according to the locator's format.
pub fn decode(locator: &RecordLocator, bytes: &[u8]) -> StorageResult<RawRecord> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| StorageError::decode(locator.path(), format!("invalid UTF-8: {}", e)))?;

    match locator.format() {
        RecordFormat::Data => Ok(RawRecord::new(parse_mapping(locator, text)?)),
        RecordFormat::Content => {
            let (frontmatter, body) = split_frontmatter(locator, text)?;
            let data = match frontmatter {
                Some(yaml) => parse_mapping(locator, yaml)?,
                None => Map::new(),
            };
            Ok(RawRecord {
                data,
                body: Some(body.to_string()),
            })
        }
    }
}

/// Splits `---` delimited frontmatter from the body.
///
/// A unit without an opening fence is all body. An opening fence with no
/// closing fence is truncated and fails to decode.
fn split_frontmatter<'a>(
    locator: &RecordLocator,
    text: &'a str,
) -> StorageResult<(Option<&'a str>, &'a str)> {
    let Some(rest) = strip_fence_line(text) else {
        return Ok((None, text));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == FENCE {
            let frontmatter = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((Some(frontmatter), body));
        }
        offset += line.len();
    }

    Err(StorageError::decode(
        locator.path(),
        "frontmatter is not terminated",
    ))
}

fn strip_fence_line(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(FENCE)?;
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

fn parse_mapping(locator: &RecordLocator, yaml: &str) -> StorageResult<Map<String, Value>> {
    if yaml.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value =
        serde_yaml::from_str(yaml).map_err(|e| StorageError::decode(locator.path(), e))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(StorageError::decode(
            locator.path(),
            format!("expected a mapping, found {}", yaml_kind(&other)),
        )),
    }
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content(path: &str) -> RecordLocator {
        RecordLocator::with_format(path, RecordFormat::Content)
    }

    #[test]
    fn test_decode_data_record() {
        let locator = RecordLocator::new("src/content/tags/rust.yaml");
        let record = decode(&locator, b"name: Rust\n").unwrap();
        assert_eq!(record.data["name"], json!("Rust"));
        assert_eq!(record.body, None);
    }

    #[test]
    fn test_decode_frontmatter() {
        let locator = content("src/content/posts/hello.mdoc");
        let text = "---\ntitle: Hello\ntags:\n  - rust\n---\nFirst line\n\n---\nnot a fence\n";
        let record = decode(&locator, text.as_bytes()).unwrap();
        assert_eq!(record.data["title"], json!("Hello"));
        assert_eq!(record.data["tags"], json!(["rust"]));
        assert_eq!(record.body.as_deref(), Some("First line\n\n---\nnot a fence\n"));
    }

    #[test]
    fn test_truncated_frontmatter_fails() {
        let locator = content("src/content/posts/broken.mdoc");
        let err = decode(&locator, b"---\ntitle: Hello\n").unwrap_err();
        assert!(matches!(err, StorageError::Decode { .. }));
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let locator = RecordLocator::new("a.yaml");
        let err = decode(&locator, &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, StorageError::Decode { .. }));
    }

    #[test]
    fn test_non_mapping_fails() {
        let locator = RecordLocator::new("a.yaml");
        let err = decode(&locator, b"- one\n- two\n").unwrap_err();
        assert!(err.to_string().contains("expected a mapping"));
    }

    #[test]
    fn test_missing_frontmatter_is_body() {
        let locator = content("a.mdoc");
        let record = decode(&locator, b"just text").unwrap();
        assert!(record.data.is_empty());
        assert_eq!(record.body.as_deref(), Some("just text"));
    }

    #[test]
    fn test_content_round_trip() {
        let locator = content("src/content/posts/hello.mdoc");
        let record = RawRecord::from_json(json!({ "title": "Hello", "draft": false }))
            .with_body("# Heading\n\nText\n");
        let bytes = encode(&locator, &record).unwrap();
        assert!(bytes.starts_with(b"---\n"));
        assert_eq!(decode(&locator, &bytes).unwrap(), record);
    }

    #[test]
    fn test_empty_body_round_trip() {
        let locator = content("a.mdoc");
        let record = RawRecord::from_json(json!({ "title": "A" })).with_body("");
        let bytes = encode(&locator, &record).unwrap();
        assert_eq!(decode(&locator, &bytes).unwrap(), record);
    }
}
