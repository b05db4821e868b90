//! Per-record validation violations
//!
//! Violations are data errors: the offending record is excluded from
//! consumer-facing results and reported with its field path and reason.
//! A validation pass always enumerates every violation it finds.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a value inside a record, e.g. `company.name` or `tags[0]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The record itself
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self(segments)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "$root");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Why a value was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViolationKind {
    #[error("required field is missing")]
    Missing,

    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("\"{value}\" is not a valid ISO 8601 calendar date")]
    InvalidDate { value: String },

    #[error("\"{value}\" is not a valid URL")]
    InvalidUrl { value: String },

    #[error("\"{value}\" is not one of the allowed options [{}]", .options.join(", "))]
    UnknownOption { value: String, options: Vec<String> },

    #[error("asset reference is empty")]
    EmptyAsset,

    #[error("\"{label}\" does not produce a usable slug")]
    EmptySlug { label: String },

    #[error("slug \"{identity}\" is already used by {existing}")]
    SlugCollision { identity: String, existing: String },

    #[error("reference is empty")]
    EmptyReference,

    #[error("unresolved reference \"{identity}\" in collection \"{collection}\"")]
    UnresolvedReference { identity: String, collection: String },

    #[error("expected at least {min} items, got {actual}")]
    TooFewItems { min: usize, actual: usize },

    #[error("document body is missing")]
    MissingBody,
}

/// A single violation: where and why
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {kind}")]
pub struct Violation {
    pub path: FieldPath,
    pub kind: ViolationKind,
}

impl Violation {
    pub fn new(path: FieldPath, kind: ViolationKind) -> Self {
        Self { path, kind }
    }
}

impl Serialize for Violation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Violation", 2)?;
        s.serialize_field("path", &self.path)?;
        s.serialize_field("reason", &self.kind.to_string())?;
        s.end()
    }
}

/// Every violation found for one record, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ViolationList(Vec<Violation>);

impl ViolationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: FieldPath, kind: ViolationKind) {
        self.0.push(Violation::new(path, kind));
    }

    pub fn extend(&mut self, other: ViolationList) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    /// `Ok(value)` when no violations were recorded
    pub fn into_result<T>(self, value: T) -> Result<T, ViolationList> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for ViolationList {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ViolationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ViolationList {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_display() {
        let path = FieldPath::root().key("documents").index(1).key("document");
        assert_eq!(path.to_string(), "documents[1].document");
        assert_eq!(FieldPath::root().to_string(), "$root");
        assert_eq!(FieldPath::root().key("tags").index(0).to_string(), "tags[0]");
    }

    #[test]
    fn test_unresolved_reference_message() {
        let violation = Violation::new(
            FieldPath::root().key("tags").index(0),
            ViolationKind::UnresolvedReference {
                identity: "nonexistent".into(),
                collection: "tags".into(),
            },
        );
        assert_eq!(
            violation.to_string(),
            "tags[0]: unresolved reference \"nonexistent\" in collection \"tags\""
        );
    }

    #[test]
    fn test_unknown_option_names_value() {
        let kind = ViolationKind::UnknownOption {
            value: "contractor".into(),
            options: vec!["full-time".into(), "freelance".into()],
        };
        let message = kind.to_string();
        assert!(message.contains("\"contractor\""));
        assert!(message.contains("full-time, freelance"));
    }

    #[test]
    fn test_list_into_result() {
        let empty = ViolationList::new();
        assert_eq!(empty.into_result(5), Ok(5));

        let mut list = ViolationList::new();
        list.push(FieldPath::root().key("title"), ViolationKind::Missing);
        list.push(FieldPath::root().key("body"), ViolationKind::MissingBody);
        let err = list.into_result(()).unwrap_err();
        assert_eq!(err.len(), 2);
        assert_eq!(
            err.to_string(),
            "title: required field is missing; body: document body is missing"
        );
    }

    #[test]
    fn test_serialize_as_path_and_reason() {
        let mut list = ViolationList::new();
        list.push(FieldPath::root().key("title"), ViolationKind::Missing);
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "path": "title", "reason": "required field is missing" }])
        );
    }
}
