//! Normalized values and records
//!
//! A normalized record has passed validation and holds its values in
//! canonical form. It is the only form handed to content consumers.
//! `to_raw` turns it back into the stored shape; validating that shape
//! again yields the same normalized record.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::slug::slugify;
use crate::schema::{Definition, FieldKind};
use crate::storage::{RawRecord, RecordLocator};

/// Identity of a target record in a named collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Reference {
    pub collection: String,
    #[serde(rename = "id")]
    pub identity: String,
}

/// A slug field's human label and the identity derived from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugValue {
    pub name: String,
    pub slug: String,
}

/// Asset reference; the asset's physical existence is never checked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRef {
    /// Stored file name
    pub file: String,
    /// URL the asset is served under
    pub src: String,
}

/// Selected branch of a conditional field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalValue {
    pub discriminant: bool,
    pub value: Box<NormalizedValue>,
}

/// Ordered named values of an object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectValue(Vec<(String, NormalizedValue)>);

impl ObjectValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: NormalizedValue) {
        self.0.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&NormalizedValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NormalizedValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stored shape; absent values are omitted
    pub fn to_raw(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (name, value) in &self.0 {
            if let Some(raw) = value.to_raw() {
                map.insert(name.clone(), raw);
            }
        }
        map
    }
}

impl Serialize for ObjectValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A value in canonical form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedValue {
    /// Optional value not supplied, or an `empty` field
    Absent,
    Text(String),
    Slug(SlugValue),
    Bool(bool),
    Date(NaiveDate),
    Url(String),
    Select(String),
    Asset(AssetRef),
    Object(ObjectValue),
    Array(Vec<NormalizedValue>),
    Reference(Reference),
    Conditional(ConditionalValue),
    /// Opaque long-form body
    Document(String),
}

impl NormalizedValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, NormalizedValue::Absent)
    }

    /// Display text of scalar values, used for item labels
    pub fn as_text(&self) -> Option<String> {
        match self {
            NormalizedValue::Text(s)
            | NormalizedValue::Url(s)
            | NormalizedValue::Select(s)
            | NormalizedValue::Document(s) => Some(s.clone()),
            NormalizedValue::Slug(s) => Some(s.name.clone()),
            NormalizedValue::Bool(b) => Some(b.to_string()),
            NormalizedValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            NormalizedValue::Asset(a) => Some(a.file.clone()),
            NormalizedValue::Reference(r) => Some(r.identity.clone()),
            _ => None,
        }
    }

    /// Stored shape of this value; `None` for absent values.
    ///
    /// Document bodies live outside the data unit and are handled by
    /// `NormalizedRecord::to_raw`.
    pub fn to_raw(&self) -> Option<Value> {
        match self {
            NormalizedValue::Absent | NormalizedValue::Document(_) => None,
            NormalizedValue::Text(s) | NormalizedValue::Url(s) | NormalizedValue::Select(s) => {
                Some(Value::String(s.clone()))
            }
            NormalizedValue::Slug(s) if slugify(&s.name) == s.slug => {
                Some(Value::String(s.name.clone()))
            }
            NormalizedValue::Slug(s) => {
                let mut map = Map::new();
                map.insert("name".into(), Value::String(s.name.clone()));
                map.insert("slug".into(), Value::String(s.slug.clone()));
                Some(Value::Object(map))
            }
            NormalizedValue::Bool(b) => Some(Value::Bool(*b)),
            NormalizedValue::Date(d) => Some(Value::String(d.format("%Y-%m-%d").to_string())),
            NormalizedValue::Asset(a) => Some(Value::String(a.file.clone())),
            NormalizedValue::Object(o) => Some(Value::Object(o.to_raw())),
            NormalizedValue::Array(items) => Some(Value::Array(
                items
                    .iter()
                    .map(|item| item.to_raw().unwrap_or(Value::Null))
                    .collect(),
            )),
            NormalizedValue::Reference(r) => Some(Value::String(r.identity.clone())),
            NormalizedValue::Conditional(c) => {
                let mut map = Map::new();
                map.insert("discriminant".into(), Value::Bool(c.discriminant));
                if let Some(value) = c.value.to_raw() {
                    map.insert("value".into(), value);
                }
                Some(Value::Object(map))
            }
        }
    }
}

/// A record that passed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    /// Collection or singleton name
    pub schema: String,
    /// Derived identity; `None` for singletons
    #[serde(rename = "id", skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(skip)]
    pub locator: Option<RecordLocator>,
    /// Name of the field holding the document body, if any
    #[serde(skip)]
    pub content_field: Option<String>,
    #[serde(rename = "data")]
    pub fields: ObjectValue,
}

impl NormalizedRecord {
    pub fn get(&self, name: &str) -> Option<&NormalizedValue> {
        self.fields.get(name)
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Long-form document body, for content-typed records
    pub fn body(&self) -> Option<&str> {
        let name = self.content_field.as_deref()?;
        match self.fields.get(name)? {
            NormalizedValue::Document(body) => Some(body),
            _ => None,
        }
    }

    /// Display labels of the elements of the top-level array `field`.
    ///
    /// `None` when `field` is not an array of `definition`.
    pub fn item_labels(&self, definition: &Definition, field: &str) -> Option<Vec<String>> {
        let FieldKind::Array { item_label, .. } = &definition.field(field)?.kind else {
            return None;
        };
        let items = match self.get(field) {
            Some(NormalizedValue::Array(items)) => items.as_slice(),
            _ => &[],
        };
        let labels = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item_label.render(index, |name| match (name, item) {
                    ("", item) => item.as_text(),
                    (name, NormalizedValue::Object(object)) => {
                        object.get(name).and_then(NormalizedValue::as_text)
                    }
                    _ => None,
                })
            })
            .collect();
        Some(labels)
    }

    /// Item labels of every top-level array field, keyed by field name
    pub fn labels(&self, definition: &Definition) -> BTreeMap<String, Vec<String>> {
        definition
            .fields()
            .iter()
            .filter_map(|f| Some((f.name.clone(), self.item_labels(definition, &f.name)?)))
            .collect()
    }

    /// Every reference in the record with its field path
    pub fn references(&self) -> Vec<(super::FieldPath, &Reference)> {
        let mut out = Vec::new();
        for (name, value) in self.fields.iter() {
            collect_references(value, super::FieldPath::root().key(name), &mut out);
        }
        out
    }

    /// Stored shape of the record
    pub fn to_raw(&self) -> RawRecord {
        RawRecord {
            data: self.fields.to_raw(),
            body: self.body().map(str::to_string),
        }
    }
}

fn collect_references<'a>(
    value: &'a NormalizedValue,
    path: super::FieldPath,
    out: &mut Vec<(super::FieldPath, &'a Reference)>,
) {
    match value {
        NormalizedValue::Reference(r) => out.push((path, r)),
        NormalizedValue::Object(o) => {
            for (name, child) in o.iter() {
                collect_references(child, path.key(name), out);
            }
        }
        NormalizedValue::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_references(item, path.index(i), out);
            }
        }
        NormalizedValue::Conditional(c) => collect_references(&c.value, path.key("value"), out),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_preserves_order_in_json() {
        let mut object = ObjectValue::new();
        object.push("zeta", NormalizedValue::Text("z".into()));
        object.push("alpha", NormalizedValue::Bool(true));
        let json = serde_json::to_string(&object).unwrap();
        assert_eq!(json, r#"{"zeta":"z","alpha":true}"#);
    }

    #[test]
    fn test_absent_omitted_from_raw() {
        let mut object = ObjectValue::new();
        object.push("image", NormalizedValue::Absent);
        object.push("title", NormalizedValue::Text("t".into()));
        let raw = object.to_raw();
        assert!(!raw.contains_key("image"));
        assert_eq!(raw["title"], Value::String("t".into()));
    }

    #[test]
    fn test_explicit_slug_kept_in_raw() {
        let derived = NormalizedValue::Slug(SlugValue {
            name: "Hello World".into(),
            slug: "hello-world".into(),
        });
        assert_eq!(derived.to_raw(), Some(Value::String("Hello World".into())));

        let explicit = NormalizedValue::Slug(SlugValue {
            name: "Hello World".into(),
            slug: "hi".into(),
        });
        assert_eq!(
            explicit.to_raw(),
            Some(serde_json::json!({ "name": "Hello World", "slug": "hi" }))
        );
    }

    #[test]
    fn test_references_with_paths() {
        let mut fields = ObjectValue::new();
        fields.push(
            "tags",
            NormalizedValue::Array(vec![
                NormalizedValue::Reference(Reference {
                    collection: "tags".into(),
                    identity: "design".into(),
                }),
                NormalizedValue::Reference(Reference {
                    collection: "tags".into(),
                    identity: "rust".into(),
                }),
            ]),
        );
        let record = NormalizedRecord {
            schema: "posts".into(),
            identity: Some("hello".into()),
            locator: None,
            content_field: None,
            fields,
        };
        let refs = record.references();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].0.to_string(), "tags[1]");
        assert_eq!(refs[1].1.identity, "rust");
    }

    #[test]
    fn test_body_split_out_of_raw_data() {
        let mut fields = ObjectValue::new();
        fields.push("title", NormalizedValue::Text("t".into()));
        fields.push("content", NormalizedValue::Document("# Hi".into()));
        let record = NormalizedRecord {
            schema: "posts".into(),
            identity: Some("t".into()),
            locator: None,
            content_field: Some("content".into()),
            fields,
        };
        let raw = record.to_raw();
        assert_eq!(raw.body.as_deref(), Some("# Hi"));
        assert!(!raw.data.contains_key("content"));
    }

    #[test]
    fn test_link_labels_from_template() {
        let mut link = ObjectValue::new();
        link.push("platform", NormalizedValue::Text("GitHub".into()));
        link.push("label", NormalizedValue::Text("q1b".into()));
        link.push("link", NormalizedValue::Url("https://github.com/q1b".into()));
        link.push("me", NormalizedValue::Absent);
        let mut fields = ObjectValue::new();
        fields.push("links", NormalizedValue::Array(vec![NormalizedValue::Object(link)]));
        let record = NormalizedRecord {
            schema: "profile".into(),
            identity: None,
            locator: None,
            content_field: None,
            fields,
        };

        let profile = Definition::Singleton(crate::schema::site::profile());
        assert_eq!(
            record.item_labels(&profile, "links"),
            Some(vec!["GitHub | q1b".to_string()])
        );
        assert_eq!(record.item_labels(&profile, "name"), None);
    }

    #[test]
    fn test_tag_labels_fall_back() {
        let mut fields = ObjectValue::new();
        fields.push("title", NormalizedValue::Text("t".into()));
        fields.push(
            "tags",
            NormalizedValue::Array(vec![
                NormalizedValue::Reference(Reference {
                    collection: "tags".into(),
                    identity: "design".into(),
                }),
                NormalizedValue::Absent,
            ]),
        );
        let record = NormalizedRecord {
            schema: "posts".into(),
            identity: Some("t".into()),
            locator: None,
            content_field: None,
            fields,
        };

        let posts = Definition::Collection(crate::schema::site::posts());
        let labels = record.labels(&posts);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels["tags"], vec!["design", "Please select"]);
    }
}
