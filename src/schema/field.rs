//! Field descriptor definitions
//!
//! A descriptor is a closed tagged variant: each kind carries only the
//! settings relevant to it, so an image field can never acquire a select
//! option set.
//!
//! Supported kinds:
//! - text, multiline-text: UTF-8 string
//! - slug: human label from which a record identity is derived
//! - boolean: true/false with optional default
//! - date: ISO 8601 calendar date, default may be "today"
//! - url: absolute URL
//! - select: one value out of a closed option set
//! - image, file: asset reference (stored file name + public path)
//! - object: ordered named children
//! - array: ordered elements of one child descriptor
//! - relationship: identity of a record in another collection
//! - conditional: boolean discriminant choosing between two descriptors
//! - document: long-form rich text body
//! - empty: no value (used as a conditional branch)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named field inside an object or a definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Key of the value in the stored record
    pub name: String,
    #[serde(flatten)]
    pub descriptor: FieldDescriptor,
}

impl Field {
    pub fn new(name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
        }
    }
}

/// Shape, constraints and default of one value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Human-readable label shown by editing surfaces
    #[serde(default)]
    pub label: String,
    /// Whether the value may be absent
    #[serde(default)]
    pub optional: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Declared default for a date field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DateDefault {
    /// Current date at validation time
    Today,
    /// A fixed calendar date
    Value { date: NaiveDate },
}

/// One entry of a select option set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Formatting toggles of a rich document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentFeatures {
    pub formatting: bool,
    pub links: bool,
    pub images: bool,
    pub tables: bool,
    pub dividers: bool,
}

impl DocumentFeatures {
    /// Every toggle enabled
    pub fn all() -> Self {
        Self {
            formatting: true,
            links: true,
            images: true,
            tables: true,
            dividers: true,
        }
    }
}

/// How an array element is labelled in listings and editors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemLabel {
    /// "Item 1", "Item 2", ...
    #[default]
    Index,
    /// The element's own text, or `fallback` when it has none
    Value { fallback: String },
    /// `{name}` placeholders replaced by the element's object fields
    Template { template: String },
}

/// Kind-specific part of a descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    MultilineText,
    Slug,
    Boolean {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<bool>,
    },
    Date {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<DateDefault>,
    },
    Url,
    Select {
        options: Vec<SelectOption>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    Image {
        /// Working-tree directory holding the asset
        directory: String,
        /// URL prefix the asset is served under
        public_path: String,
    },
    File {
        directory: String,
        public_path: String,
    },
    Object {
        fields: Vec<Field>,
    },
    Array {
        item: Box<FieldDescriptor>,
        #[serde(default)]
        item_label: ItemLabel,
        #[serde(default)]
        min_items: usize,
    },
    Relationship {
        /// Name of the target collection
        collection: String,
    },
    Conditional {
        /// Must be a boolean descriptor
        discriminant: Box<FieldDescriptor>,
        when_true: Box<FieldDescriptor>,
        when_false: Box<FieldDescriptor>,
    },
    Document {
        #[serde(default)]
        features: DocumentFeatures,
    },
    Empty,
}

impl FieldKind {
    /// Returns the kind name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::MultilineText => "multiline-text",
            FieldKind::Slug => "slug",
            FieldKind::Boolean { .. } => "boolean",
            FieldKind::Date { .. } => "date",
            FieldKind::Url => "url",
            FieldKind::Select { .. } => "select",
            FieldKind::Image { .. } => "image",
            FieldKind::File { .. } => "file",
            FieldKind::Object { .. } => "object",
            FieldKind::Array { .. } => "array",
            FieldKind::Relationship { .. } => "relationship",
            FieldKind::Conditional { .. } => "conditional",
            FieldKind::Document { .. } => "document",
            FieldKind::Empty => "empty",
        }
    }
}

impl FieldDescriptor {
    pub fn new(label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            label: label.into(),
            optional: false,
            kind,
        }
    }

    /// Marks the descriptor as optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Whether an absent value is a violation
    pub fn is_required(&self) -> bool {
        !self.optional
    }

    /// Returns the declared default as a raw value, if any.
    ///
    /// `today` resolves a `today` date default; callers pass the injected
    /// clock's reading so validation stays deterministic.
    pub fn default_value(&self, today: NaiveDate) -> Option<Value> {
        match &self.kind {
            FieldKind::Boolean { default } => default.map(Value::Bool),
            FieldKind::Date { default } => default.as_ref().map(|d| match d {
                DateDefault::Today => Value::String(today.format("%Y-%m-%d").to_string()),
                DateDefault::Value { date } => Value::String(date.format("%Y-%m-%d").to_string()),
            }),
            FieldKind::Select { default, .. } => default.clone().map(Value::String),
            FieldKind::Conditional { discriminant, .. } => {
                let flag = discriminant
                    .default_value(today)
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                Some(serde_json::json!({ "discriminant": flag }))
            }
            _ => None,
        }
    }

    /// Returns the child descriptors a composite kind delegates to, in order.
    ///
    /// Array items are named `[]`; conditional parts are named
    /// `discriminant`, `true` and `false`.
    pub fn children(&self) -> Vec<(&str, &FieldDescriptor)> {
        match &self.kind {
            FieldKind::Object { fields } => fields
                .iter()
                .map(|f| (f.name.as_str(), &f.descriptor))
                .collect(),
            FieldKind::Array { item, .. } => vec![("[]", item.as_ref())],
            FieldKind::Conditional {
                discriminant,
                when_true,
                when_false,
            } => vec![
                ("discriminant", discriminant.as_ref()),
                ("true", when_true.as_ref()),
                ("false", when_false.as_ref()),
            ],
            _ => Vec::new(),
        }
    }

    /// Collects the target collection of every relationship reachable from
    /// this descriptor, paired with the dotted path it was found at.
    pub fn relationship_targets<'a>(&'a self, path: &str, out: &mut Vec<(String, &'a str)>) {
        if let FieldKind::Relationship { collection } = &self.kind {
            out.push((path.to_string(), collection.as_str()));
        }
        for (name, child) in self.children() {
            let child_path = if name == "[]" {
                format!("{}[]", path)
            } else {
                format!("{}.{}", path, name)
            };
            child.relationship_targets(&child_path, out);
        }
    }
}

impl ItemLabel {
    /// Renders the label of the element at `index` (zero based).
    ///
    /// `text_of` resolves a field name (or `""` for the element itself) to
    /// its display text.
    pub fn render<F>(&self, index: usize, text_of: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            ItemLabel::Index => format!("Item {}", index + 1),
            ItemLabel::Value { fallback } => text_of("")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| fallback.clone()),
            ItemLabel::Template { template } => render_template(template, text_of),
        }
    }
}

fn render_template<F>(template: &str, text_of: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                out.push_str(&text_of(name).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_type_names() {
        assert_eq!(FieldKind::Text.type_name(), "text");
        assert_eq!(FieldKind::MultilineText.type_name(), "multiline-text");
        assert_eq!(
            FieldKind::Relationship {
                collection: "tags".into()
            }
            .type_name(),
            "relationship"
        );
        assert_eq!(FieldKind::Empty.type_name(), "empty");
    }

    #[test]
    fn test_today_default_uses_supplied_date() {
        let field = FieldDescriptor::new(
            "Published",
            FieldKind::Date {
                default: Some(DateDefault::Today),
            },
        );
        assert_eq!(
            field.default_value(date(2024, 3, 9)),
            Some(Value::String("2024-03-09".into()))
        );
        assert_eq!(
            field.default_value(date(2025, 1, 1)),
            Some(Value::String("2025-01-01".into()))
        );
    }

    #[test]
    fn test_no_default_for_text() {
        let field = FieldDescriptor::new("Title", FieldKind::Text);
        assert_eq!(field.default_value(date(2024, 1, 1)), None);
    }

    #[test]
    fn test_conditional_default_uses_discriminant_default() {
        let field = FieldDescriptor::new(
            "End",
            FieldKind::Conditional {
                discriminant: Box::new(FieldDescriptor::new(
                    "Current",
                    FieldKind::Boolean {
                        default: Some(true),
                    },
                )),
                when_true: Box::new(FieldDescriptor::new("", FieldKind::Empty)),
                when_false: Box::new(FieldDescriptor::new("End", FieldKind::Date { default: None })),
            },
        );
        assert_eq!(
            field.default_value(date(2024, 1, 1)),
            Some(serde_json::json!({ "discriminant": true }))
        );
    }

    #[test]
    fn test_deserialize_tagged_kind() {
        let json = serde_json::json!({
            "name": "employment_type",
            "label": "Employment Type",
            "kind": "select",
            "options": [{ "label": "Full time", "value": "full-time" }],
            "default": "full-time"
        });
        let field: Field = serde_json::from_value(json).unwrap();
        assert_eq!(field.name, "employment_type");
        assert!(field.descriptor.is_required());
        match field.descriptor.kind {
            FieldKind::Select { options, default } => {
                assert_eq!(options.len(), 1);
                assert_eq!(default.as_deref(), Some("full-time"));
            }
            other => panic!("unexpected kind {}", other.type_name()),
        }
    }

    #[test]
    fn test_relationship_targets_found_in_arrays() {
        let field = FieldDescriptor::new(
            "Tags",
            FieldKind::Array {
                item: Box::new(FieldDescriptor::new(
                    "Tag",
                    FieldKind::Relationship {
                        collection: "tags".into(),
                    },
                )),
                item_label: ItemLabel::default(),
                min_items: 0,
            },
        );
        let mut out = Vec::new();
        field.relationship_targets("tags", &mut out);
        assert_eq!(out, vec![("tags[]".to_string(), "tags")]);
    }

    #[test]
    fn test_item_label_template() {
        let label = ItemLabel::Template {
            template: "{platform} | {label}".into(),
        };
        let rendered = label.render(0, |name| match name {
            "platform" => Some("GitHub".into()),
            "label" => Some("q1b".into()),
            _ => None,
        });
        assert_eq!(rendered, "GitHub | q1b");
    }

    #[test]
    fn test_item_label_value_fallback() {
        let label = ItemLabel::Value {
            fallback: "Please select".into(),
        };
        assert_eq!(label.render(0, |_| None), "Please select");
        assert_eq!(label.render(0, |_| Some("design".into())), "design");
        assert_eq!(ItemLabel::Index.render(2, |_| None), "Item 3");
    }
}
