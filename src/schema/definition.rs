//! Collection and singleton definitions
//!
//! A collection is a named set of records sharing one schema, each
//! identified by the slug derived from its `slug_field`. A singleton has
//! exactly one record and no identity.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};
use super::field::{Field, FieldDescriptor, FieldKind};

/// A named set of records sharing one schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDefinition {
    pub name: String,
    #[serde(default)]
    pub label: String,
    /// Storage path pattern; the single `*` stands for the record identity
    pub path: String,
    /// Top-level slug field deriving each record's identity
    pub slug_field: String,
    /// Document field holding the long-form body, for content-typed collections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_field: Option<String>,
    pub fields: Vec<Field>,
}

/// A schema with exactly one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingletonDefinition {
    pub name: String,
    #[serde(default)]
    pub label: String,
    /// Storage path of the single record
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_field: Option<String>,
    pub fields: Vec<Field>,
}

/// Either kind of definition held by the registry
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Collection(CollectionDefinition),
    Singleton(SingletonDefinition),
}

/// How a record's unit is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordFormat {
    /// Structured data only
    Data,
    /// Structured data paired with a long-form document body
    Content,
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Definition::Collection(c) => &c.name,
            Definition::Singleton(s) => &s.name,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Definition::Collection(c) => &c.label,
            Definition::Singleton(s) => &s.label,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Definition::Collection(c) => &c.path,
            Definition::Singleton(s) => &s.path,
        }
    }

    pub fn fields(&self) -> &[Field] {
        match self {
            Definition::Collection(c) => &c.fields,
            Definition::Singleton(s) => &s.fields,
        }
    }

    pub fn content_field(&self) -> Option<&str> {
        match self {
            Definition::Collection(c) => c.content_field.as_deref(),
            Definition::Singleton(s) => s.content_field.as_deref(),
        }
    }

    /// Identity field name; singletons have none
    pub fn slug_field(&self) -> Option<&str> {
        match self {
            Definition::Collection(c) => Some(&c.slug_field),
            Definition::Singleton(_) => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Definition::Collection(_))
    }

    pub fn format(&self) -> RecordFormat {
        if self.content_field().is_some() {
            RecordFormat::Content
        } else {
            RecordFormat::Data
        }
    }

    /// Looks up a top-level field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields()
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.descriptor)
    }

    /// Every relationship in the definition as `(field path, target collection)`
    pub fn relationship_targets(&self) -> Vec<(String, &str)> {
        let mut out = Vec::new();
        for field in self.fields() {
            field.descriptor.relationship_targets(&field.name, &mut out);
        }
        out
    }

    /// Validates the definition itself (not a record).
    ///
    /// Relationship targets are checked by the registry once every
    /// definition is known.
    pub fn validate_structure(&self) -> SchemaResult<()> {
        let name = self.name();
        if name.trim().is_empty() {
            return Err(SchemaError::malformed("<in-memory>", "definition name is empty"));
        }

        let stars = self.path().matches('*').count();
        match self {
            Definition::Collection(_) if stars != 1 => {
                return Err(SchemaError::invalid_field(
                    name,
                    "<path>",
                    format!("collection path '{}' must contain exactly one '*'", self.path()),
                ));
            }
            Definition::Singleton(_) if stars != 0 => {
                return Err(SchemaError::invalid_field(
                    name,
                    "<path>",
                    format!("singleton path '{}' must not contain '*'", self.path()),
                ));
            }
            _ => {}
        }

        check_fields(name, "", self.fields())?;

        if let Some(slug_field) = self.slug_field() {
            match self.field(slug_field) {
                Some(d) if matches!(d.kind, FieldKind::Slug) => {}
                Some(d) => {
                    return Err(SchemaError::invalid_field(
                        name,
                        slug_field,
                        format!("slug field must be of kind 'slug', found '{}'", d.kind.type_name()),
                    ));
                }
                None => {
                    return Err(SchemaError::invalid_field(
                        name,
                        slug_field,
                        "slug field is not declared",
                    ));
                }
            }
        }

        if let Some(content_field) = self.content_field() {
            match self.field(content_field) {
                Some(d) if matches!(d.kind, FieldKind::Document { .. }) => {}
                Some(d) => {
                    return Err(SchemaError::invalid_field(
                        name,
                        content_field,
                        format!(
                            "content field must be of kind 'document', found '{}'",
                            d.kind.type_name()
                        ),
                    ));
                }
                None => {
                    return Err(SchemaError::invalid_field(
                        name,
                        content_field,
                        "content field is not declared",
                    ));
                }
            }
        }

        // A document body is stored outside the data unit, so only the
        // designated content field may be a document.
        for field in self.fields() {
            if matches!(field.descriptor.kind, FieldKind::Document { .. })
                && self.content_field() != Some(field.name.as_str())
            {
                return Err(SchemaError::invalid_field(
                    name,
                    &field.name,
                    "document fields are only allowed as the content field",
                ));
            }
        }

        Ok(())
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn check_fields(schema: &str, prefix: &str, fields: &[Field]) -> SchemaResult<()> {
    let mut seen = HashSet::new();
    for field in fields {
        let path = join(prefix, &field.name);
        if field.name.trim().is_empty() {
            return Err(SchemaError::invalid_field(schema, path, "field name is empty"));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::invalid_field(schema, path, "duplicate field name"));
        }
        check_descriptor(schema, &path, &field.descriptor, !prefix.is_empty())?;
    }
    Ok(())
}

fn check_descriptor(
    schema: &str,
    path: &str,
    descriptor: &FieldDescriptor,
    nested: bool,
) -> SchemaResult<()> {
    match &descriptor.kind {
        FieldKind::Select { options, default } => {
            if options.is_empty() {
                return Err(SchemaError::invalid_field(schema, path, "select has no options"));
            }
            let mut values = HashSet::new();
            for option in options {
                if !values.insert(option.value.as_str()) {
                    return Err(SchemaError::invalid_field(
                        schema,
                        path,
                        format!("duplicate option value '{}'", option.value),
                    ));
                }
            }
            match default {
                Some(d) if !values.contains(d.as_str()) => {
                    return Err(SchemaError::invalid_default(
                        schema,
                        path,
                        format!("'{}' is not one of the options", d),
                    ));
                }
                None if descriptor.is_required() => {
                    return Err(SchemaError::invalid_default(
                        schema,
                        path,
                        "a required select must declare a default",
                    ));
                }
                _ => {}
            }
        }
        FieldKind::Object { fields } => check_fields(schema, path, fields)?,
        FieldKind::Array { item, .. } => {
            check_descriptor(schema, &format!("{}[]", path), item, true)?;
        }
        FieldKind::Conditional {
            discriminant,
            when_true,
            when_false,
        } => {
            if !matches!(discriminant.kind, FieldKind::Boolean { .. }) {
                return Err(SchemaError::invalid_field(
                    schema,
                    path,
                    format!(
                        "conditional discriminant must be 'boolean', found '{}'",
                        discriminant.kind.type_name()
                    ),
                ));
            }
            check_descriptor(schema, &format!("{}.true", path), when_true, true)?;
            check_descriptor(schema, &format!("{}.false", path), when_false, true)?;
        }
        FieldKind::Document { .. } if nested => {
            return Err(SchemaError::invalid_field(
                schema,
                path,
                "document fields are only allowed as the content field",
            ));
        }
        FieldKind::Relationship { collection } if collection.trim().is_empty() => {
            return Err(SchemaError::invalid_field(
                schema,
                path,
                "relationship target collection is empty",
            ));
        }
        FieldKind::Image { public_path, .. } | FieldKind::File { public_path, .. }
            if public_path.is_empty() =>
        {
            return Err(SchemaError::invalid_field(schema, path, "public path is empty"));
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::errors::SchemaErrorCode;
    use crate::schema::fields::{self, field};

    fn tags() -> CollectionDefinition {
        CollectionDefinition {
            name: "tags".into(),
            label: "Tags".into(),
            path: "src/content/tags/*".into(),
            slug_field: "name".into(),
            content_field: None,
            fields: vec![field("name", fields::slug("Name"))],
        }
    }

    #[test]
    fn test_valid_collection() {
        let def = Definition::Collection(tags());
        assert!(def.validate_structure().is_ok());
        assert_eq!(def.format(), RecordFormat::Data);
        assert_eq!(def.slug_field(), Some("name"));
    }

    #[test]
    fn test_slug_field_must_be_slug_kind() {
        let mut c = tags();
        c.fields = vec![field("name", fields::text("Name"))];
        let err = Definition::Collection(c).validate_structure().unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::SiteSchemaInvalidField);
        assert!(err.message().contains("slug"));
    }

    #[test]
    fn test_missing_slug_field() {
        let mut c = tags();
        c.slug_field = "title".into();
        assert!(Definition::Collection(c).validate_structure().is_err());
    }

    #[test]
    fn test_duplicate_nested_field_name() {
        let mut c = tags();
        c.fields.push(field(
            "company",
            fields::object(
                "Company",
                vec![field("name", fields::text("A")), field("name", fields::text("B"))],
            ),
        ));
        let err = Definition::Collection(c).validate_structure().unwrap_err();
        assert_eq!(err.field(), Some("company.name"));
    }

    #[test]
    fn test_select_default_outside_options() {
        let mut c = tags();
        c.fields.push(field(
            "kind",
            fields::select("Kind", &[("A", "a"), ("B", "b")], "c"),
        ));
        let err = Definition::Collection(c).validate_structure().unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::SiteSchemaInvalidDefault);
    }

    #[test]
    fn test_required_select_needs_default() {
        let mut c = tags();
        let mut select = fields::select("Kind", &[("A", "a")], "a");
        if let FieldKind::Select { default, .. } = &mut select.kind {
            *default = None;
        }
        c.fields.push(field("kind", select.clone()));
        assert!(Definition::Collection(c.clone()).validate_structure().is_err());

        c.fields.pop();
        c.fields.push(field("kind", select.optional()));
        assert!(Definition::Collection(c).validate_structure().is_ok());
    }

    #[test]
    fn test_nested_conditional_branches_checked() {
        let bad_inner = fields::conditional(
            "Inner",
            fields::text("Not a flag"),
            fields::empty(),
            fields::empty(),
        );
        let outer = fields::conditional(
            "Outer",
            fields::checkbox("Flag", false),
            fields::empty(),
            bad_inner,
        );
        let mut c = tags();
        c.fields.push(field("end", outer));
        let err = Definition::Collection(c).validate_structure().unwrap_err();
        assert_eq!(err.field(), Some("end.false"));
    }

    #[test]
    fn test_content_field_must_be_document() {
        let mut c = tags();
        c.content_field = Some("body".into());
        c.fields.push(field("body", fields::text("Body")));
        assert!(Definition::Collection(c.clone()).validate_structure().is_err());

        c.fields.pop();
        c.fields.push(field("body", fields::document("Body", Default::default())));
        let def = Definition::Collection(c);
        assert!(def.validate_structure().is_ok());
        assert_eq!(def.format(), RecordFormat::Content);
    }

    #[test]
    fn test_stray_document_field_rejected() {
        let mut c = tags();
        c.fields.push(field("body", fields::document("Body", Default::default())));
        assert!(Definition::Collection(c).validate_structure().is_err());
    }

    #[test]
    fn test_path_patterns() {
        let mut c = tags();
        c.path = "src/content/tags".into();
        assert!(Definition::Collection(c).validate_structure().is_err());

        let s = SingletonDefinition {
            name: "site".into(),
            label: "Site".into(),
            path: "src/content/site/*".into(),
            content_field: None,
            fields: vec![],
        };
        assert!(Definition::Singleton(s).validate_structure().is_err());
    }
}
