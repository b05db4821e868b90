//! Per-descriptor validation
//!
//! Each descriptor validates its own raw value and delegates to its
//! children for composite kinds. Violations are accumulated, never
//! short-circuited, so one pass reports every problem in a record.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use super::slug::slugify;
use super::value::{AssetRef, ConditionalValue, NormalizedValue, ObjectValue, Reference, SlugValue};
use super::violation::{FieldPath, ViolationKind, ViolationList};
use crate::schema::{FieldDescriptor, FieldKind};

impl FieldDescriptor {
    /// Validates a raw value against this descriptor.
    ///
    /// `raw` is `None` (or JSON null) when the value is absent; the declared
    /// default applies in that case. Returns `None` when the value could
    /// not be normalized at all. Composite values come back partially
    /// normalized next to their violations, so references inside a record
    /// that is already invalid are still checked. Failed array elements
    /// keep their index as `Absent`.
    pub fn validate(
        &self,
        raw: Option<&Value>,
        path: &FieldPath,
        today: NaiveDate,
        violations: &mut ViolationList,
    ) -> Option<NormalizedValue> {
        if matches!(self.kind, FieldKind::Empty) {
            return Some(NormalizedValue::Absent);
        }

        let defaulted;
        let raw = match raw.filter(|v| !v.is_null()) {
            Some(value) => value,
            None => match self.default_value(today) {
                Some(value) => {
                    defaulted = value;
                    &defaulted
                }
                None if self.optional => return Some(NormalizedValue::Absent),
                None => {
                    // Composite kinds report once for the whole field
                    let kind = match self.kind {
                        FieldKind::Document { .. } => ViolationKind::MissingBody,
                        _ => ViolationKind::Missing,
                    };
                    violations.push(path.clone(), kind);
                    return None;
                }
            },
        };

        match &self.kind {
            FieldKind::Text | FieldKind::MultilineText => {
                let s = expect_str(raw, path, violations)?;
                Some(NormalizedValue::Text(s.to_string()))
            }
            FieldKind::Slug => self.validate_slug(raw, path, violations),
            FieldKind::Boolean { .. } => match raw.as_bool() {
                Some(b) => Some(NormalizedValue::Bool(b)),
                None => {
                    type_mismatch(raw, "boolean", path, violations);
                    None
                }
            },
            FieldKind::Date { .. } => {
                let s = expect_str(raw, path, violations)?;
                match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
                    Ok(date) => Some(NormalizedValue::Date(date)),
                    Err(_) => {
                        violations.push(
                            path.clone(),
                            ViolationKind::InvalidDate {
                                value: s.to_string(),
                            },
                        );
                        None
                    }
                }
            }
            FieldKind::Url => {
                let s = expect_str(raw, path, violations)?.trim();
                if s.is_empty() {
                    return self.empty_value(path, ViolationKind::Missing, violations);
                }
                match url::Url::parse(s) {
                    Ok(_) => Some(NormalizedValue::Url(s.to_string())),
                    Err(_) => {
                        violations.push(
                            path.clone(),
                            ViolationKind::InvalidUrl {
                                value: s.to_string(),
                            },
                        );
                        None
                    }
                }
            }
            FieldKind::Select { options, .. } => {
                let s = expect_str(raw, path, violations)?;
                if options.iter().any(|o| o.value == s) {
                    Some(NormalizedValue::Select(s.to_string()))
                } else {
                    violations.push(
                        path.clone(),
                        ViolationKind::UnknownOption {
                            value: s.to_string(),
                            options: options.iter().map(|o| o.value.clone()).collect(),
                        },
                    );
                    None
                }
            }
            FieldKind::Image { public_path, .. } | FieldKind::File { public_path, .. } => {
                let s = expect_str(raw, path, violations)?.trim();
                if s.is_empty() {
                    return self.empty_value(path, ViolationKind::EmptyAsset, violations);
                }
                Some(NormalizedValue::Asset(AssetRef {
                    file: s.to_string(),
                    src: public_url(public_path, s),
                }))
            }
            FieldKind::Object { fields } => {
                let object = expect_object(raw, path, violations)?;
                let mut values = ObjectValue::new();
                for field in fields {
                    if let Some(value) = field.descriptor.validate(
                        object.get(&field.name),
                        &path.key(&field.name),
                        today,
                        violations,
                    ) {
                        values.push(field.name.clone(), value);
                    }
                }
                Some(NormalizedValue::Object(values))
            }
            FieldKind::Array {
                item, min_items, ..
            } => {
                let Some(elements) = raw.as_array() else {
                    type_mismatch(raw, "array", path, violations);
                    return None;
                };
                if elements.len() < *min_items {
                    violations.push(
                        path.clone(),
                        ViolationKind::TooFewItems {
                            min: *min_items,
                            actual: elements.len(),
                        },
                    );
                }
                let items: Vec<_> = elements
                    .iter()
                    .enumerate()
                    .map(|(i, element)| {
                        item.validate(Some(element), &path.index(i), today, violations)
                            .unwrap_or(NormalizedValue::Absent)
                    })
                    .collect();
                Some(NormalizedValue::Array(items))
            }
            FieldKind::Relationship { collection } => {
                let s = expect_str(raw, path, violations)?.trim();
                if s.is_empty() {
                    violations.push(path.clone(), ViolationKind::EmptyReference);
                    return None;
                }
                Some(NormalizedValue::Reference(Reference {
                    collection: collection.clone(),
                    identity: s.to_string(),
                }))
            }
            FieldKind::Conditional {
                discriminant,
                when_true,
                when_false,
            } => {
                let object = expect_object(raw, path, violations)?;
                let flag = discriminant.validate(
                    object.get("discriminant"),
                    &path.key("discriminant"),
                    today,
                    violations,
                )?;
                let flag = matches!(flag, NormalizedValue::Bool(true));
                // Only the selected branch is evaluated
                let branch = if flag { when_true } else { when_false };
                let value = branch
                    .validate(object.get("value"), &path.key("value"), today, violations)
                    .unwrap_or(NormalizedValue::Absent);
                Some(NormalizedValue::Conditional(ConditionalValue {
                    discriminant: flag,
                    value: Box::new(value),
                }))
            }
            FieldKind::Document { .. } => {
                let s = expect_str(raw, path, violations)?;
                Some(NormalizedValue::Document(s.to_string()))
            }
            FieldKind::Empty => Some(NormalizedValue::Absent),
        }
    }

    fn validate_slug(
        &self,
        raw: &Value,
        path: &FieldPath,
        violations: &mut ViolationList,
    ) -> Option<NormalizedValue> {
        let (name, explicit) = match raw {
            Value::String(s) => (s.as_str(), None),
            Value::Object(object) => {
                let name = match object.get("name") {
                    Some(Value::String(s)) => s.as_str(),
                    Some(other) => {
                        type_mismatch(other, "string", &path.key("name"), violations);
                        return None;
                    }
                    None => {
                        violations.push(path.key("name"), ViolationKind::Missing);
                        return None;
                    }
                };
                let explicit = match object.get("slug") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s.as_str()),
                    Some(other) => {
                        type_mismatch(other, "string", &path.key("slug"), violations);
                        return None;
                    }
                };
                (name, explicit)
            }
            other => {
                type_mismatch(other, "string", path, violations);
                return None;
            }
        };

        let slug = slugify(explicit.unwrap_or(name));
        if slug.is_empty() {
            violations.push(
                path.clone(),
                ViolationKind::EmptySlug {
                    label: explicit.unwrap_or(name).to_string(),
                },
            );
            return None;
        }
        Some(NormalizedValue::Slug(SlugValue {
            name: name.trim().to_string(),
            slug,
        }))
    }

    /// Empty string supplied: absent when optional, a violation otherwise
    fn empty_value(
        &self,
        path: &FieldPath,
        kind: ViolationKind,
        violations: &mut ViolationList,
    ) -> Option<NormalizedValue> {
        if self.optional {
            Some(NormalizedValue::Absent)
        } else {
            violations.push(path.clone(), kind);
            None
        }
    }
}

/// Joins a public path prefix and a stored file name
fn public_url(public_path: &str, file: &str) -> String {
    if public_path.ends_with('/') {
        format!("{}{}", public_path, file.trim_start_matches('/'))
    } else {
        format!("{}/{}", public_path, file.trim_start_matches('/'))
    }
}

fn expect_str<'v>(
    value: &'v Value,
    path: &FieldPath,
    violations: &mut ViolationList,
) -> Option<&'v str> {
    match value.as_str() {
        Some(s) => Some(s),
        None => {
            type_mismatch(value, "string", path, violations);
            None
        }
    }
}

fn expect_object<'v>(
    value: &'v Value,
    path: &FieldPath,
    violations: &mut ViolationList,
) -> Option<&'v Map<String, Value>> {
    match value.as_object() {
        Some(object) => Some(object),
        None => {
            type_mismatch(value, "object", path, violations);
            None
        }
    }
}

fn type_mismatch(
    actual: &Value,
    expected: &'static str,
    path: &FieldPath,
    violations: &mut ViolationList,
) {
    violations.push(
        path.clone(),
        ViolationKind::TypeMismatch {
            expected,
            actual: json_type_name(actual),
        },
    );
}

/// Returns the JSON type name for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fields::{self, field};
    use crate::schema::ItemLabel;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn run(descriptor: &FieldDescriptor, raw: Option<Value>) -> (Option<NormalizedValue>, ViolationList) {
        let mut violations = ViolationList::new();
        let value = descriptor.validate(raw.as_ref(), &FieldPath::root().key("f"), today(), &mut violations);
        (value, violations)
    }

    #[test]
    fn test_text_requires_string() {
        let (value, v) = run(&fields::text("T"), Some(json!("hello")));
        assert_eq!(value, Some(NormalizedValue::Text("hello".into())));
        assert!(v.is_empty());

        let (value, v) = run(&fields::text("T"), Some(json!(42)));
        assert!(value.is_none());
        assert_eq!(v.to_string(), "f: expected string, got number");
    }

    #[test]
    fn test_missing_required_and_optional() {
        let (_, v) = run(&fields::text("T"), None);
        assert_eq!(v.len(), 1);

        let (value, v) = run(&fields::text("T").optional(), None);
        assert_eq!(value, Some(NormalizedValue::Absent));
        assert!(v.is_empty());

        let (_, v) = run(&fields::text("T"), Some(Value::Null));
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_slug_from_label_and_explicit() {
        let (value, _) = run(&fields::slug("Title"), Some(json!("  My First Post ")));
        assert_eq!(
            value,
            Some(NormalizedValue::Slug(SlugValue {
                name: "My First Post".into(),
                slug: "my-first-post".into()
            }))
        );

        let (value, _) = run(
            &fields::slug("Title"),
            Some(json!({ "name": "My First Post", "slug": "first" })),
        );
        match value {
            Some(NormalizedValue::Slug(s)) => assert_eq!(s.slug, "first"),
            other => panic!("unexpected {:?}", other),
        }

        let (_, v) = run(&fields::slug("Title"), Some(json!("!!!")));
        assert!(matches!(v.iter().next().unwrap().kind, ViolationKind::EmptySlug { .. }));
    }

    #[test]
    fn test_explicit_slug_must_be_string() {
        let (value, v) = run(&fields::slug("Title"), Some(json!({ "name": "X", "slug": 5 })));
        assert!(value.is_none());
        assert_eq!(v.to_string(), "f.slug: expected string, got number");

        let (value, v) = run(&fields::slug("Title"), Some(json!({ "name": "X", "slug": null })));
        assert!(v.is_empty());
        match value {
            Some(NormalizedValue::Slug(s)) => assert_eq!(s.slug, "x"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_boolean_exact() {
        let (_, v) = run(&fields::checkbox("B", false), Some(json!("true")));
        assert_eq!(v.len(), 1);
        let (value, _) = run(&fields::checkbox("B", false), None);
        assert_eq!(value, Some(NormalizedValue::Bool(false)));
    }

    #[test]
    fn test_date_parse_and_today_default() {
        let (value, _) = run(&fields::date("D"), Some(json!("2023-12-31")));
        assert_eq!(
            value,
            Some(NormalizedValue::Date(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()))
        );

        let (_, v) = run(&fields::date("D"), Some(json!("31/12/2023")));
        assert!(matches!(v.iter().next().unwrap().kind, ViolationKind::InvalidDate { .. }));

        let (value, _) = run(&fields::date_today("D"), None);
        assert_eq!(value, Some(NormalizedValue::Date(today())));
    }

    #[test]
    fn test_url() {
        let (value, _) = run(&fields::url("U"), Some(json!("https://q1b.dev")));
        assert_eq!(value, Some(NormalizedValue::Url("https://q1b.dev".into())));

        let (_, v) = run(&fields::url("U"), Some(json!("not a url")));
        assert!(matches!(v.iter().next().unwrap().kind, ViolationKind::InvalidUrl { .. }));

        let (value, v) = run(&fields::url("U").optional(), Some(json!("")));
        assert_eq!(value, Some(NormalizedValue::Absent));
        assert!(v.is_empty());
    }

    #[test]
    fn test_select_unknown_value() {
        let select = fields::select("Employment", &[("Full time", "full-time")], "full-time");
        let (_, v) = run(&select, Some(json!("contractor")));
        assert_eq!(v.len(), 1);
        let message = v.to_string();
        assert!(message.starts_with("f:"));
        assert!(message.contains("contractor"));

        let (value, _) = run(&select, None);
        assert_eq!(value, Some(NormalizedValue::Select("full-time".into())));
    }

    #[test]
    fn test_asset_reference() {
        let image = fields::image("I", "public/og", "/og/");
        let (value, _) = run(&image, Some(json!("cover.png")));
        assert_eq!(
            value,
            Some(NormalizedValue::Asset(AssetRef {
                file: "cover.png".into(),
                src: "/og/cover.png".into()
            }))
        );

        let (_, v) = run(&image, Some(json!("")));
        assert_eq!(v.iter().next().unwrap().kind, ViolationKind::EmptyAsset);

        let (value, v) = run(&image.clone().optional(), Some(json!("")));
        assert_eq!(value, Some(NormalizedValue::Absent));
        assert!(v.is_empty());
    }

    #[test]
    fn test_object_ignores_unknown_keys() {
        let company = fields::object(
            "Company",
            vec![field("name", fields::text("Name")), field("location", fields::text("Location"))],
        );
        let (value, v) = run(
            &company,
            Some(json!({ "name": "Acme", "location": "Remote", "extra": 1 })),
        );
        assert!(v.is_empty());
        match value {
            Some(NormalizedValue::Object(o)) => assert_eq!(o.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_absent_required_object_reports_once() {
        let company = fields::object(
            "Company",
            vec![field("name", fields::text("Name")), field("location", fields::text("Location"))],
        );
        let (_, v) = run(&company, None);
        assert_eq!(v.len(), 1);
        assert_eq!(v.to_string(), "f: required field is missing");
    }

    #[test]
    fn test_object_reports_every_missing_child() {
        let company = fields::object(
            "Company",
            vec![field("name", fields::text("Name")), field("location", fields::text("Location"))],
        );
        let (_, v) = run(&company, Some(json!({})));
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_array_order_and_min_items() {
        let tags = fields::array("Tags", fields::text("Tag"), ItemLabel::Index);
        let (value, _) = run(&tags, Some(json!(["b", "a"])));
        assert_eq!(
            value,
            Some(NormalizedValue::Array(vec![
                NormalizedValue::Text("b".into()),
                NormalizedValue::Text("a".into())
            ]))
        );

        let (value, v) = run(&tags, Some(json!([])));
        assert!(v.is_empty());
        assert_eq!(value, Some(NormalizedValue::Array(vec![])));

        let non_empty = fields::non_empty(tags, 1);
        let (_, v) = run(&non_empty, Some(json!([])));
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_array_element_paths() {
        let tags = fields::array("Tags", fields::text("Tag"), ItemLabel::Index);
        let (_, v) = run(&tags, Some(json!(["ok", 3, false])));
        let paths: Vec<_> = v.iter().map(|x| x.path.to_string()).collect();
        assert_eq!(paths, vec!["f[1]", "f[2]"]);
    }

    #[test]
    fn test_invalid_composites_keep_valid_parts() {
        let tags = fields::array("Tags", fields::relationship("Tag", "tags"), ItemLabel::Index);
        let (value, v) = run(&tags, Some(json!([7, "design"])));
        assert_eq!(v.len(), 1);
        assert_eq!(
            value,
            Some(NormalizedValue::Array(vec![
                NormalizedValue::Absent,
                NormalizedValue::Reference(Reference {
                    collection: "tags".into(),
                    identity: "design".into()
                })
            ]))
        );

        let company = fields::object(
            "Company",
            vec![field("name", fields::text("Name")), field("location", fields::text("Location"))],
        );
        let (value, v) = run(&company, Some(json!({ "name": "Acme" })));
        assert_eq!(v.len(), 1);
        match value {
            Some(NormalizedValue::Object(o)) => {
                assert_eq!(o.get("name"), Some(&NormalizedValue::Text("Acme".into())));
                assert!(o.get("location").is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_relationship_defers_resolution() {
        let rel = fields::relationship("Tag", "tags");
        let (value, v) = run(&rel, Some(json!("anything")));
        assert!(v.is_empty());
        assert_eq!(
            value,
            Some(NormalizedValue::Reference(Reference {
                collection: "tags".into(),
                identity: "anything".into()
            }))
        );

        let (_, v) = run(&rel, Some(json!("")));
        assert_eq!(v.iter().next().unwrap().kind, ViolationKind::EmptyReference);
    }

    fn end_date() -> FieldDescriptor {
        fields::conditional(
            "End",
            fields::checkbox("Current", false),
            fields::empty(),
            fields::date("End Date"),
        )
    }

    #[test]
    fn test_conditional_true_branch_ignores_value() {
        let (value, v) = run(
            &end_date(),
            Some(json!({ "discriminant": true, "value": "not even a date" })),
        );
        assert!(v.is_empty());
        assert_eq!(
            value,
            Some(NormalizedValue::Conditional(ConditionalValue {
                discriminant: true,
                value: Box::new(NormalizedValue::Absent)
            }))
        );
    }

    #[test]
    fn test_conditional_false_branch_validated() {
        let (_, v) = run(&end_date(), Some(json!({ "discriminant": false, "value": "bad" })));
        assert_eq!(v.len(), 1);
        assert_eq!(v.iter().next().unwrap().path.to_string(), "f.value");

        let (_, v) = run(&end_date(), Some(json!({ "discriminant": false })));
        assert_eq!(v.to_string(), "f.value: required field is missing");
    }

    #[test]
    fn test_conditional_absent_uses_discriminant_default() {
        // Discriminant defaults to false, so the date branch is required
        let (_, v) = run(&end_date(), None);
        assert_eq!(v.to_string(), "f.value: required field is missing");
    }

    #[test]
    fn test_document_missing_body() {
        let doc = fields::document("Body", Default::default());
        let (_, v) = run(&doc, None);
        assert_eq!(v.iter().next().unwrap().kind, ViolationKind::MissingBody);
        let (value, _) = run(&doc, Some(json!("")));
        assert_eq!(value, Some(NormalizedValue::Document(String::new())));
    }
}
