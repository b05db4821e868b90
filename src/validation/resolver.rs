//! Relationship resolution
//!
//! Runs after shape validation. Every reference in a normalized record is
//! checked against the identities known for its target collection. Field
//! validation only checks that a reference is well formed.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::value::NormalizedRecord;
use super::violation::{ViolationKind, ViolationList};
use crate::schema::{SchemaError, SchemaRegistry, SchemaResult};

/// Known identities per collection, each mapped to the record that owns it
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    collections: HashMap<String, BTreeMap<String, String>>,
}

impl IdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an identity. Keeps the first owner; returns it on collision.
    pub fn insert(
        &mut self,
        collection: &str,
        identity: &str,
        owner: impl Into<String>,
    ) -> Option<String> {
        let identities = self.collections.entry(collection.to_string()).or_default();
        match identities.get(identity) {
            Some(existing) => Some(existing.clone()),
            None => {
                identities.insert(identity.to_string(), owner.into());
                None
            }
        }
    }

    pub fn remove(&mut self, collection: &str, identity: &str) -> bool {
        self.collections
            .get_mut(collection)
            .map(|identities| identities.remove(identity).is_some())
            .unwrap_or(false)
    }

    pub fn contains(&self, collection: &str, identity: &str) -> bool {
        self.owner(collection, identity).is_some()
    }

    /// Owner of an identity, usually the locator path of its record
    pub fn owner(&self, collection: &str, identity: &str) -> Option<&str> {
        self.collections
            .get(collection)
            .and_then(|identities| identities.get(identity))
            .map(String::as_str)
    }

    /// Identities of a collection in sorted order
    pub fn identities(&self, collection: &str) -> Vec<&str> {
        self.collections
            .get(collection)
            .map(|identities| identities.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Checks references against an identity index.
#[derive(Debug, Clone)]
pub struct RelationshipResolver {
    registry: Arc<SchemaRegistry>,
}

impl RelationshipResolver {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// Returns one violation per dangling reference.
    ///
    /// A reference into a collection the registry does not know is a
    /// configuration error, not a data error.
    pub fn resolve(
        &self,
        record: &NormalizedRecord,
        index: &IdentityIndex,
    ) -> SchemaResult<ViolationList> {
        let mut violations = ViolationList::new();
        for (path, reference) in record.references() {
            let known = self
                .registry
                .get(&reference.collection)
                .map(|definition| definition.is_collection())
                .unwrap_or(false);
            if !known {
                return Err(SchemaError::unknown_target(
                    &record.schema,
                    path.to_string(),
                    &reference.collection,
                ));
            }
            if !index.contains(&reference.collection, &reference.identity) {
                violations.push(
                    path,
                    ViolationKind::UnresolvedReference {
                        identity: reference.identity.clone(),
                        collection: reference.collection.clone(),
                    },
                );
            }
        }
        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::site::site_schema;
    use crate::validation::{NormalizedValue, ObjectValue, Reference};

    fn post_with_tags(tags: &[&str], collection: &str) -> NormalizedRecord {
        let mut fields = ObjectValue::new();
        fields.push(
            "tags",
            NormalizedValue::Array(
                tags.iter()
                    .map(|t| {
                        NormalizedValue::Reference(Reference {
                            collection: collection.into(),
                            identity: t.to_string(),
                        })
                    })
                    .collect(),
            ),
        );
        NormalizedRecord {
            schema: "posts".into(),
            identity: Some("hello".into()),
            locator: None,
            content_field: None,
            fields,
        }
    }

    fn resolver() -> RelationshipResolver {
        let registry = SchemaRegistry::from_declaration(site_schema()).unwrap();
        RelationshipResolver::new(Arc::new(registry))
    }

    #[test]
    fn test_index_keeps_first_owner() {
        let mut index = IdentityIndex::new();
        assert_eq!(index.insert("tags", "rust", "a.yaml"), None);
        assert_eq!(index.insert("tags", "rust", "b.yaml"), Some("a.yaml".into()));
        assert_eq!(index.owner("tags", "rust"), Some("a.yaml"));
        assert!(index.remove("tags", "rust"));
        assert!(!index.contains("tags", "rust"));
    }

    #[test]
    fn test_all_resolved() {
        let mut index = IdentityIndex::new();
        index.insert("tags", "design", "design.yaml");
        index.insert("tags", "rust", "rust.yaml");
        let violations = resolver()
            .resolve(&post_with_tags(&["design", "rust"], "tags"), &index)
            .unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn test_each_dangling_reference_reported() {
        let mut index = IdentityIndex::new();
        index.insert("tags", "design", "design.yaml");
        let violations = resolver()
            .resolve(&post_with_tags(&["nonexistent", "design", "gone"], "tags"), &index)
            .unwrap();
        assert_eq!(violations.len(), 2);
        assert_eq!(
            violations.to_string(),
            "tags[0]: unresolved reference \"nonexistent\" in collection \"tags\"; \
             tags[2]: unresolved reference \"gone\" in collection \"tags\""
        );
    }

    #[test]
    fn test_unknown_collection_is_fatal() {
        let err = resolver()
            .resolve(&post_with_tags(&["x"], "categories"), &IdentityIndex::new())
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
