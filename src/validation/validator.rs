//! Record validation
//!
//! Two phases:
//! 1. Shape: every field is validated against its descriptor, defaults
//!    applied, violations accumulated across the whole record.
//! 2. Identity: slug uniqueness and relationship resolution against an
//!    index of known identities.
//!
//! Both phases always run; a record that fails its shape is still checked
//! for collisions and dangling references over whatever did normalize.
//! Only a record with zero violations is returned in normalized form.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;

use super::clock::Clock;
use super::resolver::{IdentityIndex, RelationshipResolver};
use super::value::{NormalizedRecord, NormalizedValue, ObjectValue};
use super::violation::{FieldPath, ViolationKind, ViolationList};
use crate::schema::{Definition, SchemaError, SchemaRegistry};
use crate::storage::{RawRecord, RecordLocator};

/// Why a record could not be accepted
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The schema itself is broken; not a property of the record
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("record rejected: {0}")]
    Violations(ViolationList),
}

/// Validates raw records against registered definitions.
#[derive(Debug, Clone)]
pub struct Validator {
    resolver: RelationshipResolver,
    clock: Arc<dyn Clock>,
}

impl Validator {
    pub fn new(registry: Arc<SchemaRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self {
            resolver: RelationshipResolver::new(registry),
            clock,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn resolver(&self) -> &RelationshipResolver {
        &self.resolver
    }

    /// Shape phase only; `Err` carries every shape violation.
    pub fn check_fields(
        &self,
        definition: &Definition,
        raw: &RawRecord,
        locator: Option<&RecordLocator>,
    ) -> Result<NormalizedRecord, ViolationList> {
        let (record, violations) = self.shape(definition, raw, locator);
        violations.into_result(record)
    }

    /// Shape phase returning the partially normalized record alongside
    /// its violations.
    ///
    /// The content field is fed from the record body; every other field
    /// from the data map. Keys not declared by the definition are ignored.
    pub fn shape(
        &self,
        definition: &Definition,
        raw: &RawRecord,
        locator: Option<&RecordLocator>,
    ) -> (NormalizedRecord, ViolationList) {
        let today = self.clock.today();
        let content_field = definition.content_field();
        let body = raw.body.clone().map(Value::String);

        let mut violations = ViolationList::new();
        let mut fields = ObjectValue::new();
        for field in definition.fields() {
            let value = if Some(field.name.as_str()) == content_field {
                body.as_ref()
            } else {
                raw.data.get(&field.name)
            };
            if let Some(normalized) = field.descriptor.validate(
                value,
                &FieldPath::root().key(&field.name),
                today,
                &mut violations,
            ) {
                fields.push(field.name.clone(), normalized);
            }
        }

        let identity = definition.slug_field().and_then(|name| match fields.get(name) {
            Some(NormalizedValue::Slug(slug)) => Some(slug.slug.clone()),
            _ => None,
        });

        let record = NormalizedRecord {
            schema: definition.name().to_string(),
            identity,
            locator: locator.cloned(),
            content_field: content_field.map(str::to_string),
            fields,
        };
        (record, violations)
    }

    /// Full validation: shape, slug uniqueness, then references. Every
    /// violation of every phase is reported.
    ///
    /// An identity already owned by a different record in `index` is a
    /// collision; the record already in the index keeps it.
    pub fn validate(
        &self,
        definition: &Definition,
        raw: &RawRecord,
        locator: Option<&RecordLocator>,
        index: &IdentityIndex,
    ) -> Result<NormalizedRecord, ValidationError> {
        let (record, mut violations) = self.shape(definition, raw, locator);
        if let Some(collision) = self.collision(definition, &record, index) {
            violations.push(collision.0, collision.1);
        }
        violations.extend(self.resolver.resolve(&record, index)?);

        violations
            .into_result(record)
            .map_err(ValidationError::Violations)
    }

    /// Slug collision of `record` against the owners recorded in `index`
    pub fn collision(
        &self,
        definition: &Definition,
        record: &NormalizedRecord,
        index: &IdentityIndex,
    ) -> Option<(FieldPath, ViolationKind)> {
        let slug_field = definition.slug_field()?;
        let identity = record.identity()?;
        let owner = index.owner(definition.name(), identity)?;
        let own = record.locator.as_ref().map(RecordLocator::path);
        if own == Some(owner) {
            return None;
        }
        Some((
            FieldPath::root().key(slug_field),
            ViolationKind::SlugCollision {
                identity: identity.to_string(),
                existing: owner.to_string(),
            },
        ))
    }
}
