//! Content access facade
//!
//! The only surface the rendering layer uses. Every call re-reads from
//! the storage backend and re-validates; nothing is memoized. Records
//! that fail validation never leave this module as normalized data.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::errors::{ContentError, ContentResult};
use super::listing::{CollectionListing, RejectedRecord};
use super::snapshot::Snapshot;
use crate::observability::{self, Event};
use crate::schema::{Definition, SchemaRegistry};
use crate::storage::{RawRecord, RecordLayout, RecordLocator, StorageBackend, StorageError};
use crate::validation::{
    Clock, FieldPath, IdentityIndex, NormalizedRecord, ValidationError, Validator, ViolationKind,
    ViolationList,
};

/// Validation outcome of one singleton in a check
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SingletonStatus {
    Valid,
    Missing,
    Invalid { violations: ViolationList },
}

/// Outcome of validating one collection in a check
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub name: String,
    pub valid: usize,
    pub rejected: Vec<RejectedRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SingletonReport {
    pub name: String,
    #[serde(flatten)]
    pub status: SingletonStatus,
}

/// Result of validating all stored content
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub collections: Vec<CollectionReport>,
    pub singletons: Vec<SingletonReport>,
}

impl CheckReport {
    /// True when every stored record validates and every singleton exists
    pub fn is_clean(&self) -> bool {
        self.collections.iter().all(|c| c.rejected.is_empty())
            && self
                .singletons
                .iter()
                .all(|s| matches!(s.status, SingletonStatus::Valid))
    }

    /// Number of records excluded or singletons failing
    pub fn problem_count(&self) -> usize {
        let rejected: usize = self.collections.iter().map(|c| c.rejected.len()).sum();
        let singletons = self
            .singletons
            .iter()
            .filter(|s| !matches!(s.status, SingletonStatus::Valid))
            .count();
        rejected + singletons
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Upsert,
    Create,
}

/// Validated access to stored content
#[derive(Debug, Clone)]
pub struct ContentStore {
    registry: Arc<SchemaRegistry>,
    backend: Arc<dyn StorageBackend>,
    validator: Validator,
}

impl ContentStore {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        backend: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let validator = Validator::new(registry.clone(), clock);
        Self {
            registry,
            backend,
            validator,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Collection plus every collection it transitively references
    fn read_set(&self, name: &str) -> ContentResult<BTreeSet<String>> {
        let mut names = self.registry.relationship_targets(name)?;
        if self.registry.get(name)?.is_collection() {
            names.insert(name.to_string());
        }
        Ok(names)
    }

    async fn snapshot(&self, names: &BTreeSet<String>) -> ContentResult<Snapshot> {
        Snapshot::load(self.backend.as_ref(), &self.registry, &self.validator, names).await
    }

    async fn index_for(&self, name: &str) -> ContentResult<IdentityIndex> {
        let names = self.read_set(name)?;
        if names.is_empty() {
            return Ok(IdentityIndex::new());
        }
        Ok(self.snapshot(&names).await?.index().clone())
    }

    /// Valid records of a collection in locator order.
    ///
    /// Excluded records are logged and available via `rejected()`. A
    /// storage failure fails the whole call.
    pub async fn list(&self, collection: &str) -> ContentResult<CollectionListing> {
        self.registry.collection(collection)?;
        let mut snapshot = self.snapshot(&self.read_set(collection)?).await?;
        let listing = snapshot.take_listing(collection);

        for rejected in listing.rejected() {
            observability::log_rejection(
                collection,
                rejected.locator.path(),
                &rejected.violations.to_string(),
            );
        }
        info!(
            event = %Event::CollectionListed,
            collection,
            valid = listing.len(),
            rejected = listing.rejected().len(),
            "collection listed"
        );
        Ok(listing)
    }

    /// Valid record with the given identity
    pub async fn get(&self, collection: &str, identity: &str) -> ContentResult<NormalizedRecord> {
        self.list(collection)
            .await?
            .into_iter()
            .find(|record| record.identity() == Some(identity))
            .ok_or_else(|| ContentError::NotFound {
                collection: collection.to_string(),
                identity: identity.to_string(),
            })
    }

    /// The single record of a singleton.
    pub async fn get_singleton(&self, name: &str) -> ContentResult<NormalizedRecord> {
        self.registry.singleton(name)?;
        let definition = self.registry.get(name)?;
        let locator = RecordLayout::for_definition(definition)?.singleton_locator();

        let raw = match self.backend.read(&locator).await {
            Ok(raw) => raw,
            Err(StorageError::NotFound(_)) => {
                return Err(ContentError::SingletonMissing(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let index = self.index_for(name).await?;

        match self.validator.validate(definition, &raw, Some(&locator), &index) {
            Ok(record) => {
                info!(event = %Event::SingletonLoaded, singleton = name, "singleton loaded");
                Ok(record)
            }
            Err(ValidationError::Violations(violations)) => {
                observability::log_rejection(name, locator.path(), &violations.to_string());
                Err(ContentError::Invalid {
                    locator: locator.path().to_string(),
                    violations,
                })
            }
            Err(ValidationError::Schema(e)) => Err(e.into()),
        }
    }

    /// Validates and persists a collection record, replacing the record
    /// that already holds its identity.
    ///
    /// The record is stored at the location derived from its identity.
    /// Nothing is written unless the record validates against current
    /// content, slug uniqueness included. Returns the stored record.
    pub async fn write(&self, collection: &str, raw: RawRecord) -> ContentResult<NormalizedRecord> {
        self.store_record(collection, raw, WriteMode::Upsert).await
    }

    /// Like [`ContentStore::write`], but an identity that already has an
    /// owner is a collision even when the owner sits at the same location.
    pub async fn create(&self, collection: &str, raw: RawRecord) -> ContentResult<NormalizedRecord> {
        self.store_record(collection, raw, WriteMode::Create).await
    }

    async fn store_record(
        &self,
        collection: &str,
        raw: RawRecord,
        mode: WriteMode,
    ) -> ContentResult<NormalizedRecord> {
        self.registry.collection(collection)?;
        let definition = self.registry.get(collection)?;
        let layout = RecordLayout::for_definition(definition)?;

        let (shaped, _) = self.validator.shape(definition, &raw, None);
        let locator = shaped.identity().map(|identity| layout.locate(identity));
        let index = self.snapshot(&self.read_set(collection)?).await?.index().clone();

        let owner = match mode {
            WriteMode::Upsert => locator.as_ref(),
            WriteMode::Create => None,
        };
        let mut record = self.validate_for_write(definition, &raw, owner, &index)?;
        let Some(locator) = locator else {
            let mut violations = ViolationList::new();
            violations.push(
                FieldPath::root().key(definition.slug_field().unwrap_or_default()),
                ViolationKind::Missing,
            );
            return Err(self.reject(collection, violations));
        };
        record.locator = Some(locator.clone());
        self.persist(collection, &locator, &record).await?;
        Ok(record)
    }

    /// Validates and persists a singleton record.
    pub async fn write_singleton(&self, name: &str, raw: RawRecord) -> ContentResult<NormalizedRecord> {
        self.registry.singleton(name)?;
        let definition = self.registry.get(name)?;
        let locator = RecordLayout::for_definition(definition)?.singleton_locator();

        let index = self.index_for(name).await?;
        let record = self.validate_for_write(definition, &raw, Some(&locator), &index)?;
        self.persist(name, &locator, &record).await?;
        Ok(record)
    }

    /// Deletes the valid record with the given identity.
    pub async fn delete(&self, collection: &str, identity: &str) -> ContentResult<()> {
        let record = self.get(collection, identity).await?;
        let locator = match record.locator {
            Some(locator) => locator,
            None => RecordLayout::for_definition(self.registry.get(collection)?)?.locate(identity),
        };
        self.backend.delete(&locator).await?;
        info!(
            event = %Event::RecordDeleted,
            collection,
            identity,
            locator = locator.path(),
            "record deleted"
        );
        Ok(())
    }

    /// Validates every collection and singleton.
    pub async fn check(&self) -> ContentResult<CheckReport> {
        let names: BTreeSet<String> = self
            .registry
            .list_collections()
            .map(|d| d.name().to_string())
            .collect();
        let snapshot = self.snapshot(&names).await?;

        let mut report = CheckReport::default();
        for definition in self.registry.list_collections() {
            let name = definition.name();
            let (valid, rejected) = snapshot
                .listing(name)
                .map(|l| (l.len(), l.rejected().to_vec()))
                .unwrap_or_default();
            for r in &rejected {
                observability::log_rejection(name, r.locator.path(), &r.violations.to_string());
            }
            report.collections.push(CollectionReport {
                name: name.to_string(),
                valid,
                rejected,
            });
        }

        for definition in self.registry.list_singletons() {
            let name = definition.name();
            let status = match self.get_singleton(name).await {
                Ok(_) => SingletonStatus::Valid,
                Err(ContentError::SingletonMissing(_)) => {
                    warn!(event = %Event::RecordRejected, singleton = name, "singleton missing");
                    SingletonStatus::Missing
                }
                Err(ContentError::Invalid { violations, .. }) => {
                    SingletonStatus::Invalid { violations }
                }
                Err(e) => return Err(e),
            };
            report.singletons.push(SingletonReport {
                name: name.to_string(),
                status,
            });
        }

        info!(
            event = %Event::CheckComplete,
            problems = report.problem_count(),
            "content check complete"
        );
        Ok(report)
    }

    fn validate_for_write(
        &self,
        definition: &Definition,
        raw: &RawRecord,
        locator: Option<&RecordLocator>,
        index: &IdentityIndex,
    ) -> ContentResult<NormalizedRecord> {
        match self.validator.validate(definition, raw, locator, index) {
            Ok(record) => Ok(record),
            Err(ValidationError::Violations(violations)) => {
                Err(self.reject(definition.name(), violations))
            }
            Err(ValidationError::Schema(e)) => Err(e.into()),
        }
    }

    fn reject(&self, schema: &str, violations: ViolationList) -> ContentError {
        warn!(
            event = %Event::WriteRejected,
            schema,
            violations = %violations,
            "write rejected"
        );
        ContentError::Rejected { violations }
    }

    /// Stores the canonical form, defaults included
    async fn persist(
        &self,
        schema: &str,
        locator: &RecordLocator,
        record: &NormalizedRecord,
    ) -> ContentResult<()> {
        self.backend.write(locator, &record.to_raw()).await?;
        info!(
            event = %Event::RecordWritten,
            schema,
            locator = locator.path(),
            "record written"
        );
        Ok(())
    }
}
