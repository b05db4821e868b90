//! Consistent view over a set of collections
//!
//! Built fresh for every read:
//! 1. List and read every record of every needed collection concurrently
//! 2. Validate each record's shape
//! 3. Claim identities in locator order; later duplicates collide
//! 4. Resolve references until nothing changes. A record with dangling
//!    references leaves the index, which may in turn dangle others.
//!
//! 5. Records turned away in steps 2 or 3 are checked against the settled
//!    index so their rejection lists every collision and dangling reference.
//!
//! Only records that survive every step count as resolution targets.

use std::collections::{BTreeSet, HashMap};

use futures_util::future::try_join_all;

use super::errors::ContentResult;
use super::listing::{CollectionListing, RejectedRecord};
use crate::schema::{Definition, SchemaError, SchemaRegistry};
use crate::storage::{RawRecord, RecordLayout, RecordLocator, StorageBackend};
use crate::validation::{
    FieldPath, IdentityIndex, NormalizedRecord, Validator, ViolationKind, ViolationList,
};

/// Validated records of several collections and their identity index
#[derive(Debug, Default)]
pub struct Snapshot {
    listings: HashMap<String, CollectionListing>,
    index: IdentityIndex,
}

/// Record turned away before resolution, with what is known against it
struct Held {
    locator: RecordLocator,
    record: NormalizedRecord,
    violations: ViolationList,
}

struct Pending<'a> {
    definition: &'a Definition,
    accepted: Vec<(RecordLocator, NormalizedRecord)>,
    /// Failed shape; never claims an identity
    misshapen: Vec<Held>,
    /// Shape-valid but lost or lacked an identity
    unclaimed: Vec<Held>,
    rejected: Vec<RejectedRecord>,
}

impl Snapshot {
    /// Reads and validates the named collections.
    ///
    /// `names` must be closed under relationship targets; a reference into
    /// a collection outside the set resolves against nothing.
    pub async fn load(
        backend: &dyn StorageBackend,
        registry: &SchemaRegistry,
        validator: &Validator,
        names: &BTreeSet<String>,
    ) -> ContentResult<Self> {
        let mut layouts = Vec::with_capacity(names.len());
        for name in names {
            let definition = registry.get(name)?;
            if !definition.is_collection() {
                return Err(SchemaError::wrong_kind(name.as_str(), "collection").into());
            }
            layouts.push((definition, RecordLayout::for_definition(definition)?));
        }

        let listed = try_join_all(layouts.iter().map(|(_, layout)| backend.list(layout))).await?;
        let raws = try_join_all(listed.iter().flatten().map(|locator| backend.read(locator))).await?;

        let mut raws = raws.into_iter();
        let mut pending: Vec<Pending<'_>> = layouts
            .iter()
            .zip(listed)
            .map(|((definition, _), locators)| {
                let records: Vec<(RecordLocator, RawRecord)> =
                    locators.into_iter().zip(raws.by_ref()).collect();
                check_shapes(validator, *definition, records)
            })
            .collect();

        let mut index = IdentityIndex::new();
        for collection in &mut pending {
            claim_identities(collection, &mut index);
        }
        resolve_fixpoint(validator, &mut pending, &mut index)?;
        for collection in &mut pending {
            settle(validator, collection, &index)?;
        }

        let listings = pending
            .into_iter()
            .map(|collection| {
                let name = collection.definition.name().to_string();
                let records = collection.accepted.into_iter().map(|(_, r)| r).collect();
                let mut rejected = collection.rejected;
                rejected.sort_by(|a, b| a.locator.cmp(&b.locator));
                (name.clone(), CollectionListing::new(name, records, rejected))
            })
            .collect();

        Ok(Self { listings, index })
    }

    pub fn index(&self) -> &IdentityIndex {
        &self.index
    }

    pub fn listing(&self, collection: &str) -> Option<&CollectionListing> {
        self.listings.get(collection)
    }

    pub fn take_listing(&mut self, collection: &str) -> CollectionListing {
        self.listings
            .remove(collection)
            .unwrap_or_else(|| CollectionListing::new(collection, Vec::new(), Vec::new()))
    }
}

fn check_shapes<'a>(
    validator: &Validator,
    definition: &'a Definition,
    records: Vec<(RecordLocator, RawRecord)>,
) -> Pending<'a> {
    let mut accepted = Vec::new();
    let mut misshapen = Vec::new();
    for (locator, raw) in records {
        let (record, violations) = validator.shape(definition, &raw, Some(&locator));
        if violations.is_empty() {
            accepted.push((locator, record));
        } else {
            misshapen.push(Held {
                locator,
                record,
                violations,
            });
        }
    }
    Pending {
        definition,
        accepted,
        misshapen,
        unclaimed: Vec::new(),
        rejected: Vec::new(),
    }
}

/// First record in locator order keeps an identity
fn claim_identities(collection: &mut Pending<'_>, index: &mut IdentityIndex) {
    let definition = collection.definition;
    let name = definition.name();
    let slug_field = definition.slug_field().unwrap_or_default();
    let mut kept = Vec::with_capacity(collection.accepted.len());

    for (locator, record) in std::mem::take(&mut collection.accepted) {
        let path = FieldPath::root().key(slug_field);
        let kind = match record.identity() {
            None => ViolationKind::Missing,
            Some(identity) => match index.insert(name, identity, locator.path()) {
                None => {
                    kept.push((locator, record));
                    continue;
                }
                Some(existing) => ViolationKind::SlugCollision {
                    identity: identity.to_string(),
                    existing,
                },
            },
        };
        let mut violations = ViolationList::new();
        violations.push(path, kind);
        collection.unclaimed.push(Held {
            locator,
            record,
            violations,
        });
    }
    collection.accepted = kept;
}

fn resolve_fixpoint(
    validator: &Validator,
    pending: &mut [Pending<'_>],
    index: &mut IdentityIndex,
) -> ContentResult<()> {
    loop {
        let mut removed = false;
        for collection in pending.iter_mut() {
            let definition = collection.definition;
            let name = definition.name();
            let mut kept = Vec::with_capacity(collection.accepted.len());
            for (locator, record) in std::mem::take(&mut collection.accepted) {
                let violations = validator.resolver().resolve(&record, index)?;
                if violations.is_empty() {
                    kept.push((locator, record));
                    continue;
                }
                if let Some(identity) = record.identity() {
                    index.remove(name, identity);
                }
                collection.rejected.push(RejectedRecord::new(locator, violations));
                removed = true;
            }
            collection.accepted = kept;
        }
        if !removed {
            return Ok(());
        }
    }
}

/// Adds identity violations to every held record and rejects it.
fn settle(
    validator: &Validator,
    collection: &mut Pending<'_>,
    index: &IdentityIndex,
) -> ContentResult<()> {
    let definition = collection.definition;
    for mut held in std::mem::take(&mut collection.misshapen) {
        if let Some((path, kind)) = validator.collision(definition, &held.record, index) {
            held.violations.push(path, kind);
        }
        held.violations.extend(validator.resolver().resolve(&held.record, index)?);
        collection.rejected.push(RejectedRecord::new(held.locator, held.violations));
    }
    for mut held in std::mem::take(&mut collection.unclaimed) {
        held.violations.extend(validator.resolver().resolve(&held.record, index)?);
        collection.rejected.push(RejectedRecord::new(held.locator, held.violations));
    }
    Ok(())
}
