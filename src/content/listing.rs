//! Collection listings
//!
//! A listing holds the valid records of one collection in locator order,
//! plus the records that were excluded and why.

use serde::Serialize;

use crate::storage::RecordLocator;
use crate::validation::{NormalizedRecord, ViolationList};

/// A stored record excluded from consumer results
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    pub locator: RecordLocator,
    pub violations: ViolationList,
}

impl RejectedRecord {
    pub fn new(locator: RecordLocator, violations: ViolationList) -> Self {
        Self {
            locator,
            violations,
        }
    }
}

impl Serialize for RejectedRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("RejectedRecord", 2)?;
        s.serialize_field("locator", self.locator.path())?;
        s.serialize_field("violations", &self.violations)?;
        s.end()
    }
}

/// Valid records of one collection, with the rejections found alongside
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionListing {
    pub collection: String,
    records: Vec<NormalizedRecord>,
    rejected: Vec<RejectedRecord>,
}

impl CollectionListing {
    pub fn new(
        collection: impl Into<String>,
        records: Vec<NormalizedRecord>,
        rejected: Vec<RejectedRecord>,
    ) -> Self {
        Self {
            collection: collection.into(),
            records,
            rejected,
        }
    }

    /// Valid records in locator order
    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Valid record with the given identity
    pub fn get(&self, identity: &str) -> Option<&NormalizedRecord> {
        self.records.iter().find(|r| r.identity() == Some(identity))
    }

    pub fn identities(&self) -> Vec<&str> {
        self.records.iter().filter_map(|r| r.identity()).collect()
    }

    /// Records excluded from the listing
    pub fn rejected(&self) -> &[RejectedRecord] {
        &self.rejected
    }

    pub fn into_records(self) -> Vec<NormalizedRecord> {
        self.records
    }
}

impl IntoIterator for CollectionListing {
    type Item = NormalizedRecord;
    type IntoIter = std::vec::IntoIter<NormalizedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a CollectionListing {
    type Item = &'a NormalizedRecord;
    type IntoIter = std::slice::Iter<'a, NormalizedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
