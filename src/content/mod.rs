//! Content access layer
//!
//! Lists and gets validated records for the rendering layer. Built on a
//! per-call snapshot: read, validate, claim identities, resolve.

mod errors;
mod listing;
mod snapshot;
mod store;

pub use errors::{ContentError, ContentResult};
pub use listing::{CollectionListing, RejectedRecord};
pub use snapshot::Snapshot;
pub use store::{CheckReport, CollectionReport, ContentStore, SingletonReport, SingletonStatus};
