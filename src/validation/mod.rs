//! Validation subsystem
//!
//! Turns raw stored records into normalized records, or into the complete
//! list of reasons they were rejected.
//!
//! # Phases
//!
//! 1. Field shape per descriptor (`field`)
//! 2. Slug uniqueness within a collection (`validator`)
//! 3. Relationship resolution (`resolver`)

mod clock;
mod field;
mod resolver;
pub mod slug;
mod validator;
mod value;
mod violation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use resolver::{IdentityIndex, RelationshipResolver};
pub use slug::slugify;
pub use validator::{ValidationError, Validator};
pub use value::{
    AssetRef, ConditionalValue, NormalizedRecord, NormalizedValue, ObjectValue, Reference,
    SlugValue,
};
pub use violation::{FieldPath, PathSegment, Violation, ViolationKind, ViolationList};
