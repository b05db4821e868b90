//! Schema subsystem
//!
//! Declarative description of content types: collections, singletons and
//! the field descriptors that shape their records.
//!
//! # Design Principles
//!
//! - Closed set of descriptor kinds
//! - Registry populated once at startup, read-only afterwards
//! - Malformed declarations abort startup
//! - Relationship targets checked against the complete registry

mod declaration;
mod definition;
mod errors;
mod field;
pub mod fields;
mod registry;
pub mod site;

pub use declaration::SchemaDeclaration;
pub use definition::{CollectionDefinition, Definition, RecordFormat, SingletonDefinition};
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use field::{
    DateDefault, DocumentFeatures, Field, FieldDescriptor, FieldKind, ItemLabel, SelectOption,
};
pub use registry::SchemaRegistry;
