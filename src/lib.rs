//! sitecontent - schema-validated content for a personal site
//!
//! Declares the site's collections and singletons, validates stored
//! records against them, resolves cross-collection references and serves
//! only valid, normalized records to the rendering layer.

pub mod cli;
pub mod config;
pub mod content;
pub mod observability;
pub mod schema;
pub mod storage;
pub mod validation;
