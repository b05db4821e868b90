//! Schema registry
//!
//! Populated once at process start, then shared read-only:
//! - Every definition is structurally checked on registration
//! - Registering a name twice is FATAL
//! - Relationship targets are checked only after every definition is
//!   registered, so declaration order never matters

use std::collections::{BTreeSet, HashMap};

use tracing::info;

use super::declaration::SchemaDeclaration;
use super::definition::{CollectionDefinition, Definition, SingletonDefinition};
use super::errors::{SchemaError, SchemaResult};
use crate::observability::Event;

/// In-memory registry of collection and singleton definitions.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    /// Definitions in registration order
    definitions: Vec<Definition>,
    /// Name -> position in `definitions`
    index: HashMap<String, usize>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a fully checked registry from a declaration.
    ///
    /// Any error here is a configuration error and must abort startup.
    pub fn from_declaration(declaration: SchemaDeclaration) -> SchemaResult<Self> {
        let mut registry = Self::new();
        for collection in declaration.collections {
            registry.register(Definition::Collection(collection))?;
        }
        for singleton in declaration.singletons {
            registry.register(Definition::Singleton(singleton))?;
        }
        registry.check_relationships()?;

        info!(
            event = %Event::RegistryReady,
            collections = registry.list_collections().count(),
            singletons = registry.list_singletons().count(),
            "schema registry ready"
        );
        Ok(registry)
    }

    /// Registers a definition.
    pub fn register(&mut self, definition: Definition) -> SchemaResult<()> {
        definition.validate_structure()?;

        let name = definition.name().to_string();
        if self.index.contains_key(&name) {
            return Err(SchemaError::duplicate(name));
        }

        self.index.insert(name, self.definitions.len());
        self.definitions.push(definition);
        Ok(())
    }

    /// Verifies that every relationship names a registered collection.
    pub fn check_relationships(&self) -> SchemaResult<()> {
        for definition in &self.definitions {
            for (path, target) in definition.relationship_targets() {
                match self.get(target) {
                    Ok(Definition::Collection(_)) => {}
                    _ => return Err(SchemaError::unknown_target(definition.name(), path, target)),
                }
            }
        }
        Ok(())
    }

    /// Gets a definition by name.
    pub fn get(&self, name: &str) -> SchemaResult<&Definition> {
        self.index
            .get(name)
            .map(|&i| &self.definitions[i])
            .ok_or_else(|| SchemaError::unknown_schema(name))
    }

    /// Gets a collection definition by name.
    pub fn collection(&self, name: &str) -> SchemaResult<&CollectionDefinition> {
        match self.get(name)? {
            Definition::Collection(c) => Ok(c),
            Definition::Singleton(_) => Err(SchemaError::wrong_kind(name, "collection")),
        }
    }

    /// Gets a singleton definition by name.
    pub fn singleton(&self, name: &str) -> SchemaResult<&SingletonDefinition> {
        match self.get(name)? {
            Definition::Singleton(s) => Ok(s),
            Definition::Collection(_) => Err(SchemaError::wrong_kind(name, "singleton")),
        }
    }

    /// Checks if a definition exists.
    pub fn exists(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Collection definitions in registration order.
    pub fn list_collections(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.iter().filter(|d| d.is_collection())
    }

    /// Singleton definitions in registration order.
    pub fn list_singletons(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.iter().filter(|d| !d.is_collection())
    }

    /// Returns the number of registered definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Collections whose records must be known to resolve references of
    /// `name`: its direct targets and theirs, transitively.
    ///
    /// A collection that references itself is included.
    pub fn relationship_targets(&self, name: &str) -> SchemaResult<BTreeSet<String>> {
        let mut seen = BTreeSet::new();
        let mut pending = vec![name.to_string()];
        while let Some(current) = pending.pop() {
            let definition = self.get(&current)?;
            for (path, target) in definition.relationship_targets() {
                if !self.exists(target) {
                    return Err(SchemaError::unknown_target(definition.name(), path, target));
                }
                if seen.insert(target.to_string()) {
                    pending.push(target.to_string());
                }
            }
        }
        Ok(seen)
    }

    /// Returns the declaration this registry was built from.
    pub fn to_declaration(&self) -> SchemaDeclaration {
        let mut declaration = SchemaDeclaration::default();
        for definition in &self.definitions {
            match definition {
                Definition::Collection(c) => declaration.collections.push(c.clone()),
                Definition::Singleton(s) => declaration.singletons.push(s.clone()),
            }
        }
        declaration
    }
}
