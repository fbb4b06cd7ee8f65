#![deny(missing_docs)]

//! # Schema Registry
//!
//! Name -> schema lookup used to resolve nested fields that reference their
//! target by name. Registration order is preserved.

use crate::model::Schema;
use indexmap::IndexMap;
use std::sync::Arc;

/// Registry of named schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under its own name, replacing any previous entry.
    pub fn register(&mut self, schema: impl Into<Arc<Schema>>) -> Arc<Schema> {
        let schema = schema.into();
        self.schemas.insert(schema.name.clone(), Arc::clone(&schema));
        schema
    }

    /// Builder-style [`SchemaRegistry::register`].
    pub fn with_schema(mut self, schema: impl Into<Arc<Schema>>) -> Self {
        self.register(schema);
        self
    }

    /// Returns a registered schema by name.
    pub fn get(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas.get(name).cloned()
    }

    /// Whether a schema is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
