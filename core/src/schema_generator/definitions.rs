//! # Definitions Cache
//!
//! Per-dump table of schema name -> definition. A name is reserved before its
//! schema is walked, so the table doubles as the visited set: a reference back to
//! a schema that is still being walked (self or mutual recursion) finds the
//! reservation and emits a `$ref` instead of recursing.

use crate::error::{AppError, AppResult};
use crate::model::Fragment;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Definitions discovered during one dump, in discovery order.
#[derive(Debug, Default)]
pub struct Definitions {
    entries: IndexMap<String, Option<Fragment>>,
}

impl Definitions {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `name` for walking. Returns `false` when the name is already
    /// resolved or in progress.
    pub fn reserve(&mut self, name: &str) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.entries.insert(name.to_string(), None);
        true
    }

    /// Stores the finished definition of a reserved name.
    pub fn resolve(&mut self, name: &str, definition: Fragment) {
        self.entries.insert(name.to_string(), Some(definition));
    }

    /// Number of known names.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Converts the cache into the `definitions` object of the root document.
    ///
    /// Every reservation must have been resolved.
    pub fn finish(self) -> AppResult<Map<String, Value>> {
        let mut out = Map::new();
        for (name, slot) in self.entries {
            match slot {
                Some(definition) => {
                    out.insert(name, Value::Object(definition));
                }
                None => {
                    return Err(AppError::General(format!(
                        "Definition '{}' was reserved but never resolved",
                        name
                    )))
                }
            }
        }
        Ok(out)
    }
}
