#![deny(missing_docs)]

//! # Extensions
//!
//! Capability table handed to the generator at construction: extra field kinds
//! (`FieldKind::Custom`) and extra validators (`Validator::Custom`) that the
//! built-in tables do not know about.

use crate::error::AppResult;
use crate::model::{CustomValidator, FieldDescriptor, Fragment};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Maps a custom field kind to its base fragment (`type`, `format`, ...).
pub type KindMapperFn = Arc<dyn Fn(&FieldDescriptor) -> AppResult<Fragment> + Send + Sync>;

/// Translates a custom validator into constraints on an existing fragment.
pub type ValidatorTranslatorFn =
    Arc<dyn Fn(Fragment, &FieldDescriptor, &CustomValidator) -> AppResult<Fragment> + Send + Sync>;

/// Extra kind mappers and validator translators, keyed by name.
#[derive(Clone, Default)]
pub struct Extensions {
    kinds: HashMap<String, KindMapperFn>,
    validators: HashMap<String, ValidatorTranslatorFn>,
}

impl Extensions {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mapper for `FieldKind::Custom(name)`.
    pub fn with_kind<F>(mut self, name: impl Into<String>, mapper: F) -> Self
    where
        F: Fn(&FieldDescriptor) -> AppResult<Fragment> + Send + Sync + 'static,
    {
        self.kinds.insert(name.into(), Arc::new(mapper));
        self
    }

    /// Registers a translator for custom validators named `name`.
    pub fn with_validator<F>(mut self, name: impl Into<String>, translator: F) -> Self
    where
        F: Fn(Fragment, &FieldDescriptor, &CustomValidator) -> AppResult<Fragment>
            + Send
            + Sync
            + 'static,
    {
        self.validators.insert(name.into(), Arc::new(translator));
        self
    }

    /// The mapper registered for a custom kind.
    pub fn kind(&self, name: &str) -> Option<&KindMapperFn> {
        self.kinds.get(name)
    }

    /// The translator registered for a custom validator.
    pub fn validator(&self, name: &str) -> Option<&ValidatorTranslatorFn> {
        self.validators.get(name)
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&String> = self.kinds.keys().collect();
        kinds.sort();
        let mut validators: Vec<&String> = self.validators.keys().collect();
        validators.sort();
        f.debug_struct("Extensions")
            .field("kinds", &kinds)
            .field("validators", &validators)
            .finish()
    }
}
