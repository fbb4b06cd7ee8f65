//! # Schemas
//!
//! A named, ordered collection of field descriptors plus schema-level options.

use crate::error::{AppError, AppResult};
use crate::model::fields::FieldDescriptor;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Policy for input keys that match no declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFields {
    /// Reject unknown keys.
    Raise,
    /// Drop unknown keys.
    Exclude,
    /// Keep unknown keys.
    Include,
}

/// Which fields are exempt from `required`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Partial {
    /// Every required field is listed.
    #[default]
    None,
    /// No field is listed.
    All,
    /// The named fields are not listed.
    Fields(Vec<String>),
}

/// Schema-level options.
///
/// `additional_properties`, `title` and `description` hold raw values so that
/// badly typed options surface as `UnsupportedType` at dump time.
#[derive(Debug, Clone, Default)]
pub struct SchemaOptions {
    /// Unknown-field handling; `None` behaves like `Raise`.
    pub unknown: Option<UnknownFields>,
    /// Explicit `additionalProperties`; must be a boolean.
    pub additional_properties: Option<Value>,
    /// Definition title; must be a string.
    pub title: Option<Value>,
    /// Definition description; must be a string.
    pub description: Option<Value>,
    /// Required-list exemptions.
    pub partial: Partial,
    /// Extra top-level uiSchema entries.
    pub ui_extra: IndexMap<String, Value>,
}

/// A named, ordered collection of fields.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Definition name.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
    /// Options.
    pub options: SchemaOptions,
}

impl Schema {
    /// An empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            options: SchemaOptions::default(),
        }
    }

    /// Appends a field.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: SchemaOptions) -> Self {
        self.options = options;
        self
    }

    /// Finds a field by declared name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether `field_name` is exempt from the required list.
    pub fn is_partial(&self, field_name: &str) -> bool {
        match &self.options.partial {
            Partial::None => false,
            Partial::All => true,
            Partial::Fields(names) => names.iter().any(|n| n == field_name),
        }
    }

    /// Returns a copy restricted by an allow-list and a deny-list.
    ///
    /// Plain entries match declared field names. Dotted entries (`inner.field`)
    /// keep or touch the leading field and are pushed down into its nested
    /// reference, so they apply when that schema is walked.
    ///
    /// A plain entry, or the head of a dotted one, that names no declared field
    /// is an `UnsupportedType` error.
    pub fn restrict(&self, only: Option<&[String]>, exclude: &[String]) -> AppResult<Schema> {
        let only = only.map(PathSet::parse);
        let exclude = PathSet::parse(exclude);
        self.check_paths(only.iter().chain(std::iter::once(&exclude)))?;

        let mut fields = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            if exclude.bare.contains(field.name.as_str()) {
                continue;
            }
            let mut field = field.clone();

            if let Some(only) = &only {
                let listed_bare = only.bare.contains(field.name.as_str());
                match only.nested.get(&field.name) {
                    Some(deeper) if !listed_bare => {
                        if let Some(nested) = field.nested_mut() {
                            nested.only = Some(match nested.only.take() {
                                Some(existing) => existing
                                    .into_iter()
                                    .filter(|name| deeper.contains(name))
                                    .collect(),
                                None => deeper.clone(),
                            });
                        }
                    }
                    Some(_) => {}
                    None if listed_bare => {}
                    None => continue,
                }
            }

            if let Some(deeper) = exclude.nested.get(&field.name) {
                if let Some(nested) = field.nested_mut() {
                    nested.exclude.extend(deeper.iter().cloned());
                }
            }

            fields.push(field);
        }

        Ok(Schema {
            name: self.name.clone(),
            fields,
            options: self.options.clone(),
        })
    }

    fn check_paths<'p, 'a: 'p>(
        &self,
        sets: impl Iterator<Item = &'p PathSet<'a>>,
    ) -> AppResult<()> {
        let mut unknown: Vec<&str> = sets
            .flat_map(|set| set.heads())
            .filter(|head| self.field(head).is_none())
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        unknown.sort_unstable();
        unknown.dedup();
        Err(AppError::unsupported(
            &self.name,
            format!("Invalid fields for {}: {}", self.name, unknown.join(", ")),
        ))
    }
}

/// Field paths split at the first dot.
struct PathSet<'a> {
    bare: HashSet<&'a str>,
    nested: IndexMap<String, Vec<String>>,
}

impl<'a> PathSet<'a> {
    fn parse(paths: &'a [String]) -> Self {
        let mut bare = HashSet::new();
        let mut nested: IndexMap<String, Vec<String>> = IndexMap::new();
        for path in paths {
            match path.split_once('.') {
                Some((head, rest)) => nested
                    .entry(head.to_string())
                    .or_default()
                    .push(rest.to_string()),
                None => {
                    bare.insert(path.as_str());
                }
            }
        }
        Self { bare, nested }
    }

    /// Field names the paths start with.
    fn heads(&self) -> impl Iterator<Item = &str> + '_ {
        self.bare
            .iter()
            .copied()
            .chain(self.nested.keys().map(String::as_str))
    }
}
