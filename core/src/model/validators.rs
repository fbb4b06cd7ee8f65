//! # Validators
//!
//! Declarative constraints attached to fields. Each built-in validator has a
//! JSON Schema translator in `crate::validation`.

use regex::Regex;
use serde_json::{Map, Number, Value};
use tracing::warn;

/// Length bounds for strings and collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Length {
    /// Lower bound.
    pub min: Option<u64>,
    /// Upper bound.
    pub max: Option<u64>,
    /// Exact length; overrides `min` and `max`.
    pub equal: Option<u64>,
}

impl Length {
    /// Bounded on both or either side.
    pub fn new(min: Option<u64>, max: Option<u64>) -> Self {
        Self {
            min,
            max,
            equal: None,
        }
    }

    /// Exactly `n` long.
    pub fn equal(n: u64) -> Self {
        Self {
            min: None,
            max: None,
            equal: Some(n),
        }
    }
}

/// Membership in a fixed list of choices.
#[derive(Debug, Clone, PartialEq)]
pub struct OneOf {
    /// Allowed values, in order.
    pub choices: Vec<Value>,
    /// Human-readable labels parallel to `choices`.
    pub labels: Option<Vec<String>>,
}

impl OneOf {
    /// Collects the choices from any iterable.
    pub fn new<I, V>(choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
            labels: None,
        }
    }

    /// Attaches labels.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }
}

/// Numeric bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    /// Lower bound.
    pub min: Option<Number>,
    /// Upper bound.
    pub max: Option<Number>,
    /// Whether `min` itself is allowed.
    pub min_inclusive: bool,
    /// Whether `max` itself is allowed.
    pub max_inclusive: bool,
}

impl Default for Range {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            min_inclusive: true,
            max_inclusive: true,
        }
    }
}

impl Range {
    /// An unbounded, inclusive range.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lower bound.
    pub fn with_min(mut self, min: impl Into<Number>) -> Self {
        self.min = Some(min.into());
        self
    }

    /// Sets the upper bound.
    pub fn with_max(mut self, max: impl Into<Number>) -> Self {
        self.max = Some(max.into());
        self
    }

    /// Sets lower bound inclusivity.
    pub fn with_min_inclusive(mut self, inclusive: bool) -> Self {
        self.min_inclusive = inclusive;
        self
    }

    /// Sets upper bound inclusivity.
    pub fn with_max_inclusive(mut self, inclusive: bool) -> Self {
        self.max_inclusive = inclusive;
        self
    }
}

/// A regular expression that string values must match.
///
/// The source text is kept verbatim: JSON Schema `pattern` is ECMA-262, which
/// accepts look-around and backreferences the `regex` engine does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regexp {
    /// The pattern source text; `None` when it is not available.
    pub pattern: Option<String>,
}

impl Regexp {
    /// Records `pattern`. A pattern the `regex` engine cannot parse is still
    /// kept, with a warning.
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        if let Err(e) = Regex::new(&pattern) {
            warn!(
                %pattern,
                error = %e,
                "pattern not parsed by the regex engine, keeping it verbatim"
            );
        }
        Self {
            pattern: Some(pattern),
        }
    }

    /// A regexp validator whose pattern text cannot be extracted.
    pub fn opaque() -> Self {
        Self { pattern: None }
    }

    /// The pattern source text.
    pub fn source(&self) -> Option<&str> {
        self.pattern.as_deref()
    }
}

/// A validator outside the built-in set.
///
/// It is translated by a generator extension registered under `name`, or, failing
/// that, by the translator of its `base` validator.
#[derive(Debug, Clone)]
pub struct CustomValidator {
    /// Extension lookup key.
    pub name: String,
    /// Built-in validator this one layers on.
    pub base: Option<Box<Validator>>,
    /// Free-form parameters for extension translators.
    pub params: Map<String, Value>,
}

impl CustomValidator {
    /// A custom validator with no base and no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            params: Map::new(),
        }
    }

    /// Declares the built-in validator this one should be translated as.
    pub fn with_base(mut self, base: impl Into<Validator>) -> Self {
        self.base = Some(Box::new(base.into()));
        self
    }

    /// Adds a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A constraint attached to a field.
#[derive(Debug, Clone)]
pub enum Validator {
    /// See [`Length`].
    Length(Length),
    /// See [`OneOf`].
    OneOf(OneOf),
    /// See [`Range`].
    Range(Range),
    /// See [`Regexp`].
    Regexp(Regexp),
    /// See [`CustomValidator`].
    Custom(CustomValidator),
}

impl Validator {
    /// Short name used in error messages.
    pub fn kind_name(&self) -> &str {
        match self {
            Validator::Length(_) => "length",
            Validator::OneOf(_) => "one_of",
            Validator::Range(_) => "range",
            Validator::Regexp(_) => "regexp",
            Validator::Custom(custom) => &custom.name,
        }
    }
}

impl From<Length> for Validator {
    fn from(v: Length) -> Self {
        Validator::Length(v)
    }
}

impl From<OneOf> for Validator {
    fn from(v: OneOf) -> Self {
        Validator::OneOf(v)
    }
}

impl From<Range> for Validator {
    fn from(v: Range) -> Self {
        Validator::Range(v)
    }
}

impl From<Regexp> for Validator {
    fn from(v: Regexp) -> Self {
        Validator::Regexp(v)
    }
}

impl From<CustomValidator> for Validator {
    fn from(v: CustomValidator) -> Self {
        Validator::Custom(v)
    }
}
