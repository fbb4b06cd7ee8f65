//! # Validator Translation
//!
//! Post-processes a field's fragment with the JSON Schema keywords equivalent
//! to its validators. Each translator takes the fragment by value and returns the
//! augmented fragment.

use crate::error::{AppError, AppResult};
use crate::extensions::Extensions;
use crate::model::{
    CustomValidator, FieldDescriptor, Fragment, Length, OneOf, Range, Regexp, Validator,
};
use serde_json::{json, Number, Value};
use tracing::{trace, warn};

/// Knobs shared by the translators.
#[derive(Debug, Clone, Copy)]
pub struct TranslateOptions {
    /// Fail on validators no translator handles (otherwise skip them).
    pub strict: bool,
    /// Treat a range bound of exactly zero as absent.
    pub legacy_range_zero: bool,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            strict: true,
            legacy_range_zero: false,
        }
    }
}

/// Applies every validator of `field`, in declaration order.
pub fn apply_validators(
    mut fragment: Fragment,
    field: &FieldDescriptor,
    extensions: &Extensions,
    options: TranslateOptions,
) -> AppResult<Fragment> {
    for validator in &field.validators {
        trace!(field = %field.name, validator = %validator.kind_name(), "applying validator");
        fragment = apply_validator(fragment, field, validator, extensions, options)?;
    }
    Ok(fragment)
}

fn apply_validator(
    fragment: Fragment,
    field: &FieldDescriptor,
    validator: &Validator,
    extensions: &Extensions,
    options: TranslateOptions,
) -> AppResult<Fragment> {
    match validator {
        Validator::Length(v) => handle_length(fragment, field, v),
        Validator::OneOf(v) => handle_one_of(fragment, field, v),
        Validator::Range(v) => handle_range(fragment, field, v, options.legacy_range_zero),
        Validator::Regexp(v) => handle_regexp(fragment, field, v),
        Validator::Custom(custom) => {
            if let Some(translate) = extensions.validator(&custom.name) {
                return translate(fragment, field, custom);
            }
            match &custom.base {
                Some(base) => apply_validator(fragment, field, base, extensions, options),
                None => unhandled(fragment, field, custom, options),
            }
        }
    }
}

fn unhandled(
    fragment: Fragment,
    field: &FieldDescriptor,
    custom: &CustomValidator,
    options: TranslateOptions,
) -> AppResult<Fragment> {
    if options.strict {
        return Err(AppError::unsupported(
            &field.name,
            format!("no JSON Schema translation for validator '{}'", custom.name),
        ));
    }
    warn!(
        field = %field.name,
        validator = %custom.name,
        "skipping validator without JSON Schema translation"
    );
    Ok(fragment)
}

/// `Length` -> `minLength`/`maxLength` on strings, `minItems`/`maxItems` on
/// lists and nested fields.
pub fn handle_length(
    mut fragment: Fragment,
    field: &FieldDescriptor,
    validator: &Length,
) -> AppResult<Fragment> {
    let (min_key, max_key) = if field.kind.is_string_like() {
        ("minLength", "maxLength")
    } else if field.kind.is_collection() {
        ("minItems", "maxItems")
    } else {
        return Err(AppError::unsupported(
            &field.name,
            format!(
                "length validator needs a string, list or nested field, not '{}'",
                field.kind.name()
            ),
        ));
    };

    if let Some(min) = validator.min {
        fragment.insert(min_key.to_string(), json!(min));
    }
    if let Some(max) = validator.max {
        fragment.insert(max_key.to_string(), json!(max));
    }
    if let Some(equal) = validator.equal {
        fragment.insert(min_key.to_string(), json!(equal));
        fragment.insert(max_key.to_string(), json!(equal));
    }

    Ok(fragment)
}

/// `OneOf` -> `enum` (and `enumNames` when labelled).
pub fn handle_one_of(
    mut fragment: Fragment,
    field: &FieldDescriptor,
    validator: &OneOf,
) -> AppResult<Fragment> {
    fragment.insert("enum".to_string(), Value::Array(validator.choices.clone()));

    if let Some(labels) = &validator.labels {
        if labels.len() != validator.choices.len() {
            return Err(AppError::unsupported(
                &field.name,
                format!(
                    "one_of has {} choices but {} labels",
                    validator.choices.len(),
                    labels.len()
                ),
            ));
        }
        fragment.insert("enumNames".to_string(), json!(labels));
    }

    Ok(fragment)
}

/// `Range` -> `minimum`/`maximum`, or the exclusive keywords for
/// non-inclusive bounds.
pub fn handle_range(
    mut fragment: Fragment,
    field: &FieldDescriptor,
    validator: &Range,
    legacy_range_zero: bool,
) -> AppResult<Fragment> {
    if !field.kind.is_numeric() {
        return Err(AppError::unsupported(
            &field.name,
            format!(
                "range validator needs a numeric field, not '{}'",
                field.kind.name()
            ),
        ));
    }

    let bound = |n: &Option<Number>| -> Option<Number> {
        n.as_ref()
            .filter(|n| !(legacy_range_zero && is_zero(n)))
            .cloned()
    };

    if let Some(min) = bound(&validator.min) {
        let key = if validator.min_inclusive {
            "minimum"
        } else {
            "exclusiveMinimum"
        };
        fragment.insert(key.to_string(), Value::Number(min));
    }
    if let Some(max) = bound(&validator.max) {
        let key = if validator.max_inclusive {
            "maximum"
        } else {
            "exclusiveMaximum"
        };
        fragment.insert(key.to_string(), Value::Number(max));
    }

    Ok(fragment)
}

/// `Regexp` -> `pattern` (the source text).
pub fn handle_regexp(
    mut fragment: Fragment,
    field: &FieldDescriptor,
    validator: &Regexp,
) -> AppResult<Fragment> {
    if !field.kind.is_string_like() {
        return Err(AppError::unsupported(
            &field.name,
            format!(
                "regexp validator needs a string field, not '{}'",
                field.kind.name()
            ),
        ));
    }

    if let Some(pattern) = validator.source() {
        fragment.insert("pattern".to_string(), json!(pattern));
    }

    Ok(fragment)
}

fn is_zero(n: &Number) -> bool {
    n.as_f64() == Some(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldKind, NestedField};

    fn base_string() -> Fragment {
        json!({"title": "name", "type": "string"})
            .as_object()
            .cloned()
            .unwrap()
    }

    fn translate(field: &FieldDescriptor, options: TranslateOptions) -> AppResult<Value> {
        apply_validators(base_string(), field, &Extensions::new(), options).map(Value::Object)
    }

    #[test]
    fn test_length_on_string_adds_exactly_two_keys() {
        let field = FieldDescriptor::string("name").with_validator(Length::new(Some(1), Some(255)));
        let res = translate(&field, TranslateOptions::default()).unwrap();
        assert_eq!(
            res,
            json!({"title": "name", "type": "string", "minLength": 1, "maxLength": 255})
        );
    }

    #[test]
    fn test_length_equal_overrides_bounds() {
        let v = Length {
            min: Some(1),
            max: Some(3),
            equal: Some(50),
        };
        let field = FieldDescriptor::string("const").with_validator(v);
        let res = translate(&field, TranslateOptions::default()).unwrap();
        assert_eq!(res["minLength"], 50);
        assert_eq!(res["maxLength"], 50);
    }

    #[test]
    fn test_length_on_collections_uses_items() {
        let field = FieldDescriptor::nested(
            "addresses",
            NestedField::to("Address").with_many(true),
        )
        .with_validator(Length::new(Some(1), Some(3)));
        let res = translate(&field, TranslateOptions::default()).unwrap();
        assert_eq!(res["minItems"], 1);
        assert_eq!(res["maxItems"], 3);
        assert!(res.get("minLength").is_none());
    }

    #[test]
    fn test_length_on_integer_fails() {
        let field = FieldDescriptor::integer("bob").with_validator(Length::new(Some(1), Some(3)));
        assert!(matches!(
            translate(&field, TranslateOptions::default()),
            Err(AppError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_one_of_with_labels() {
        let field = FieldDescriptor::string("sex")
            .with_validator(OneOf::new(["a", "b"]).with_labels(["A", "B"]));
        let res = translate(&field, TranslateOptions::default()).unwrap();
        assert_eq!(res["enum"], json!(["a", "b"]));
        assert_eq!(res["enumNames"], json!(["A", "B"]));
    }

    #[test]
    fn test_one_of_empty_choices() {
        let field = FieldDescriptor::string("foo").with_validator(OneOf::new(Vec::<Value>::new()));
        let res = translate(&field, TranslateOptions::default()).unwrap();
        assert_eq!(res["enum"], json!([]));
        assert!(res.get("enumNames").is_none());
    }

    #[test]
    fn test_one_of_label_mismatch_fails() {
        let field = FieldDescriptor::string("foo")
            .with_validator(OneOf::new(["a", "b"]).with_labels(["A"]));
        assert!(translate(&field, TranslateOptions::default()).is_err());
    }

    #[test]
    fn test_one_of_is_idempotent() {
        let field = FieldDescriptor::integer("foo")
            .with_validator(OneOf::new((0..3).map(|n| n * 2)));
        let first = translate(&field, TranslateOptions::default()).unwrap();
        let second = translate(&field, TranslateOptions::default()).unwrap();
        assert_eq!(first["enum"], json!([0, 2, 4]));
        assert_eq!(first, second);
    }

    #[test]
    fn test_range_inclusive() {
        let field =
            FieldDescriptor::integer("floor").with_validator(Range::new().with_min(1).with_max(4));
        let res = translate(&field, TranslateOptions::default()).unwrap();
        assert_eq!(res["minimum"], 1);
        assert_eq!(res["maximum"], 4);
        assert!(res.get("exclusiveMinimum").is_none());
        assert!(res.get("exclusiveMaximum").is_none());
    }

    #[test]
    fn test_range_exclusive() {
        let v = Range::new()
            .with_min(1)
            .with_min_inclusive(false)
            .with_max(3)
            .with_max_inclusive(false);
        let field = FieldDescriptor::integer("foo").with_validator(v);
        let res = translate(&field, TranslateOptions::default()).unwrap();
        assert_eq!(res["exclusiveMinimum"], 1);
        assert_eq!(res["exclusiveMaximum"], 3);
        assert!(res.get("minimum").is_none());
    }

    #[test]
    fn test_range_zero_is_a_bound_by_default() {
        let field = FieldDescriptor::integer("foo").with_validator(Range::new().with_min(0));
        let res = translate(&field, TranslateOptions::default()).unwrap();
        assert_eq!(res["minimum"], 0);
    }

    #[test]
    fn test_range_zero_dropped_in_legacy_mode() {
        let field = FieldDescriptor::integer("foo")
            .with_validator(Range::new().with_min(0).with_max(4));
        let options = TranslateOptions {
            legacy_range_zero: true,
            ..TranslateOptions::default()
        };
        let res = translate(&field, options).unwrap();
        assert!(res.get("minimum").is_none());
        assert_eq!(res["maximum"], 4);
    }

    #[test]
    fn test_range_on_string_fails() {
        let field = FieldDescriptor::string("foo").with_validator(Range::new().with_min(1));
        assert!(matches!(
            translate(&field, TranslateOptions::default()),
            Err(AppError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_regexp_sets_pattern() {
        let field = FieldDescriptor::string("code").with_validator(Regexp::new("^[A-Z]{3}$"));
        let res = translate(&field, TranslateOptions::default()).unwrap();
        assert_eq!(res["pattern"], "^[A-Z]{3}$");
    }

    #[test]
    fn test_regexp_without_source_is_noop() {
        let field = FieldDescriptor::string("code").with_validator(Regexp::opaque());
        let res = translate(&field, TranslateOptions::default()).unwrap();
        assert_eq!(res, Value::Object(base_string()));
    }

    #[test]
    fn test_regexp_on_integer_fails() {
        let field = FieldDescriptor::integer("code").with_validator(Regexp::new("^1$"));
        assert!(translate(&field, TranslateOptions::default()).is_err());
    }

    #[test]
    fn test_custom_validator_uses_base() {
        let custom = CustomValidator::new("bounded")
            .with_base(Range::new().with_min(2).with_max(4));
        let field = FieldDescriptor::integer("foo").with_validator(custom);
        let res = translate(&field, TranslateOptions::default()).unwrap();
        assert_eq!(res["minimum"], 2);
        assert_eq!(res["maximum"], 4);
    }

    #[test]
    fn test_custom_validator_extension_wins_over_base() {
        let ext = Extensions::new().with_validator("even", |mut fragment, _, custom| {
            fragment.insert(
                "multipleOf".into(),
                custom.params.get("step").cloned().unwrap_or(json!(2)),
            );
            Ok(fragment)
        });
        let custom = CustomValidator::new("even")
            .with_base(Range::new().with_min(1))
            .with_param("step", 2);
        let field = FieldDescriptor::new("foo", FieldKind::Integer).with_validator(custom);
        let res =
            apply_validators(base_string(), &field, &ext, TranslateOptions::default()).unwrap();
        assert_eq!(res["multipleOf"], 2);
        assert!(res.get("minimum").is_none());
    }

    #[test]
    fn test_unknown_validator_strict_and_lenient() {
        let field = FieldDescriptor::string("foo").with_validator(CustomValidator::new("mystery"));
        assert!(matches!(
            translate(&field, TranslateOptions::default()),
            Err(AppError::UnsupportedType { .. })
        ));

        let lenient = TranslateOptions {
            strict: false,
            ..TranslateOptions::default()
        };
        assert_eq!(
            translate(&field, lenient).unwrap(),
            Value::Object(base_string())
        );
    }
}
