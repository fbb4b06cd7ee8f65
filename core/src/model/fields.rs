//! # Field Descriptors
//!
//! The per-attribute description consumed by the type mapper, the validator
//! translators and the schema walker.

use crate::error::AppResult;
use crate::model::schema::Schema;
use crate::model::validators::Validator;
use crate::model::Fragment;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Metadata key holding the wrapped metadata sub-mapping.
pub const METADATA_KEY: &str = "metadata";

/// Metadata key holding the alternate public name of a field.
pub const NAME_OVERRIDE_KEY: &str = "name";

/// Metadata key holding a literal fragment that replaces the mapped type.
pub const TYPE_MAPPING_KEY: &str = "_jsonschema_type_mapping";

/// The closed set of declared value types.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Free text.
    String,
    /// An e-mail address (string).
    Email,
    /// A URL (string).
    Url,
    /// Opaque value, emitted as a string.
    Raw,
    /// Arbitrary-precision number.
    Number,
    /// Whole number.
    Integer,
    /// Floating point number.
    Float,
    /// Fixed-point decimal.
    Decimal,
    /// `true` / `false`.
    Boolean,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time.
    DateTime,
    /// A duration.
    TimeDelta,
    /// RFC 4122 identifier.
    Uuid,
    /// String-keyed mapping, optionally typed by a value descriptor.
    Dict(Option<Box<FieldDescriptor>>),
    /// Homogeneous sequence of the inner descriptor.
    List(Box<FieldDescriptor>),
    /// Reference to another schema.
    Nested(NestedField),
    /// One of a fixed set of member names.
    Enum(Vec<String>),
    /// Any of the candidate descriptors.
    Union(Vec<FieldDescriptor>),
    /// A kind outside the built-in table, mapped through generator extensions.
    Custom(String),
}

impl FieldKind {
    /// Resolves a scalar kind from its canonical name.
    ///
    /// Composite kinds (`dict`, `list`, `nested`, `enum`, `union`) need extra
    /// data and are not returned here.
    pub fn scalar(name: &str) -> Option<FieldKind> {
        let kind = match name {
            "string" | "str" => FieldKind::String,
            "email" => FieldKind::Email,
            "url" => FieldKind::Url,
            "raw" => FieldKind::Raw,
            "number" => FieldKind::Number,
            "integer" | "int" => FieldKind::Integer,
            "float" => FieldKind::Float,
            "decimal" => FieldKind::Decimal,
            "boolean" | "bool" => FieldKind::Boolean,
            "date" => FieldKind::Date,
            "time" => FieldKind::Time,
            "datetime" => FieldKind::DateTime,
            "timedelta" => FieldKind::TimeDelta,
            "uuid" => FieldKind::Uuid,
            _ => return None,
        };
        Some(kind)
    }

    /// The canonical name of this kind.
    pub fn name(&self) -> &str {
        match self {
            FieldKind::String => "string",
            FieldKind::Email => "email",
            FieldKind::Url => "url",
            FieldKind::Raw => "raw",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Decimal => "decimal",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::DateTime => "datetime",
            FieldKind::TimeDelta => "timedelta",
            FieldKind::Uuid => "uuid",
            FieldKind::Dict(_) => "dict",
            FieldKind::List(_) => "list",
            FieldKind::Nested(_) => "nested",
            FieldKind::Enum(_) => "enum",
            FieldKind::Union(_) => "union",
            FieldKind::Custom(name) => name,
        }
    }

    /// String kinds accept length and pattern constraints.
    pub fn is_string_like(&self) -> bool {
        matches!(self, FieldKind::String | FieldKind::Email | FieldKind::Url)
    }

    /// Numeric kinds accept range constraints.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldKind::Number | FieldKind::Integer | FieldKind::Float | FieldKind::Decimal
        )
    }

    /// Collection kinds take `minItems` / `maxItems` for length constraints.
    pub fn is_collection(&self) -> bool {
        matches!(self, FieldKind::List(_) | FieldKind::Nested(_))
    }
}

/// Where a nested field points.
#[derive(Debug, Clone)]
pub enum NestedTarget {
    /// An already-built schema.
    Instance(Arc<Schema>),
    /// A schema looked up by name in the registry at dump time.
    Named(String),
}

impl From<Schema> for NestedTarget {
    fn from(schema: Schema) -> Self {
        NestedTarget::Instance(Arc::new(schema))
    }
}

impl From<Arc<Schema>> for NestedTarget {
    fn from(schema: Arc<Schema>) -> Self {
        NestedTarget::Instance(schema)
    }
}

impl From<&str> for NestedTarget {
    fn from(name: &str) -> Self {
        NestedTarget::Named(name.to_string())
    }
}

impl From<String> for NestedTarget {
    fn from(name: String) -> Self {
        NestedTarget::Named(name)
    }
}

/// Reference from a field to another schema.
#[derive(Debug, Clone)]
pub struct NestedField {
    /// The referenced schema.
    pub target: NestedTarget,
    /// The field holds a collection of the referenced schema.
    pub many: bool,
    /// Allow-list of visible nested fields (dotted paths reach deeper).
    pub only: Option<Vec<String>>,
    /// Deny-list of nested fields (dotted paths reach deeper).
    pub exclude: Vec<String>,
}

impl NestedField {
    /// A single-valued reference with no restrictions.
    pub fn to(target: impl Into<NestedTarget>) -> Self {
        Self {
            target: target.into(),
            many: false,
            only: None,
            exclude: Vec::new(),
        }
    }

    /// Sets the collection flag.
    pub fn with_many(mut self, many: bool) -> Self {
        self.many = many;
        self
    }

    /// Restricts the nested schema to the given fields.
    pub fn with_only<I, S>(mut self, only: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(only.into_iter().map(Into::into).collect());
        self
    }

    /// Hides the given fields of the nested schema.
    pub fn with_exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }
}

/// Signature of a field-supplied type mapping hook.
pub type TypeMappingHook = Arc<dyn Fn(&FieldDescriptor) -> AppResult<Fragment> + Send + Sync>;

/// A field-supplied fragment that fully replaces the type mapper's output.
#[derive(Clone)]
pub enum TypeOverride {
    /// A fixed fragment.
    Literal(Fragment),
    /// A function producing the fragment from the field.
    Handler(TypeMappingHook),
}

impl TypeOverride {
    /// Wraps a closure as a handler override.
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&FieldDescriptor) -> AppResult<Fragment> + Send + Sync + 'static,
    {
        TypeOverride::Handler(Arc::new(f))
    }
}

impl fmt::Debug for TypeOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeOverride::Literal(fragment) => f.debug_tuple("Literal").field(fragment).finish(),
            TypeOverride::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

/// One declared attribute of a schema.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Declared attribute name.
    pub name: String,
    /// Public name used as the property key; defaults to `name`.
    pub data_key: Option<String>,
    /// Source attribute; used as the property `title` when set.
    pub attribute: Option<String>,
    /// Declared value type.
    pub kind: FieldKind,
    /// Must be present in input.
    pub required: bool,
    /// Admits `null`.
    pub nullable: bool,
    /// Only ever emitted, never accepted.
    pub read_only: bool,
    /// Default value; `None` means absent.
    pub default: Option<Value>,
    /// Arbitrary key/value metadata copied into the fragment.
    pub metadata: IndexMap<String, Value>,
    /// Attached validators, in declaration order.
    pub validators: Vec<Validator>,
    /// Replaces the type mapper's output when set.
    pub type_override: Option<TypeOverride>,
}

impl FieldDescriptor {
    /// Creates an optional, non-nullable field without metadata or validators.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            data_key: None,
            attribute: None,
            kind,
            required: false,
            nullable: false,
            read_only: false,
            default: None,
            metadata: IndexMap::new(),
            validators: Vec::new(),
            type_override: None,
        }
    }

    /// A `string` field.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    /// An `integer` field.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    /// A `list` field of `inner`.
    pub fn list(name: impl Into<String>, inner: FieldDescriptor) -> Self {
        Self::new(name, FieldKind::List(Box::new(inner)))
    }

    /// A `nested` field.
    pub fn nested(name: impl Into<String>, nested: NestedField) -> Self {
        Self::new(name, FieldKind::Nested(nested))
    }

    /// Sets the required flag.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the nullable flag.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Sets the read-only flag.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets the public name.
    pub fn with_data_key(mut self, data_key: impl Into<String>) -> Self {
        self.data_key = Some(data_key.into());
        self
    }

    /// Sets the source attribute.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Adds one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Appends a validator.
    pub fn with_validator(mut self, validator: impl Into<Validator>) -> Self {
        self.validators.push(validator.into());
        self
    }

    /// Sets the type mapping override.
    pub fn with_type_override(mut self, type_override: TypeOverride) -> Self {
        self.type_override = Some(type_override);
        self
    }

    /// The key under which the field is exposed.
    ///
    /// With `prefer_override`, a string `name` metadata entry wins over `data_key`.
    pub fn public_name(&self, prefer_override: bool) -> &str {
        if prefer_override {
            if let Some(Value::String(name)) = self.metadata_value(NAME_OVERRIDE_KEY) {
                return name;
            }
        }
        self.data_key.as_deref().unwrap_or(&self.name)
    }

    /// The property title.
    pub fn title(&self) -> &str {
        self.attribute.as_deref().unwrap_or(&self.name)
    }

    /// Looks up a metadata key, direct entries first, then the wrapped sub-mapping.
    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key).or_else(|| {
            self.metadata
                .get(METADATA_KEY)
                .and_then(Value::as_object)
                .and_then(|wrapped| wrapped.get(key))
        })
    }

    /// Metadata entries to copy into a fragment.
    ///
    /// Wrapped entries come first and direct entries override them; reserved
    /// keys are dropped.
    pub fn schema_metadata(&self) -> IndexMap<String, Value> {
        let mut merged = IndexMap::new();
        if let Some(Value::Object(wrapped)) = self.metadata.get(METADATA_KEY) {
            for (key, value) in wrapped {
                merged.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in &self.metadata {
            merged.insert(key.clone(), value.clone());
        }
        merged.retain(|key, _| !is_reserved_metadata_key(key));
        merged
    }

    /// The nested reference of this field, looking through lists.
    pub fn nested_mut(&mut self) -> Option<&mut NestedField> {
        match &mut self.kind {
            FieldKind::Nested(nested) => Some(nested),
            FieldKind::List(inner) => inner.nested_mut(),
            _ => None,
        }
    }
}

fn is_reserved_metadata_key(key: &str) -> bool {
    matches!(key, METADATA_KEY | NAME_OVERRIDE_KEY | TYPE_MAPPING_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_public_name_defaults() {
        let field = FieldDescriptor::string("street");
        assert_eq!(field.public_name(false), "street");

        let field = field.with_data_key("streetName");
        assert_eq!(field.public_name(false), "streetName");
    }

    #[test]
    fn test_public_name_override_needs_opt_in() {
        let field = FieldDescriptor::string("street")
            .with_data_key("streetName")
            .with_metadata("name", "road");
        assert_eq!(field.public_name(false), "streetName");
        assert_eq!(field.public_name(true), "road");
    }

    #[test]
    fn test_public_name_override_from_wrapped_metadata() {
        let field = FieldDescriptor::string("street")
            .with_metadata("metadata", json!({"name": "road"}));
        assert_eq!(field.public_name(true), "road");
    }

    #[test]
    fn test_title_prefers_attribute() {
        let field = FieldDescriptor::string("created_iso").with_attribute("created");
        assert_eq!(field.title(), "created");
    }

    #[test]
    fn test_schema_metadata_direct_wins_and_reserved_dropped() {
        let field = FieldDescriptor::string("f")
            .with_metadata("metadata", json!({"description": "wrapped", "foo": "Bar"}))
            .with_metadata("description", "direct")
            .with_metadata("name", "alias")
            .with_metadata(TYPE_MAPPING_KEY, json!({"type": "string"}));

        let merged = field.schema_metadata();
        assert_eq!(merged.get("description"), Some(&json!("direct")));
        assert_eq!(merged.get("foo"), Some(&json!("Bar")));
        assert!(!merged.contains_key("metadata"));
        assert!(!merged.contains_key("name"));
        assert!(!merged.contains_key(TYPE_MAPPING_KEY));
    }

    #[test]
    fn test_kind_classes() {
        assert!(FieldKind::Email.is_string_like());
        assert!(!FieldKind::Raw.is_string_like());
        assert!(FieldKind::Decimal.is_numeric());
        assert!(!FieldKind::Boolean.is_numeric());
        assert!(FieldKind::List(Box::new(FieldDescriptor::string(""))).is_collection());
        assert_eq!(FieldKind::scalar("int").map(|k| k.name().to_string()), Some("integer".into()));
        assert!(FieldKind::scalar("colour").is_none());
    }

    #[test]
    fn test_nested_mut_looks_through_lists() {
        let mut field = FieldDescriptor::list(
            "items",
            FieldDescriptor::nested("", NestedField::to("Inner")),
        );
        assert!(field.nested_mut().is_some());
        assert!(FieldDescriptor::string("x").nested_mut().is_none());
    }
}
