//! Field declarations, resolved descriptors and schemas

use crate::core::rule::{AsyncValidator, FilterRule, Outcome, ValidatorRule};
use indexmap::IndexMap;
use serde_json::Value;
use std::future::Future;

/// A normalized record, keyed by schema field key in schema order
pub type Record = IndexMap<String, Value>;

/// `null` and `""` are empty; `0`, `false` and `[]` are not
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// User-authored description of one field
///
/// ```rust,ignore
/// let colors = FieldDeclaration::new()
///     .type_tag("string")
///     .repeated()
///     .validate_with(|value, _| value.as_str().is_some_and(|s| s.starts_with('#')))
///     .filter("toLower");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldDeclaration {
    /// Key used to read the input record; defaults to the schema key
    pub name: Option<String>,
    /// Type tag looked up in the registry; defaults to `any`
    pub type_tag: Option<String>,
    pub required: bool,
    /// Substituted when the incoming value is empty
    pub default: Option<Value>,
    /// Overrides every message produced for this field
    pub error_message: Option<String>,
    /// Free-form context for validators (allowed values for `isIn`)
    pub options: Option<Value>,
    pub validators: Vec<ValidatorRule>,
    pub filters: Vec<FilterRule>,
    /// The value is a sequence; validators run on every element
    pub repeated: bool,
}

impl FieldDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn type_tag(mut self, type_tag: impl Into<String>) -> Self {
        self.type_tag = Some(type_tag.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn options(mut self, options: impl Into<Value>) -> Self {
        self.options = Some(options.into());
        self
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Append a validator rule
    pub fn validator(mut self, rule: impl Into<ValidatorRule>) -> Self {
        self.validators.push(rule.into());
        self
    }

    /// Append a synchronous custom validator
    pub fn validate_with<F, O>(self, validator: F) -> Self
    where
        F: Fn(&Value, &FieldDescriptor) -> O + Send + Sync + 'static,
        O: Into<Outcome>,
    {
        self.validator(ValidatorRule::custom(validator))
    }

    /// Append an asynchronous custom validator
    pub fn validate_async<F, Fut>(self, validator: F) -> Self
    where
        F: Fn(Value, FieldDescriptor) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.validator(ValidatorRule::deferred(validator))
    }

    /// Append an [`AsyncValidator`] implementation
    pub fn validate_by<V>(self, validator: V) -> Self
    where
        V: AsyncValidator + 'static,
    {
        self.validator(ValidatorRule::from_validator(validator))
    }

    /// Append a filter rule
    pub fn filter(mut self, rule: impl Into<FilterRule>) -> Self {
        self.filters.push(rule.into());
        self
    }

    /// Append a custom filter
    pub fn filter_with<F>(self, filter: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.filter(FilterRule::custom(filter))
    }

    /// Name used to read the input record when the field lives under `key`
    pub fn effective_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(key)
    }
}

/// A declaration merged with its type's registry defaults
///
/// Registry validators and filters come first, declared ones after.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_tag: String,
    pub required: bool,
    pub default: Option<Value>,
    pub error_message: Option<String>,
    pub options: Option<Value>,
    pub validators: Vec<ValidatorRule>,
    pub filters: Vec<FilterRule>,
    pub repeated: bool,
}

impl FieldDescriptor {
    /// A bare descriptor with no rules, mostly useful when calling predicates directly
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            required: false,
            default: None,
            error_message: None,
            options: None,
            validators: Vec::new(),
            filters: Vec::new(),
            repeated: false,
        }
    }

    pub fn with_options(mut self, options: impl Into<Value>) -> Self {
        self.options = Some(options.into());
        self
    }
}

/// Ordered mapping of field key to declaration
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: IndexMap<String, FieldDeclaration>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn field(mut self, key: impl Into<String>, declaration: FieldDeclaration) -> Self {
        self.insert(key, declaration);
        self
    }

    /// Insert or replace a field
    pub fn insert(&mut self, key: impl Into<String>, declaration: FieldDeclaration) {
        self.fields.insert(key.into(), declaration);
    }

    pub fn get(&self, key: &str) -> Option<&FieldDeclaration> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, FieldDeclaration> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldDeclaration)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, FieldDeclaration)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
