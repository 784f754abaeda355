//! Engine: an immutable registry and predicate table shared by every call

use super::normalizer::{self, ANONYMOUS_FIELD};
use super::predicates::PredicateTable;
use super::{record, value};
use crate::core::error::{RegistryError, ValidationError};
use crate::core::field::{FieldDeclaration, FieldDescriptor, Record, Schema};
use crate::core::registry::{TypeDefinition, TypeRegistry};
use crate::core::rule::Outcome;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

#[derive(Debug)]
struct EngineInner {
    registry: TypeRegistry,
    predicates: PredicateTable,
    deferred_timeout: Option<Duration>,
}

/// Validation engine
///
/// Cheap to clone; clones share the same registry and predicate table, which
/// are never written to once the engine is built.
///
/// # Example
///
/// ```ignore
/// let engine = Engine::builder()
///     .register_type("hexcolor", TypeDefinition::new().filter("toLower").validator("isHexColor"))?
///     .register_validator("isHexColor", |value: &Value, _: &FieldDescriptor| {
///         value.as_str().is_some_and(|s| s.starts_with('#') && s.len() == 7)
///     })
///     .build();
///
/// let color = engine
///     .validate_value(&FieldDeclaration::new().type_tag("hexcolor"), json!("#AABBCC"))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Engine with the built-in types, validators and filters
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Process-wide default engine, built on first use
    pub fn shared() -> &'static Engine {
        static SHARED: OnceLock<Engine> = OnceLock::new();
        SHARED.get_or_init(Engine::new)
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.inner.registry
    }

    pub fn predicates(&self) -> &PredicateTable {
        &self.inner.predicates
    }

    pub fn deferred_timeout(&self) -> Option<Duration> {
        self.inner.deferred_timeout
    }

    /// Merge a declaration with its type's registry defaults
    ///
    /// Fails with `UnknownType` for an unregistered type and with
    /// `MissingName` when the declaration has no usable name.
    pub fn resolve_field_descriptor(
        &self,
        declaration: &FieldDeclaration,
    ) -> Result<FieldDescriptor, ValidationError> {
        normalizer::resolve(self.registry(), declaration, None)
    }

    /// Resolve a declaration living under `key` in a schema
    pub(crate) fn resolve_in_schema(
        &self,
        declaration: &FieldDeclaration,
        key: &str,
    ) -> Result<FieldDescriptor, ValidationError> {
        normalizer::resolve(self.registry(), declaration, Some(key))
    }

    /// Validate and normalize a single value
    ///
    /// Declarations without a name are accepted here.
    pub async fn validate_value(
        &self,
        declaration: &FieldDeclaration,
        raw: Value,
    ) -> Result<Value, ValidationError> {
        let descriptor = normalizer::resolve(self.registry(), declaration, Some(ANONYMOUS_FIELD))?;
        value::run(self, &descriptor, raw).await
    }

    /// Validate a single value against an already resolved descriptor
    pub async fn validate_descriptor(
        &self,
        descriptor: &FieldDescriptor,
        raw: Value,
    ) -> Result<Value, ValidationError> {
        value::run(self, descriptor, raw).await
    }

    /// Validate a whole record
    ///
    /// Returns the normalized record keyed by schema key, or
    /// `SchemaValidationFailed` listing every failed field.
    pub async fn validate_record(
        &self,
        schema: &Schema,
        data: &Value,
    ) -> Result<Record, ValidationError> {
        record::run(self, schema, data).await
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Engine`]
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    registry: TypeRegistry,
    predicates: PredicateTable,
    deferred_timeout: Option<Duration>,
}

impl EngineBuilder {
    /// Builder preloaded with the built-in types and primitives
    pub fn new() -> Self {
        Self {
            registry: TypeRegistry::with_builtin_types(),
            predicates: PredicateTable::with_builtins(),
            deferred_timeout: None,
        }
    }

    /// Builder with no types and no primitives at all
    pub fn empty() -> Self {
        Self {
            registry: TypeRegistry::new(),
            predicates: PredicateTable::new(),
            deferred_timeout: None,
        }
    }

    /// Register a type tag; tags are never replaced
    pub fn register_type(
        mut self,
        type_tag: impl Into<String>,
        definition: TypeDefinition,
    ) -> Result<Self, RegistryError> {
        self.registry.register(type_tag, definition)?;
        Ok(self)
    }

    /// Register a named validator, replacing any previous one
    pub fn register_validator<F, O>(mut self, name: impl Into<String>, validator: F) -> Self
    where
        F: Fn(&Value, &FieldDescriptor) -> O + Send + Sync + 'static,
        O: Into<Outcome>,
    {
        self.predicates.register_validator(name, validator);
        self
    }

    /// Register a named asynchronous validator, replacing any previous one
    pub fn register_async_validator<F, Fut>(mut self, name: impl Into<String>, validator: F) -> Self
    where
        F: Fn(Value, FieldDescriptor) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.predicates.register_async_validator(name, validator);
        self
    }

    /// Register a named filter, replacing any previous one
    pub fn register_filter<F>(mut self, name: impl Into<String>, filter: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.predicates.register_filter(name, filter);
        self
    }

    /// Fail deferred validators that take longer than `limit`
    pub fn deferred_timeout(mut self, limit: Duration) -> Self {
        self.deferred_timeout = Some(limit);
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            inner: Arc::new(EngineInner {
                registry: self.registry,
                predicates: self.predicates,
                deferred_timeout: self.deferred_timeout,
            }),
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Engine::resolve_field_descriptor`] on the shared engine
pub fn resolve_field_descriptor(
    declaration: &FieldDeclaration,
) -> Result<FieldDescriptor, ValidationError> {
    Engine::shared().resolve_field_descriptor(declaration)
}

/// [`Engine::validate_value`] on the shared engine
pub async fn validate_value(
    declaration: &FieldDeclaration,
    raw: Value,
) -> Result<Value, ValidationError> {
    Engine::shared().validate_value(declaration, raw).await
}

/// [`Engine::validate_record`] on the shared engine
pub async fn validate_record(schema: &Schema, data: &Value) -> Result<Record, ValidationError> {
    Engine::shared().validate_record(schema, data).await
}
