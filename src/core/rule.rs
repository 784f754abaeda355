//! Validator and filter rules
//!
//! A rule is either a name resolved against the engine's predicate table at
//! invocation time, or a caller-supplied function. Both are dispatched through
//! the same code path.

use crate::core::field::FieldDescriptor;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A validator callable: receives the scalar value and the resolved descriptor
pub type ValidatorFn = Arc<dyn Fn(&Value, &FieldDescriptor) -> Outcome + Send + Sync>;

/// A filter callable: synchronous value transformation
pub type FilterFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Result of invoking a validator
pub enum Outcome {
    /// The value is acceptable
    Valid,
    /// The value is rejected, optionally with a message
    Invalid(Option<String>),
    /// The verdict is deferred; `Err` carries the rejection reason
    Pending(BoxFuture<'static, Result<(), String>>),
}

impl Outcome {
    /// Reject with an explicit message
    pub fn invalid(message: impl Into<String>) -> Self {
        Outcome::Invalid(Some(message.into()))
    }

    /// Defer the verdict to a future
    pub fn pending<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        Outcome::Pending(future.boxed())
    }
}

impl From<bool> for Outcome {
    fn from(valid: bool) -> Self {
        if valid {
            Outcome::Valid
        } else {
            Outcome::Invalid(None)
        }
    }
}

impl From<Result<(), String>> for Outcome {
    fn from(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Outcome::Valid,
            Err(message) => Outcome::Invalid(Some(message)),
        }
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Valid => write!(f, "Valid"),
            Outcome::Invalid(message) => f.debug_tuple("Invalid").field(message).finish(),
            Outcome::Pending(_) => write!(f, "Pending(..)"),
        }
    }
}

/// Trait for stateful asynchronous validators
///
/// Useful for checks that need a handle to something external, such as a
/// uniqueness lookup against a database pool.
///
/// ```rust,ignore
/// struct UniqueUsername { pool: PgPool }
///
/// #[async_trait]
/// impl AsyncValidator for UniqueUsername {
///     async fn validate(&self, value: &Value, _field: &FieldDescriptor) -> Result<(), String> {
///         let taken = lookup(&self.pool, value.as_str().unwrap_or_default()).await;
///         if taken { Err("Username already taken".into()) } else { Ok(()) }
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncValidator: Send + Sync {
    async fn validate(&self, value: &Value, field: &FieldDescriptor) -> Result<(), String>;
}

/// Either a named primitive or a caller-supplied function
#[derive(Clone)]
pub enum Rule<F> {
    Named(String),
    Custom(F),
}

/// Rule evaluated against each (element of a) value
pub type ValidatorRule = Rule<ValidatorFn>;

/// Rule transforming the whole value
pub type FilterRule = Rule<FilterFn>;

impl<F> Rule<F> {
    /// Reference a primitive of the predicate table by name
    pub fn named(name: impl Into<String>) -> Self {
        Rule::Named(name.into())
    }

    /// Name of the primitive, `None` for custom functions
    pub fn name(&self) -> Option<&str> {
        match self {
            Rule::Named(name) => Some(name),
            Rule::Custom(_) => None,
        }
    }

    /// Label used in logs
    pub(crate) fn label(&self) -> &str {
        self.name().unwrap_or("custom")
    }
}

impl<F> fmt::Debug for Rule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Rule::Custom(_) => write!(f, "Custom(<fn>)"),
        }
    }
}

impl<F> From<&str> for Rule<F> {
    fn from(name: &str) -> Self {
        Rule::named(name)
    }
}

impl<F> From<String> for Rule<F> {
    fn from(name: String) -> Self {
        Rule::Named(name)
    }
}

impl Rule<ValidatorFn> {
    /// Wrap a synchronous validator; it may return `bool`, `Result<(), String>` or an [`Outcome`]
    pub fn custom<F, O>(validator: F) -> Self
    where
        F: Fn(&Value, &FieldDescriptor) -> O + Send + Sync + 'static,
        O: Into<Outcome>,
    {
        Rule::Custom(validator_fn(validator))
    }

    /// Wrap an asynchronous validator
    pub fn deferred<F, Fut>(validator: F) -> Self
    where
        F: Fn(Value, FieldDescriptor) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        Rule::Custom(deferred_fn(validator))
    }

    /// Wrap an [`AsyncValidator`] implementation
    pub fn from_validator<V>(validator: V) -> Self
    where
        V: AsyncValidator + 'static,
    {
        let validator = Arc::new(validator);
        Rule::Custom(Arc::new(move |value: &Value, field: &FieldDescriptor| {
            let validator = Arc::clone(&validator);
            let value = value.clone();
            let field = field.clone();
            Outcome::pending(async move { validator.validate(&value, &field).await })
        }))
    }
}

impl Rule<FilterFn> {
    /// Wrap a filter function
    pub fn custom<F>(filter: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Rule::Custom(Arc::new(filter))
    }
}

pub(crate) fn validator_fn<F, O>(validator: F) -> ValidatorFn
where
    F: Fn(&Value, &FieldDescriptor) -> O + Send + Sync + 'static,
    O: Into<Outcome>,
{
    Arc::new(move |value: &Value, field: &FieldDescriptor| validator(value, field).into())
}

pub(crate) fn deferred_fn<F, Fut>(validator: F) -> ValidatorFn
where
    F: Fn(Value, FieldDescriptor) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), String>> + Send + 'static,
{
    Arc::new(move |value: &Value, field: &FieldDescriptor| {
        Outcome::pending(validator(value.clone(), field.clone()))
    })
}
