//! Predicate table: the named validators and filters rules resolve against

use super::{filters, validators};
use crate::core::field::FieldDescriptor;
use crate::core::rule::{FilterFn, Outcome, ValidatorFn, deferred_fn, validator_fn};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Named validator and filter primitives
///
/// Unlike the type registry, registering a name that already exists replaces
/// the previous primitive, so built-ins can be swapped for stricter versions.
#[derive(Clone, Default)]
pub struct PredicateTable {
    validators: HashMap<String, ValidatorFn>,
    filters: HashMap<String, FilterFn>,
}

impl PredicateTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding every built-in validator and filter
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        validators::register_builtins(&mut table);
        filters::register_builtins(&mut table);
        table
    }

    /// Register a synchronous validator
    pub fn register_validator<F, O>(&mut self, name: impl Into<String>, validator: F)
    where
        F: Fn(&Value, &FieldDescriptor) -> O + Send + Sync + 'static,
        O: Into<Outcome>,
    {
        self.validators.insert(name.into(), validator_fn(validator));
    }

    /// Register an asynchronous validator
    pub fn register_async_validator<F, Fut>(&mut self, name: impl Into<String>, validator: F)
    where
        F: Fn(Value, FieldDescriptor) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.validators.insert(name.into(), deferred_fn(validator));
    }

    /// Register a filter
    pub fn register_filter<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(filter));
    }

    pub fn validator(&self, name: &str) -> Option<&ValidatorFn> {
        self.validators.get(name)
    }

    pub fn filter(&self, name: &str) -> Option<&FilterFn> {
        self.filters.get(name)
    }

    /// Registered validator names, sorted
    pub fn validator_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.validators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered filter names, sorted
    pub fn filter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for PredicateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateTable")
            .field("validators", &self.validator_names())
            .field("filters", &self.filter_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_table_is_empty() {
        let table = PredicateTable::new();
        assert!(table.validator_names().is_empty());
        assert!(table.filter_names().is_empty());
    }

    #[test]
    fn test_builtins_cover_type_table() {
        let table = PredicateTable::with_builtins();
        assert_eq!(table.validator_names().len(), 13);
        assert_eq!(table.filter_names().len(), 10);
        assert!(table.validator("isMongoId").is_some());
        assert!(table.filter("normalizeEmail").is_some());
        assert!(table.validator("isHexColor").is_none());
    }

    #[test]
    fn test_register_replaces_existing_primitive() {
        let mut table = PredicateTable::with_builtins();
        table.register_validator("isEmail", |value: &Value, _: &FieldDescriptor| {
            value.as_str().is_some_and(|s| s.ends_with("@corp.example"))
        });

        let is_email = table.validator("isEmail").expect("isEmail should exist");
        let field = FieldDescriptor::new("email", "email");
        assert!(matches!(is_email(&json!("a@corp.example"), &field), Outcome::Valid));
        assert!(matches!(
            is_email(&json!("a@gmail.com"), &field),
            Outcome::Invalid(None)
        ));
    }

    #[test]
    fn test_register_filter() {
        let mut table = PredicateTable::new();
        table.register_filter("double", |value: Value| {
            value.as_i64().map_or(Value::Null, |n| json!(n * 2))
        });
        let double = table.filter("double").expect("double should exist");
        assert_eq!(double(json!(21)), json!(42));
    }

    #[tokio::test]
    async fn test_register_async_validator() {
        let mut table = PredicateTable::new();
        table.register_async_validator("isAvailable", |value, _| async move {
            if value == json!("taken") {
                Err("Already taken".to_string())
            } else {
                Ok(())
            }
        });

        let validator = table.validator("isAvailable").expect("should exist");
        let field = FieldDescriptor::new("username", "string");
        let Outcome::Pending(check) = validator(&json!("taken"), &field) else {
            panic!("expected a pending outcome");
        };
        assert_eq!(check.await, Err("Already taken".to_string()));
    }
}
