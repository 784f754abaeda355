//! Value validator: default, required check, validators, filters

use super::engine::Engine;
use crate::core::error::{REQUIRED_MESSAGE, RuleKind, ValidationError};
use crate::core::field::{FieldDescriptor, is_empty_value};
use crate::core::rule::{Outcome, Rule, ValidatorFn, ValidatorRule};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, trace, warn};

/// Message given to a deferred validator that outlives the engine's deadline
pub const TIMEOUT_MESSAGE: &str = "Validation timed out";

/// Validate and normalize one value against a resolved descriptor
pub(crate) async fn run(
    engine: &Engine,
    descriptor: &FieldDescriptor,
    raw: Value,
) -> Result<Value, ValidationError> {
    let result = normalize(engine, descriptor, raw).await;
    if let Err(error) = &result {
        debug!(field = %descriptor.name, error = %error, "field validation failed");
    }
    result
}

async fn normalize(
    engine: &Engine,
    descriptor: &FieldDescriptor,
    raw: Value,
) -> Result<Value, ValidationError> {
    let value = substitute_default(descriptor, raw);

    if descriptor.required && is_missing(&value) {
        return Err(ValidationError::RequiredFieldMissing {
            message: descriptor
                .error_message
                .clone()
                .unwrap_or_else(|| REQUIRED_MESSAGE.to_string()),
        });
    }

    // Optional and empty: nothing to validate, but filters still see it
    if descriptor.required || !is_empty_value(&value) {
        run_validators(engine, descriptor, &value).await?;
    }
    apply_filters(engine, descriptor, value)
}

fn substitute_default(descriptor: &FieldDescriptor, raw: Value) -> Value {
    match &descriptor.default {
        Some(default) if is_empty_value(&raw) => {
            trace!(field = %descriptor.name, default = %default, "substituting default");
            default.clone()
        }
        _ => raw,
    }
}

fn is_missing(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        other => is_empty_value(other),
    }
}

/// Run every validator against every element, all at once
///
/// All checks are driven to completion. The first failure to settle is the
/// one reported.
async fn run_validators(
    engine: &Engine,
    descriptor: &FieldDescriptor,
    value: &Value,
) -> Result<(), ValidationError> {
    let elements: Vec<&Value> = match value {
        Value::Array(items) if descriptor.repeated => items.iter().collect(),
        other => vec![other],
    };

    let mut checks = FuturesUnordered::new();
    for element in elements {
        for rule in &descriptor.validators {
            checks.push(check(engine, descriptor, rule, element));
        }
    }

    let mut first_failure = None;
    while let Some(result) = checks.next().await {
        if let Err(error) = result {
            first_failure.get_or_insert(error);
        }
    }

    match first_failure {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

async fn check(
    engine: &Engine,
    descriptor: &FieldDescriptor,
    rule: &ValidatorRule,
    element: &Value,
) -> Result<(), ValidationError> {
    let validator = lookup_validator(engine, rule)?;

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| validator(element, descriptor)))
        .map_err(|payload| {
            warn!(
                field = %descriptor.name,
                validator = rule.label(),
                "validator panicked"
            );
            rejection(descriptor, Some(panic_message(payload.as_ref())), element)
        })?;

    let verdict = match outcome {
        Outcome::Valid => Ok(()),
        Outcome::Invalid(message) => Err(message),
        Outcome::Pending(future) => settle(engine, descriptor, rule, future).await,
    };

    verdict.map_err(|message| rejection(descriptor, message, element))
}

fn lookup_validator<'a>(
    engine: &'a Engine,
    rule: &'a ValidatorRule,
) -> Result<&'a ValidatorFn, ValidationError> {
    match rule {
        Rule::Custom(validator) => Ok(validator),
        Rule::Named(name) => engine.predicates().validator(name).ok_or_else(|| {
            warn!(validator = %name, "unknown validator");
            ValidationError::UnknownRule {
                kind: RuleKind::Validator,
                name: name.clone(),
            }
        }),
    }
}

async fn settle(
    engine: &Engine,
    descriptor: &FieldDescriptor,
    rule: &ValidatorRule,
    future: BoxFuture<'static, Result<(), String>>,
) -> Result<(), Option<String>> {
    let guarded = AssertUnwindSafe(future).catch_unwind();

    let settled = match engine.deferred_timeout() {
        Some(limit) => match tokio::time::timeout(limit, guarded).await {
            Ok(settled) => settled,
            Err(_) => {
                warn!(
                    field = %descriptor.name,
                    validator = rule.label(),
                    timeout_ms = limit.as_millis() as u64,
                    "deferred validator timed out"
                );
                return Err(Some(TIMEOUT_MESSAGE.to_string()));
            }
        },
        None => guarded.await,
    };

    match settled {
        Ok(result) => result.map_err(Some),
        Err(payload) => {
            warn!(
                field = %descriptor.name,
                validator = rule.label(),
                "deferred validator panicked"
            );
            Err(Some(panic_message(payload.as_ref())))
        }
    }
}

/// Apply the filter chain in order to the whole value
fn apply_filters(
    engine: &Engine,
    descriptor: &FieldDescriptor,
    value: Value,
) -> Result<Value, ValidationError> {
    descriptor.filters.iter().try_fold(value, |value, rule| {
        let filter = match rule {
            Rule::Custom(filter) => filter,
            Rule::Named(name) => engine.predicates().filter(name).ok_or_else(|| {
                warn!(filter = %name, "unknown filter");
                ValidationError::UnknownRule {
                    kind: RuleKind::Filter,
                    name: name.clone(),
                }
            })?,
        };

        trace!(field = %descriptor.name, filter = rule.label(), "applying filter");

        panic::catch_unwind(AssertUnwindSafe(|| filter(value))).map_err(|payload| {
            warn!(
                field = %descriptor.name,
                filter = rule.label(),
                "filter panicked"
            );
            let message = descriptor
                .error_message
                .clone()
                .unwrap_or_else(|| panic_message(payload.as_ref()));
            ValidationError::failed(message)
        })
    })
}

/// Build the error for a rejected element
///
/// The field's `error_message` wins over the validator's own message, which
/// wins over the generic fallback.
fn rejection(descriptor: &FieldDescriptor, message: Option<String>, element: &Value) -> ValidationError {
    let message = descriptor
        .error_message
        .clone()
        .or(message.filter(|message| !message.is_empty()))
        .unwrap_or_else(|| format!("Invalid value: {}", display_value(element)));
    ValidationError::failed(message)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Validator panicked".to_string()
    }
}
