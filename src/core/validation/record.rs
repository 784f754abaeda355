//! Schema validator: every field of a record, concurrently

use super::engine::Engine;
use super::value;
use crate::core::error::{FieldErrors, ValidationError};
use crate::core::field::{Record, Schema};
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use std::collections::HashMap;

/// Validate `data` against `schema`
///
/// Descriptors are resolved up front so a misconfigured schema fails before
/// any validator runs. Fields are then validated concurrently and their
/// results land in per-key slots, reassembled in schema order.
pub(crate) async fn run(
    engine: &Engine,
    schema: &Schema,
    data: &Value,
) -> Result<Record, ValidationError> {
    let mut descriptors = Vec::with_capacity(schema.len());
    for (key, declaration) in schema.iter() {
        let descriptor = engine.resolve_in_schema(declaration, key)?;
        descriptors.push((key.as_str(), descriptor));
    }

    let mut fields: FuturesUnordered<_> = descriptors
        .iter()
        .map(|(key, descriptor)| async move {
            let raw = data.get(&descriptor.name).cloned().unwrap_or(Value::Null);
            (*key, value::run(engine, descriptor, raw).await)
        })
        .collect();

    let mut slots = HashMap::with_capacity(descriptors.len());
    while let Some((key, result)) = fields.next().await {
        slots.insert(key, result);
    }

    assemble(schema, slots)
}

fn assemble(
    schema: &Schema,
    mut slots: HashMap<&str, Result<Value, ValidationError>>,
) -> Result<Record, ValidationError> {
    let mut record = Record::with_capacity(schema.len());
    let mut errors = FieldErrors::new();

    for key in schema.keys() {
        match slots.remove(key) {
            Some(Ok(value)) => {
                record.insert(key.to_string(), value);
            }
            // A rule missing from the predicate table is a schema problem, not an input one
            Some(Err(error)) if error.is_configuration_error() => return Err(error),
            Some(Err(error)) => errors.insert(key, error),
            None => {}
        }
    }

    if errors.is_empty() {
        Ok(record)
    } else {
        Err(ValidationError::SchemaValidationFailed(errors))
    }
}
