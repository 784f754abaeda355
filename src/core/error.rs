//! Typed error handling for the validation engine
//!
//! Field-level failures carry exactly one human-readable message. Record-level
//! failures carry a [`FieldErrors`] map so a caller can render every violation
//! at once.
//!
//! # Error Categories
//!
//! - [`ValidationError`]: everything a validation call can fail with
//! - [`RegistryError`]: errors raised while configuring an engine
//!
//! # Example
//!
//! ```rust,ignore
//! use vschema::prelude::*;
//!
//! match engine.validate_record(&schema, &data).await {
//!     Ok(record) => println!("{:?}", record),
//!     Err(ValidationError::SchemaValidationFailed(errors)) => {
//!         for (field, message) in errors.messages() {
//!             println!("{}: {}", field, message);
//!         }
//!     }
//!     Err(e) => eprintln!("Schema misconfigured: {}", e),
//! }
//! ```

use indexmap::IndexMap;
use serde::Serialize;
use serde::ser::SerializeMap;
use std::fmt;
use thiserror::Error;

/// Message used when a required field is empty and no `error_message` is set
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// Which side of the predicate table a named rule points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Validator,
    Filter,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Validator => write!(f, "validator"),
            RuleKind::Filter => write!(f, "filter"),
        }
    }
}

/// Errors produced by descriptor resolution and validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The declaration references a type tag absent from the registry
    #[error("Unknown field type: {type_tag}")]
    UnknownType { type_tag: String },

    /// The declaration has no usable name
    #[error("Missing name property")]
    MissingName,

    /// A named validator or filter is not in the predicate table
    #[error("Unknown {kind}: {name}")]
    UnknownRule { kind: RuleKind, name: String },

    /// A required value was null, empty or an empty sequence
    #[error("{message}")]
    RequiredFieldMissing { message: String },

    /// A validator rejected the value
    #[error("{message}")]
    ValidationFailed { message: String },

    /// One or more fields of a record failed
    #[error("{0}")]
    SchemaValidationFailed(FieldErrors),
}

impl ValidationError {
    pub(crate) fn failed(message: impl Into<String>) -> Self {
        ValidationError::ValidationFailed {
            message: message.into(),
        }
    }

    /// True for errors caused by the schema itself rather than by the input
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ValidationError::UnknownType { .. }
                | ValidationError::MissingName
                | ValidationError::UnknownRule { .. }
        )
    }

    /// Per-field errors of a record-level failure
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ValidationError::SchemaValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::UnknownType { .. } => "UNKNOWN_TYPE",
            ValidationError::MissingName => "MISSING_NAME",
            ValidationError::UnknownRule { .. } => "UNKNOWN_RULE",
            ValidationError::RequiredFieldMissing { .. } => "REQUIRED_FIELD_MISSING",
            ValidationError::ValidationFailed { .. } => "VALIDATION_FAILED",
            ValidationError::SchemaValidationFailed(_) => "SCHEMA_VALIDATION_FAILED",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        let details = match self {
            ValidationError::SchemaValidationFailed(errors) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            ValidationError::UnknownType { type_tag } => {
                Some(serde_json::json!({ "type": type_tag }))
            }
            ValidationError::UnknownRule { kind, name } => {
                Some(serde_json::json!({ "kind": kind, "name": name }))
            }
            _ => None,
        };

        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[cfg(feature = "http")]
mod http {
    use super::ValidationError;
    use axum::Json;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};

    impl ValidationError {
        /// Get the HTTP status code for this error
        pub fn status_code(&self) -> StatusCode {
            if self.is_configuration_error() {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        }
    }

    impl IntoResponse for ValidationError {
        fn into_response(self) -> Response {
            let status = self.status_code();
            let body = Json(self.to_response());
            (status, body).into_response()
        }
    }
}

/// Per-field errors of one record validation, in schema order
///
/// Serializes as a map of field key to message string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors {
    errors: IndexMap<String, ValidationError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the error for a field, replacing any previous one
    pub fn insert(&mut self, field: impl Into<String>, error: ValidationError) {
        self.errors.insert(field.into(), error);
    }

    pub fn get(&self, field: &str) -> Option<&ValidationError> {
        self.errors.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Number of failed fields
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, ValidationError> {
        self.errors.iter()
    }

    /// Field key to message, the shape handed to API clients
    pub fn messages(&self) -> IndexMap<String, String> {
        self.errors
            .iter()
            .map(|(field, error)| (field.clone(), error.to_string()))
            .collect()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msgs: Vec<String> = self
            .errors
            .iter()
            .map(|(field, error)| format!("{}: {}", field, error))
            .collect();
        write!(
            f,
            "Validation failed for {} field(s): {}",
            self.errors.len(),
            msgs.join(", ")
        )
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for (field, error) in &self.errors {
            map.serialize_entry(field, &error.to_string())?;
        }
        map.end()
    }
}

impl IntoIterator for FieldErrors {
    type Item = (String, ValidationError);
    type IntoIter = indexmap::map::IntoIter<String, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl FromIterator<(String, ValidationError)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (String, ValidationError)>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

/// Errors raised while building an engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The registry is append-only; a tag can only be registered once
    #[error("Type '{type_tag}' is already registered")]
    DuplicateType { type_tag: String },
}
