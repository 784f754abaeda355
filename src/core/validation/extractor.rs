//! Axum extractor for validated payloads
//!
//! This module provides the `Validated<T>` extractor that validates and
//! normalizes a JSON body against a schema before it reaches the handler.

use super::engine::Engine;
use crate::core::error::ValidationError;
use crate::core::field::Schema;
use axum::{
    Json,
    extract::{FromRequest, Request},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::marker::PhantomData;

/// Trait for payload types that declare a schema
pub trait ValidatedPayload {
    /// Schema applied for a specific operation (`create` or `update`)
    fn schema(operation: &str) -> Schema;

    /// Engine used to run the schema
    fn engine() -> Engine {
        Engine::shared().clone()
    }
}

/// Axum extractor that validates and normalizes a JSON body
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn signup(payload: Validated<Signup>) -> Json<Value> {
///     // payload holds the normalized record
///     Json(payload.into_inner())
/// }
/// ```
pub struct Validated<T>(pub Value, PhantomData<T>);

impl<T> Validated<T> {
    /// Create a new validated payload
    pub fn new(payload: Value) -> Self {
        Self(payload, PhantomData)
    }

    /// Get the inner payload
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl<T> std::ops::Deref for Validated<T> {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn operation_for(method: &Method) -> &'static str {
    match *method {
        Method::PUT | Method::PATCH => "update",
        _ => "create",
    }
}

fn bad_request(error: &str, details: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": error,
            "details": details
        })),
    )
        .into_response()
}

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: ValidatedPayload + Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let operation = operation_for(req.method());

        let Json(payload): Json<Value> = Json::from_request(req, state)
            .await
            .map_err(|e| bad_request("Invalid JSON", e.to_string()))?;

        if !payload.is_object() {
            return Err(bad_request(
                "Invalid payload",
                "Expected a JSON object".to_string(),
            ));
        }

        let schema = T::schema(operation);
        match T::engine().validate_record(&schema, &payload).await {
            Ok(record) => Ok(Validated::new(Value::Object(record.into_iter().collect()))),
            Err(ValidationError::SchemaValidationFailed(errors)) => Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "Validation failed",
                    "errors": errors
                })),
            )
                .into_response()),
            Err(error) => {
                tracing::error!(error = %error, operation, "payload schema is misconfigured");
                Err(error.into_response())
            }
        }
    }
}
