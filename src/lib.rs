//! # vschema
//!
//! A declarative validation and normalization engine for loosely typed
//! records such as JSON request bodies.
//!
//! ## Features
//!
//! - **Type Registry**: type tags (`integer`, `email`, ...) carry default filters and validators
//! - **Named or Custom Rules**: reference built-in primitives by name, or pass closures
//! - **Async Validators**: validators may defer their verdict to a future
//! - **Concurrent**: every validator of a value and every field of a record runs at once
//! - **Configuration-Based**: declare schemas in YAML or JSON
//! - **Axum Integration**: the `Validated<T>` extractor (feature `http`)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vschema::prelude::*;
//!
//! let schema = Schema::new()
//!     .field("firstname", FieldDeclaration::new().type_tag("alpha").required())
//!     .field("age", FieldDeclaration::new().type_tag("integer"))
//!     .field("email", FieldDeclaration::new().type_tag("email").default_value("hello@world.com"));
//!
//! let record = validate_record(&schema, &json!({"firstname": "John", "age": "42"})).await?;
//! assert_eq!(record["age"], json!(42));
//! assert_eq!(record["email"], json!("hello@world.com"));
//! ```

pub mod config;
pub mod core;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Data model ===
    pub use crate::core::{
        error::{ErrorResponse, FieldErrors, REQUIRED_MESSAGE, RegistryError, ValidationError},
        field::{FieldDeclaration, FieldDescriptor, Record, Schema},
        registry::{TypeDefinition, TypeRegistry},
        rule::{AsyncValidator, FilterRule, Outcome, Rule, ValidatorRule},
    };

    // === Engine ===
    pub use crate::core::validation::{
        Engine, EngineBuilder, PredicateTable, resolve_field_descriptor, validate_record,
        validate_value,
    };

    // === Axum ===
    #[cfg(feature = "http")]
    pub use crate::core::validation::{Validated, ValidatedPayload};

    // === Config ===
    pub use crate::config::{FieldConfig, FieldEntry, SchemaConfig, TypeConfig};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use serde_json::{Value, json};
}
