//! Validation and normalization engine
//!
//! Declarations are resolved against the type registry into descriptors,
//! values are checked by their validators concurrently and then run through
//! their filters. Records fan out one task per field.

pub mod engine;
#[cfg(feature = "http")]
pub mod extractor;
pub mod filters;
pub mod normalizer;
pub mod predicates;
mod record;
pub mod validators;
mod value;

pub use engine::{
    Engine, EngineBuilder, resolve_field_descriptor, validate_record, validate_value,
};
#[cfg(feature = "http")]
pub use extractor::{Validated, ValidatedPayload};
pub use predicates::PredicateTable;
pub use value::TIMEOUT_MESSAGE;
