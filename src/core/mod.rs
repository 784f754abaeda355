//! Core module containing the data model and the validation engine

pub mod error;
pub mod field;
pub mod registry;
pub mod rule;
pub mod validation;

pub use error::{ErrorResponse, FieldErrors, RegistryError, RuleKind, ValidationError};
pub use field::{FieldDeclaration, FieldDescriptor, Record, Schema};
pub use registry::{TypeDefinition, TypeRegistry};
pub use rule::{AsyncValidator, FilterRule, Outcome, Rule, ValidatorRule};
