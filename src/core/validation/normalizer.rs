//! Field normalizer: merges a declaration with its type's registry defaults

use crate::core::error::ValidationError;
use crate::core::field::{FieldDeclaration, FieldDescriptor};
use crate::core::registry::{DEFAULT_TYPE, TypeRegistry};

/// Label given to declarations validated outside of a schema
pub const ANONYMOUS_FIELD: &str = "value";

/// Resolve a declaration into a descriptor
///
/// `fallback_name` stands in for a missing or blank `name`. Registry rules are
/// placed before the declared ones. The declaration itself is left untouched.
pub fn resolve(
    registry: &TypeRegistry,
    declaration: &FieldDeclaration,
    fallback_name: Option<&str>,
) -> Result<FieldDescriptor, ValidationError> {
    let non_blank = |name: &&str| !name.trim().is_empty();
    let name = declaration
        .name
        .as_deref()
        .filter(non_blank)
        .or(fallback_name.filter(non_blank))
        .ok_or(ValidationError::MissingName)?;

    let type_tag = declaration
        .type_tag
        .as_deref()
        .filter(|tag| !tag.trim().is_empty())
        .unwrap_or(DEFAULT_TYPE);

    let definition = registry
        .lookup(type_tag)
        .ok_or_else(|| ValidationError::UnknownType {
            type_tag: type_tag.to_string(),
        })?;

    Ok(FieldDescriptor {
        name: name.to_string(),
        type_tag: type_tag.to_string(),
        required: declaration.required,
        default: declaration.default.clone(),
        error_message: declaration.error_message.clone(),
        options: declaration.options.clone(),
        validators: definition
            .validators
            .iter()
            .chain(&declaration.validators)
            .cloned()
            .collect(),
        filters: definition
            .filters
            .iter()
            .chain(&declaration.filters)
            .cloned()
            .collect(),
        repeated: declaration.repeated,
    })
}
