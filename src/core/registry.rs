//! Type registry mapping type tags to their default filter and validator chains

use crate::core::error::RegistryError;
use crate::core::rule::{FilterRule, ValidatorRule};
use std::collections::HashMap;

/// Tag used when a declaration does not name a type
pub const DEFAULT_TYPE: &str = "any";

/// Default rules attached to a type tag
#[derive(Debug, Clone, Default)]
pub struct TypeDefinition {
    pub filters: Vec<FilterRule>,
    pub validators: Vec<ValidatorRule>,
}

impl TypeDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, rule: impl Into<FilterRule>) -> Self {
        self.filters.push(rule.into());
        self
    }

    pub fn validator(mut self, rule: impl Into<ValidatorRule>) -> Self {
        self.validators.push(rule.into());
        self
    }
}

/// Append-only table of type definitions
///
/// Built once while configuring an engine, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDefinition>,
}

impl TypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Registry holding every built-in type tag
    pub fn with_builtin_types() -> Self {
        let builtins = [
            ("any", TypeDefinition::new()),
            ("string", TypeDefinition::new().filter("toString")),
            (
                "number",
                TypeDefinition::new().filter("toNumber").validator("isNumeric"),
            ),
            (
                "integer",
                TypeDefinition::new().filter("toInt").validator("isInt"),
            ),
            (
                "float",
                TypeDefinition::new().filter("toFloat").validator("isFloat"),
            ),
            (
                "bool",
                TypeDefinition::new().filter("toBoolean").validator("isBoolean"),
            ),
            (
                "date",
                TypeDefinition::new().filter("toDate").validator("isDate"),
            ),
            (
                "email",
                TypeDefinition::new()
                    .filter("normalizeEmail")
                    .validator("isEmail"),
            ),
            ("alpha", TypeDefinition::new().validator("isAlpha")),
            ("alnum", TypeDefinition::new().validator("isAlphanumeric")),
            ("decimal", TypeDefinition::new().validator("isDecimal")),
            ("mongoid", TypeDefinition::new().validator("isMongoId")),
            ("url", TypeDefinition::new().validator("isURL")),
            ("uuid", TypeDefinition::new().validator("isUUID")),
            ("radio", TypeDefinition::new().validator("isIn")),
            ("select", TypeDefinition::new().validator("isIn")),
            ("checkbox", TypeDefinition::new().validator("isIn")),
            ("schema", TypeDefinition::new()),
        ];

        Self {
            types: builtins
                .into_iter()
                .map(|(tag, definition)| (tag.to_string(), definition))
                .collect(),
        }
    }

    /// Register a new type tag
    ///
    /// Existing tags are never replaced.
    pub fn register(
        &mut self,
        type_tag: impl Into<String>,
        definition: TypeDefinition,
    ) -> Result<(), RegistryError> {
        let type_tag = type_tag.into();
        if self.types.contains_key(&type_tag) {
            return Err(RegistryError::DuplicateType { type_tag });
        }
        self.types.insert(type_tag, definition);
        Ok(())
    }

    pub fn lookup(&self, type_tag: &str) -> Option<&TypeDefinition> {
        self.types.get(type_tag)
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.types.contains_key(type_tag)
    }

    /// Get all registered type tags
    pub fn type_tags(&self) -> Vec<&str> {
        self.types.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_empty() {
        let registry = TypeRegistry::new();
        assert!(registry.type_tags().is_empty());
        assert!(registry.lookup(DEFAULT_TYPE).is_none());
    }

    #[test]
    fn test_builtin_tags_are_present() {
        let registry = TypeRegistry::with_builtin_types();
        for tag in [
            "any", "string", "number", "integer", "float", "bool", "date", "email", "alpha",
            "alnum", "decimal", "mongoid", "url", "uuid", "radio", "select", "checkbox", "schema",
        ] {
            assert!(registry.contains(tag), "missing builtin type {}", tag);
        }
        assert_eq!(registry.type_tags().len(), 18);
    }

    #[test]
    fn test_integer_chains() {
        let registry = TypeRegistry::with_builtin_types();
        let integer = registry.lookup("integer").expect("integer should exist");
        assert_eq!(integer.filters.len(), 1);
        assert_eq!(integer.filters[0].name(), Some("toInt"));
        assert_eq!(integer.validators[0].name(), Some("isInt"));
    }

    #[test]
    fn test_any_has_no_rules() {
        let registry = TypeRegistry::with_builtin_types();
        let any = registry.lookup("any").expect("any should exist");
        assert!(any.filters.is_empty());
        assert!(any.validators.is_empty());
    }

    #[test]
    fn test_register_new_tag() {
        let mut registry = TypeRegistry::with_builtin_types();
        registry
            .register(
                "hexcolor",
                TypeDefinition::new().filter("toLower").validator("isHexColor"),
            )
            .expect("registration should succeed");
        assert!(registry.contains("hexcolor"));
        assert!(registry.contains("string"));
    }

    #[test]
    fn test_register_existing_tag_is_rejected() {
        let mut registry = TypeRegistry::with_builtin_types();
        let err = registry
            .register("email", TypeDefinition::new())
            .expect_err("duplicate should fail");
        assert_eq!(
            err,
            RegistryError::DuplicateType {
                type_tag: "email".to_string()
            }
        );
        let email = registry.lookup("email").expect("email should still exist");
        assert_eq!(email.validators[0].name(), Some("isEmail"));
    }

    #[test]
    fn test_unknown_tag_lookup() {
        let registry = TypeRegistry::with_builtin_types();
        assert!(registry.lookup("unknown-type").is_none());
    }
}
