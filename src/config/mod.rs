//! Schema configuration loading
//!
//! Schemas and custom type tags can be declared in YAML or JSON:
//!
//! ```yaml
//! types:
//!   hexcolor:
//!     filters: [toLower]
//!     validators: [isHexColor]
//! fields:
//!   name:   { type: alpha, required: true, errorMessage: "Name please" }
//!   colors: [ { type: hexcolor } ]
//!   tags:   { type: string, repeated: true }
//! ```
//!
//! A field written as a one-element sequence is a repeated field.

use crate::core::field::{FieldDeclaration, Schema};
use crate::core::registry::TypeDefinition;
use crate::core::validation::{Engine, EngineBuilder};
use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Default rules of a custom type tag, by primitive name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeConfig {
    #[serde(default)]
    pub filters: Vec<String>,

    #[serde(default)]
    pub validators: Vec<String>,
}

impl TypeConfig {
    pub fn to_definition(&self) -> TypeDefinition {
        let definition = self
            .filters
            .iter()
            .fold(TypeDefinition::new(), |def, name| def.filter(name.as_str()));
        self.validators
            .iter()
            .fold(definition, |def, name| def.validator(name.as_str()))
    }
}

/// One field as written in a configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    /// Input key, defaults to the field key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(
        rename = "errorMessage",
        alias = "error_message",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub error_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,

    #[serde(default)]
    pub repeated: bool,
}

impl FieldConfig {
    pub fn to_declaration(&self) -> FieldDeclaration {
        let mut declaration = FieldDeclaration {
            name: self.name.clone(),
            type_tag: self.type_tag.clone(),
            required: self.required,
            default: self.default.clone(),
            error_message: self.error_message.clone(),
            options: self.options.clone(),
            repeated: self.repeated,
            ..FieldDeclaration::default()
        };
        declaration
            .validators
            .extend(self.validators.iter().map(|name| name.as_str().into()));
        declaration
            .filters
            .extend(self.filters.iter().map(|name| name.as_str().into()));
        declaration
    }
}

/// A field entry: a single declaration, or a sequence marking a repeated field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldEntry {
    Repeated(Vec<FieldConfig>),
    Single(FieldConfig),
}

/// Complete schema configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Custom type tags (tag -> default rules)
    #[serde(default)]
    pub types: IndexMap<String, TypeConfig>,

    /// Fields in declaration order
    #[serde(default)]
    pub fields: IndexMap<String, FieldEntry>,
}

impl SchemaConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json_str(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Load a file, choosing the format from its extension (`.json` or YAML)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_yaml_file(path),
        }
    }

    /// Merge multiple configurations into one
    ///
    /// Later configurations win per type tag and per field key. A replaced
    /// field keeps its original position.
    pub fn merge(configs: Vec<SchemaConfig>) -> Self {
        let mut merged = SchemaConfig::default();
        for config in configs {
            merged.types.extend(config.types);
            merged.fields.extend(config.fields);
        }
        merged
    }

    /// Build the schema described by `fields`
    pub fn into_schema(self) -> Result<Schema> {
        let mut schema = Schema::new();
        for (key, entry) in &self.fields {
            let declaration = match entry {
                FieldEntry::Single(field) => field.to_declaration(),
                FieldEntry::Repeated(fields) => match fields.as_slice() {
                    [field] => field.to_declaration().repeated(),
                    _ => bail!(
                        "Field '{}': a repeated field must hold exactly one declaration, found {}",
                        key,
                        fields.len()
                    ),
                },
            };
            schema.insert(key.as_str(), declaration);
        }
        Ok(schema)
    }

    /// Append the custom type tags to an engine builder
    pub fn register_types(&self, builder: EngineBuilder) -> Result<EngineBuilder> {
        self.types.iter().try_fold(builder, |builder, (tag, config)| {
            builder
                .register_type(tag.as_str(), config.to_definition())
                .with_context(|| format!("Cannot register type '{}'", tag))
        })
    }

    /// Engine with the built-ins plus the custom type tags
    pub fn engine(&self) -> Result<Engine> {
        Ok(self.register_types(Engine::builder())?.build())
    }
}
