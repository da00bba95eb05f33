// Schema layer - variant declarations and payload descriptors

use crate::error::SchemaError;
use crate::value::Payload;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The handler-map key reserved for the fallback arm. Never a variant name.
pub const RESERVED_TAG: &str = "_";

/// Ordered, closed set of variants for one union
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSchema {
    pub name: String,
    #[serde(default)]
    pub variants: Vec<VariantDef>,
}

/// One declared variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDef {
    pub name: String,
    #[serde(default)]
    pub payload: PayloadSchema,
}

/// Schema for struct fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub schema: PayloadSchema,
}

/// Payload type descriptor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayloadSchema {
    /// No payload. The wire carries `null`.
    #[default]
    Unit,
    Bool,
    Int,
    Double,
    Text,
    /// Milliseconds since the Unix epoch
    Timestamp,
    Array {
        element: Box<PayloadSchema>,
    },
    Struct {
        fields: Vec<FieldSchema>,
    },
    Optional {
        inner: Box<PayloadSchema>,
    },
    Any,
}

impl VariantSchema {
    pub fn new(name: impl Into<String>) -> Self {
        VariantSchema {
            name: name.into(),
            variants: Vec::new(),
        }
    }

    /// Append a variant. Declaration order is preserved.
    pub fn variant(mut self, name: impl Into<String>, payload: PayloadSchema) -> Self {
        self.variants.push(VariantDef {
            name: name.into(),
            payload,
        });
        self
    }

    /// Append a variant without payload
    pub fn unit(self, name: impl Into<String>) -> Self {
        self.variant(name, PayloadSchema::Unit)
    }

    pub fn get(&self, name: &str) -> Option<&VariantDef> {
        self.variants.iter().find(|v| v.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.variants.iter().position(|v| v.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.name.as_str())
    }

    /// Check declaration rules. The reserved fallback name is checked by the
    /// factory, which reports it as a `VariantError::ReservedTag`.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for variant in &self.variants {
            if variant.name.is_empty() {
                return Err(SchemaError::EmptyVariantName);
            }
            if !seen.insert(variant.name.as_str()) {
                return Err(SchemaError::DuplicateVariant(variant.name.clone()));
            }
            variant.payload.validate()?;
        }
        Ok(())
    }
}

impl PayloadSchema {
    pub fn array(element: PayloadSchema) -> Self {
        PayloadSchema::Array {
            element: Box::new(element),
        }
    }

    pub fn optional(inner: PayloadSchema) -> Self {
        PayloadSchema::Optional {
            inner: Box::new(inner),
        }
    }

    pub fn record<N: Into<String>>(fields: impl IntoIterator<Item = (N, PayloadSchema)>) -> Self {
        PayloadSchema::Struct {
            fields: fields
                .into_iter()
                .map(|(name, schema)| FieldSchema {
                    name: name.into(),
                    schema,
                })
                .collect(),
        }
    }

    /// Short name used in diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            PayloadSchema::Unit => "unit",
            PayloadSchema::Bool => "bool",
            PayloadSchema::Int => "int",
            PayloadSchema::Double => "double",
            PayloadSchema::Text => "text",
            PayloadSchema::Timestamp => "timestamp",
            PayloadSchema::Array { .. } => "array",
            PayloadSchema::Struct { .. } => "struct",
            PayloadSchema::Optional { .. } => "optional",
            PayloadSchema::Any => "any",
        }
    }

    /// Validate the descriptor itself (nested struct field names must be distinct)
    pub fn validate(&self) -> Result<(), SchemaError> {
        match self {
            PayloadSchema::Array { element } => element.validate(),
            PayloadSchema::Optional { inner } => inner.validate(),
            PayloadSchema::Struct { fields } => {
                let mut seen = HashSet::new();
                for field in fields {
                    if !seen.insert(field.name.as_str()) {
                        return Err(SchemaError::DuplicateField(field.name.clone()));
                    }
                    field.schema.validate()?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Validate a payload against this descriptor
    pub fn check(&self, payload: &Payload) -> Result<(), SchemaError> {
        match (self, payload) {
            (PayloadSchema::Any, _) => Ok(()),
            (PayloadSchema::Unit, Payload::Null) => Ok(()),
            (PayloadSchema::Bool, Payload::Bool(_)) => Ok(()),
            (PayloadSchema::Int, Payload::Number(n)) if n.is_i64() || n.is_u64() => Ok(()),
            (PayloadSchema::Double, Payload::Number(_)) => Ok(()),
            (PayloadSchema::Text, Payload::String(_)) => Ok(()),
            (PayloadSchema::Timestamp, Payload::Number(n)) if n.is_i64() => Ok(()),
            (PayloadSchema::Optional { .. }, Payload::Null) => Ok(()),
            (PayloadSchema::Optional { inner }, value) => inner.check(value),
            (PayloadSchema::Array { element }, Payload::Array(values)) => {
                for value in values {
                    element.check(value)?;
                }
                Ok(())
            }
            (PayloadSchema::Struct { fields }, Payload::Object(object)) => {
                for field in fields {
                    match object.get(&field.name) {
                        Some(value) => field.schema.check(value)?,
                        // absent optional fields read as null
                        None if matches!(field.schema, PayloadSchema::Optional { .. }) => {}
                        None => return Err(SchemaError::MissingField(field.name.clone())),
                    }
                }
                if let Some(extra) = object
                    .keys()
                    .find(|key| !fields.iter().any(|f| &f.name == *key))
                {
                    return Err(SchemaError::UnexpectedField(extra.clone()));
                }
                Ok(())
            }
            _ => Err(SchemaError::TypeMismatch {
                expected: self.describe().to_string(),
                actual: kind_of(payload).to_string(),
            }),
        }
    }
}

fn kind_of(payload: &Payload) -> &'static str {
    match payload {
        Payload::Null => "null",
        Payload::Bool(_) => "bool",
        Payload::Number(n) if n.is_f64() => "double",
        Payload::Number(_) => "int",
        Payload::String(_) => "text",
        Payload::Array(_) => "array",
        Payload::Object(_) => "struct",
    }
}
