// Error types for sumtag

use thiserror::Error;

pub type Result<T, E = VariantError> = std::result::Result<T, E>;

/// Faults raised by construction and dispatch.
///
/// These are programmer errors (schema misuse, incomplete match). Expected
/// failures travel as `Outcome`/`Maybe` values instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VariantError {
    #[error("`{tag}` is reserved for the fallback handler and cannot name a variant")]
    ReservedTag { tag: String },

    #[error("unknown variant `{tag}` for `{schema}`")]
    UnknownVariant { schema: String, tag: String },

    #[error("no handler for variant `{tag}` and no fallback")]
    MissingHandler { tag: String },

    #[error("exhaustive match is missing arms for: {}", .missing.join(", "))]
    NonExhaustive { missing: Vec<String> },

    #[error("invalid payload for variant `{tag}`: {source}")]
    Payload {
        tag: String,
        #[source]
        source: SchemaError,
    },

    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("malformed wire value: {0}")]
    Wire(String),
}

/// Schema declaration and payload conformance errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("variant names must not be empty")]
    EmptyVariantName,

    #[error("duplicate variant name: {0}")]
    DuplicateVariant(String),

    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("unexpected field: {0}")]
    UnexpectedField(String),
}

/// Raised by `try_unwrap` (and, as a panic message, by `unwrap`) on a
/// failure or empty adapter value. Carries the original cause.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnwrapError<E> {
    #[error("called `unwrap` on an `Err` value: {0:?}")]
    Err(E),

    #[error("called `unwrap` on a `None` value")]
    None,
}

impl<E> UnwrapError<E> {
    /// The carried error, if this came from an `Err`.
    pub fn into_cause(self) -> Option<E> {
        match self {
            UnwrapError::Err(e) => Some(e),
            UnwrapError::None => None,
        }
    }
}

impl VariantError {
    pub(crate) fn reserved(tag: &str) -> Self {
        VariantError::ReservedTag {
            tag: tag.to_string(),
        }
    }

    pub(crate) fn unknown(schema: &str, tag: &str) -> Self {
        VariantError::UnknownVariant {
            schema: schema.to_string(),
            tag: tag.to_string(),
        }
    }

    pub(crate) fn payload(tag: &str, source: SchemaError) -> Self {
        VariantError::Payload {
            tag: tag.to_string(),
            source,
        }
    }
}
