//! Runtime tagged unions.
//!
//! A [`VariantSchema`] declares the variants of a union. A [`VariantFactory`]
//! builds [`TaggedValue`]s for it, either dynamically (any tag) or pre-bound
//! (a fixed list of tags resolved once). Values dispatch through the
//! [`Variant`] trait and travel as `{"tag": ..., "data": ...}`.
//!
//! [`Outcome`] and [`Maybe`] are the built-in `{Ok, Err}` and `{Some, None}`
//! unions, and [`bridge`] folds failing calls into `Outcome`s.

pub mod bridge;
pub mod dispatch;
pub mod error;
pub mod factory;
pub mod maybe;
pub mod outcome;
pub mod schema;
pub mod value;

pub use bridge::{attempt, attempt_async, guarded, guarded_async, Fault, Panic};
pub use dispatch::{Arms, BoxFuture, Guard, Guarded, Handlers, Variant};
pub use error::{Result, SchemaError, UnwrapError, VariantError};
pub use factory::{Constructor, Mode, VariantFactory};
pub use maybe::Maybe;
pub use outcome::Outcome;
pub use schema::{FieldSchema, PayloadSchema, VariantDef, VariantSchema, RESERVED_TAG};
pub use value::{Payload, Tag, TaggedValue, Wire};
