// Result adapter - the fixed `{Ok, Err}` union

use crate::dispatch::Variant;
use crate::error::{self, UnwrapError, VariantError};
use crate::factory::VariantFactory;
use crate::maybe::Maybe;
use crate::schema::{PayloadSchema, VariantSchema};
use crate::value::{Payload, TaggedValue, Wire};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Success (`Ok`) or failure (`Err`).
///
/// Serializes to the wire form `{"tag": "Ok" | "Err", "data": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", content = "data")]
pub enum Outcome<T, E> {
    Ok(T),
    Err(E),
}

/// The closed factory behind every `Outcome` wire value
pub fn factory() -> &'static VariantFactory {
    static FACTORY: OnceLock<VariantFactory> = OnceLock::new();
    FACTORY.get_or_init(|| {
        VariantFactory::adapter(
            VariantSchema::new("Outcome")
                .variant("Ok", PayloadSchema::Any)
                .variant("Err", PayloadSchema::Any),
        )
    })
}

impl<T, E> Outcome<T, E> {
    pub fn tag(&self) -> &'static str {
        match self {
            Outcome::Ok(_) => "Ok",
            Outcome::Err(_) => "Err",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn is_err(&self) -> bool {
        matches!(self, Outcome::Err(_))
    }

    /// The success payload, or an [`UnwrapError`] carrying the error
    pub fn try_unwrap(self) -> Result<T, UnwrapError<E>> {
        match self {
            Outcome::Ok(value) => Ok(value),
            Outcome::Err(err) => Err(UnwrapError::Err(err)),
        }
    }

    /// The success payload.
    ///
    /// # Panics
    ///
    /// Panics on `Err`, with a message carrying the error's `Debug` form.
    /// For bridge results, `rethrow` raises the captured failure itself.
    #[track_caller]
    pub fn unwrap(self) -> T
    where
        E: fmt::Debug,
    {
        match self.try_unwrap() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// # Panics
    ///
    /// Panics on `Ok`.
    #[track_caller]
    pub fn unwrap_err(self) -> E
    where
        T: fmt::Debug,
    {
        match self {
            Outcome::Ok(value) => panic!("called `unwrap_err` on an `Ok` value: {value:?}"),
            Outcome::Err(err) => err,
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Outcome::Ok(value) => value,
            Outcome::Err(_) => default,
        }
    }

    /// `f` only runs on `Err`
    pub fn unwrap_or_else<F: FnOnce(E) -> T>(self, f: F) -> T {
        match self {
            Outcome::Ok(value) => value,
            Outcome::Err(err) => f(err),
        }
    }

    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.unwrap_or_else(|_| T::default())
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U, E> {
        match self {
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::Err(err) => Outcome::Err(err),
        }
    }

    pub fn map_err<G, F: FnOnce(E) -> G>(self, f: F) -> Outcome<T, G> {
        match self {
            Outcome::Ok(value) => Outcome::Ok(value),
            Outcome::Err(err) => Outcome::Err(f(err)),
        }
    }

    /// Monadic bind: `f` never runs on `Err`
    pub fn and_then<U, F: FnOnce(T) -> Outcome<U, E>>(self, f: F) -> Outcome<U, E> {
        match self {
            Outcome::Ok(value) => f(value),
            Outcome::Err(err) => Outcome::Err(err),
        }
    }

    /// `Ok(v)` becomes `Some(v)`; the error is discarded
    pub fn ok(self) -> Maybe<T> {
        match self {
            Outcome::Ok(value) => Maybe::Some(value),
            Outcome::Err(_) => Maybe::None,
        }
    }

    pub fn err(self) -> Maybe<E> {
        match self {
            Outcome::Ok(_) => Maybe::None,
            Outcome::Err(err) => Maybe::Some(err),
        }
    }

    pub fn as_ref(&self) -> Outcome<&T, &E> {
        match self {
            Outcome::Ok(value) => Outcome::Ok(value),
            Outcome::Err(err) => Outcome::Err(err),
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Outcome::Ok(value) => Ok(value),
            Outcome::Err(err) => Err(err),
        }
    }

    /// Project into a [`TaggedValue`] of the `{Ok, Err}` union
    pub fn to_tagged(&self) -> error::Result<TaggedValue>
    where
        T: Serialize,
        E: Serialize,
    {
        let payload = match self {
            Outcome::Ok(value) => serde_json::to_value(value),
            Outcome::Err(err) => serde_json::to_value(err),
        }
        .map_err(|e| VariantError::Wire(e.to_string()))?;
        factory().construct(self.tag(), payload)
    }

    pub fn to_wire(&self) -> error::Result<Wire>
    where
        T: Serialize,
        E: Serialize,
    {
        self.to_tagged().map(TaggedValue::into_wire)
    }

    /// Rebuild from the wire form. Tags other than `Ok`/`Err` are rejected.
    pub fn from_wire(wire: Wire) -> error::Result<Self>
    where
        T: DeserializeOwned,
        E: DeserializeOwned,
    {
        let value = factory().parse(wire)?;
        value.match_exhaustive(
            TaggedValue::arms()
                .on("Ok", |payload, _| decode(payload).map(Outcome::Ok))
                .on("Err", |payload, _| decode(payload).map(Outcome::Err)),
        )?
    }
}

/// Arms receive the whole adapter as their payload and destructure it.
impl<T, E> Variant for Outcome<T, E> {
    type Payload = Self;

    fn tag(&self) -> &str {
        Outcome::tag(self)
    }

    fn payload(&self) -> &Self {
        self
    }

    fn variant_names(&self) -> Option<Vec<&str>> {
        Some(vec!["Ok", "Err"])
    }
}

pub(crate) fn decode<D: DeserializeOwned>(payload: &Payload) -> error::Result<D> {
    D::deserialize(payload).map_err(|e| VariantError::Wire(e.to_string()))
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(err) => Outcome::Err(err),
        }
    }
}

impl<T, E> From<Outcome<T, E>> for Result<T, E> {
    fn from(outcome: Outcome<T, E>) -> Self {
        outcome.into_result()
    }
}
