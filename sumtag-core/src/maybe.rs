// Option adapter - the fixed `{Some, None}` union

use crate::dispatch::Variant;
use crate::error::{self, UnwrapError, VariantError};
use crate::factory::VariantFactory;
use crate::outcome::{decode, Outcome};
use crate::schema::{PayloadSchema, VariantSchema};
use crate::value::{Payload, TaggedValue, Wire};
use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::convert::Infallible;
use std::sync::OnceLock;

/// A value (`Some`) or its absence (`None`).
///
/// `None` carries the empty marker on the wire, in both the serde form and
/// [`Maybe::to_wire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(tag = "tag", content = "data")]
pub enum Maybe<T> {
    Some(T),
    #[default]
    None,
}

/// The closed factory behind every `Maybe` wire value
pub fn factory() -> &'static VariantFactory {
    static FACTORY: OnceLock<VariantFactory> = OnceLock::new();
    FACTORY.get_or_init(|| {
        VariantFactory::adapter(
            VariantSchema::new("Maybe")
                .variant("Some", PayloadSchema::Any)
                .unit("None"),
        )
    })
}

impl<T> Maybe<T> {
    pub fn tag(&self) -> &'static str {
        match self {
            Maybe::Some(_) => "Some",
            Maybe::None => "None",
        }
    }

    pub fn is_some(&self) -> bool {
        matches!(self, Maybe::Some(_))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Maybe::None)
    }

    pub fn try_unwrap(self) -> Result<T, UnwrapError<Infallible>> {
        match self {
            Maybe::Some(value) => Ok(value),
            Maybe::None => Err(UnwrapError::None),
        }
    }

    /// # Panics
    ///
    /// Panics on `None`.
    #[track_caller]
    pub fn unwrap(self) -> T {
        match self.try_unwrap() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Maybe::Some(value) => value,
            Maybe::None => default,
        }
    }

    /// `f` only runs on `None`
    pub fn unwrap_or_else<F: FnOnce() -> T>(self, f: F) -> T {
        match self {
            Maybe::Some(value) => value,
            Maybe::None => f(),
        }
    }

    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.unwrap_or_else(T::default)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Maybe<U> {
        match self {
            Maybe::Some(value) => Maybe::Some(f(value)),
            Maybe::None => Maybe::None,
        }
    }

    pub fn and_then<U, F: FnOnce(T) -> Maybe<U>>(self, f: F) -> Maybe<U> {
        match self {
            Maybe::Some(value) => f(value),
            Maybe::None => Maybe::None,
        }
    }

    /// Keep `Some(x)` only when `predicate(&x)` holds
    pub fn filter<P: FnOnce(&T) -> bool>(self, predicate: P) -> Maybe<T> {
        match self {
            Maybe::Some(value) => {
                if predicate(&value) {
                    Maybe::Some(value)
                } else {
                    Maybe::None
                }
            }
            Maybe::None => Maybe::None,
        }
    }

    pub fn ok_or<E>(self, err: E) -> Outcome<T, E> {
        match self {
            Maybe::Some(value) => Outcome::Ok(value),
            Maybe::None => Outcome::Err(err),
        }
    }

    /// `f` only runs on `None`
    pub fn ok_or_else<E, F: FnOnce() -> E>(self, f: F) -> Outcome<T, E> {
        match self {
            Maybe::Some(value) => Outcome::Ok(value),
            Maybe::None => Outcome::Err(f()),
        }
    }

    pub fn as_ref(&self) -> Maybe<&T> {
        match self {
            Maybe::Some(value) => Maybe::Some(value),
            Maybe::None => Maybe::None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Maybe::Some(value) => Some(value),
            Maybe::None => None,
        }
    }

    /// Project into a [`TaggedValue`] of the `{Some, None}` union
    pub fn to_tagged(&self) -> error::Result<TaggedValue>
    where
        T: Serialize,
    {
        let payload = match self {
            Maybe::Some(value) => {
                serde_json::to_value(value).map_err(|e| VariantError::Wire(e.to_string()))?
            }
            Maybe::None => Payload::Null,
        };
        factory().construct(self.tag(), payload)
    }

    pub fn to_wire(&self) -> error::Result<Wire>
    where
        T: Serialize,
    {
        self.to_tagged().map(TaggedValue::into_wire)
    }

    pub fn from_wire(wire: Wire) -> error::Result<Self>
    where
        T: DeserializeOwned,
    {
        let value = factory().parse(wire)?;
        value.match_exhaustive(
            TaggedValue::arms()
                .on("Some", |payload, _| decode(payload).map(Maybe::Some))
                .on("None", |_, _| Ok(Maybe::None)),
        )?
    }
}

// Written by hand so `None` keeps its `"data": null` entry.
impl<T: Serialize> Serialize for Maybe<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Maybe", 2)?;
        state.serialize_field("tag", self.tag())?;
        match self {
            Maybe::Some(value) => state.serialize_field("data", value)?,
            Maybe::None => state.serialize_field("data", &())?,
        }
        state.end()
    }
}

/// Arms receive the whole adapter as their payload and destructure it.
impl<T> Variant for Maybe<T> {
    type Payload = Self;

    fn tag(&self) -> &str {
        Maybe::tag(self)
    }

    fn payload(&self) -> &Self {
        self
    }

    fn variant_names(&self) -> Option<Vec<&str>> {
        Some(vec!["Some", "None"])
    }
}

impl<T> From<Option<T>> for Maybe<T> {
    fn from(option: Option<T>) -> Self {
        match option {
            Some(value) => Maybe::Some(value),
            None => Maybe::None,
        }
    }
}

impl<T> From<Maybe<T>> for Option<T> {
    fn from(maybe: Maybe<T>) -> Self {
        maybe.into_option()
    }
}
