// Dispatch layer - match, async match, exhaustive match and guards

use crate::error::{Result, VariantError};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tracing::trace;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Handler for one tag. Receives the payload and the whole value.
pub type Arm<'a, V, R> = Box<dyn for<'v> FnOnce(&'v <V as Variant>::Payload, &'v V) -> R + 'a>;

/// Catch-all handler. Receives only the whole value, since no single payload
/// type applies.
pub type Fallback<'a, V, R> = Box<dyn for<'v> FnOnce(&'v V) -> R + 'a>;

/// A tagged value that can be dispatched on.
///
/// Implementors provide the tag and payload; every dispatch operation is a
/// provided method and never mutates `self`.
pub trait Variant: Sized {
    type Payload;

    fn tag(&self) -> &str;

    fn payload(&self) -> &Self::Payload;

    /// The closed variant set, when known. Enables the coverage check in
    /// [`Variant::match_exhaustive`].
    fn variant_names(&self) -> Option<Vec<&str>> {
        None
    }

    /// Empty handler map for this value type
    fn handlers<'a, R>() -> Handlers<'a, Self, R> {
        Handlers::new()
    }

    /// Empty handler map whose arms return boxed futures
    fn async_handlers<'a, O>() -> Handlers<'a, Self, BoxFuture<'a, O>> {
        Handlers::new()
    }

    /// Empty fallback-free arm set for [`Variant::match_exhaustive`]
    fn arms<'a, R>() -> Arms<'a, Self, R> {
        Arms::new()
    }

    fn guard<'a, R>() -> Guard<'a, Self, R> {
        Guard::new()
    }

    fn is(&self, tag: &str) -> bool {
        self.tag() == tag
    }

    /// Run the arm for the active tag, else the fallback, else fail with
    /// [`VariantError::MissingHandler`].
    fn match_on<R>(&self, handlers: Handlers<'_, Self, R>) -> Result<R> {
        dispatch(self, handlers)
    }

    /// Like [`Variant::match_on`], with arms that return futures. The arm is
    /// picked and called before the first poll; the returned future only
    /// awaits what the arm produced.
    fn match_async<'a, O>(&self, handlers: Handlers<'a, Self, BoxFuture<'a, O>>) -> BoxFuture<'a, Result<O>>
    where
        O: 'a,
    {
        let selected = dispatch(self, handlers);
        Box::pin(async move {
            match selected {
                Ok(pending) => Ok(pending.await),
                Err(err) => Err(err),
            }
        })
    }

    /// Match without a fallback. When the variant set is known, every variant
    /// must have an arm or this fails with [`VariantError::NonExhaustive`]
    /// before any arm runs.
    fn match_exhaustive<R>(&self, arms: Arms<'_, Self, R>) -> Result<R> {
        if let Some(names) = self.variant_names() {
            let missing: Vec<String> = names
                .into_iter()
                .filter(|name| !arms.covers(name))
                .map(str::to_string)
                .collect();
            if !missing.is_empty() {
                return Err(VariantError::NonExhaustive { missing });
            }
        }
        dispatch(self, Handlers::Exhaustive(arms))
    }

    /// `matched` runs with the payload when the tag is `tag`; `unmatched`
    /// runs with the value otherwise. An absent arm, or an arm returning
    /// `None`, yields `Flag(true)` on a match and `Flag(false)` otherwise.
    fn if_tag<R>(&self, tag: &str, guard: Guard<'_, Self, R>) -> Guarded<R> {
        evaluate(self, tag, guard, true)
    }

    /// Mirror of [`Variant::if_tag`]: the default flag is `true` when the tag
    /// is *not* `tag`.
    fn if_not<R>(&self, tag: &str, guard: Guard<'_, Self, R>) -> Guarded<R> {
        evaluate(self, tag, guard, false)
    }
}

/// Tag-keyed arms with no fallback slot
pub struct Arms<'a, V: Variant, R> {
    arms: HashMap<String, Arm<'a, V, R>>,
}

impl<'a, V: Variant, R> Arms<'a, V, R> {
    pub fn new() -> Self {
        Arms {
            arms: HashMap::new(),
        }
    }

    /// Register the arm for `tag`, replacing any earlier one
    pub fn on<F>(mut self, tag: impl Into<String>, handler: F) -> Self
    where
        F: for<'v> FnOnce(&'v V::Payload, &'v V) -> R + 'a,
    {
        self.arms.insert(tag.into(), Box::new(handler));
        self
    }

    pub fn otherwise<F>(self, fallback: F) -> Handlers<'a, V, R>
    where
        F: for<'v> FnOnce(&'v V) -> R + 'a,
    {
        Handlers::WithFallback(self, Box::new(fallback))
    }

    pub fn covers(&self, tag: &str) -> bool {
        self.arms.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }

    fn take(&mut self, tag: &str) -> Option<Arm<'a, V, R>> {
        self.arms.remove(tag)
    }
}

impl<'a, V: Variant, R> Default for Arms<'a, V, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, V: Variant, R> fmt::Debug for Arms<'a, V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.arms.keys()).finish()
    }
}

/// A handler map: either exhaustive arms, or arms plus a fallback
pub enum Handlers<'a, V: Variant, R> {
    Exhaustive(Arms<'a, V, R>),
    WithFallback(Arms<'a, V, R>, Fallback<'a, V, R>),
}

impl<'a, V: Variant, R> Handlers<'a, V, R> {
    pub fn new() -> Self {
        Handlers::Exhaustive(Arms::new())
    }

    pub fn on<F>(self, tag: impl Into<String>, handler: F) -> Self
    where
        F: for<'v> FnOnce(&'v V::Payload, &'v V) -> R + 'a,
    {
        match self {
            Handlers::Exhaustive(arms) => Handlers::Exhaustive(arms.on(tag, handler)),
            Handlers::WithFallback(arms, fallback) => {
                Handlers::WithFallback(arms.on(tag, handler), fallback)
            }
        }
    }

    /// Set the fallback, replacing any earlier one
    pub fn otherwise<F>(self, fallback: F) -> Self
    where
        F: for<'v> FnOnce(&'v V) -> R + 'a,
    {
        let (arms, _) = self.split();
        Handlers::WithFallback(arms, Box::new(fallback))
    }

    pub fn has_fallback(&self) -> bool {
        matches!(self, Handlers::WithFallback(..))
    }

    fn split(self) -> (Arms<'a, V, R>, Option<Fallback<'a, V, R>>) {
        match self {
            Handlers::Exhaustive(arms) => (arms, None),
            Handlers::WithFallback(arms, fallback) => (arms, Some(fallback)),
        }
    }
}

impl<'a, V: Variant, O> Handlers<'a, V, BoxFuture<'a, O>> {
    /// Register an async arm. The returned future must own what it uses;
    /// clone out of the payload before the `async` block.
    pub fn on_async<F, Fut>(self, tag: impl Into<String>, handler: F) -> Self
    where
        F: for<'v> FnOnce(&'v V::Payload, &'v V) -> Fut + 'a,
        Fut: Future<Output = O> + Send + 'a,
    {
        self.on(tag, move |payload, value| {
            Box::pin(handler(payload, value)) as BoxFuture<'a, O>
        })
    }

    pub fn otherwise_async<F, Fut>(self, fallback: F) -> Self
    where
        F: for<'v> FnOnce(&'v V) -> Fut + 'a,
        Fut: Future<Output = O> + Send + 'a,
    {
        self.otherwise(move |value| Box::pin(fallback(value)) as BoxFuture<'a, O>)
    }
}

impl<'a, V: Variant, R> Default for Handlers<'a, V, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, V: Variant, R> From<Arms<'a, V, R>> for Handlers<'a, V, R> {
    fn from(arms: Arms<'a, V, R>) -> Self {
        Handlers::Exhaustive(arms)
    }
}

impl<'a, V: Variant, R> fmt::Debug for Handlers<'a, V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handlers::Exhaustive(arms) => f.debug_tuple("Exhaustive").field(arms).finish(),
            Handlers::WithFallback(arms, _) => f
                .debug_tuple("WithFallback")
                .field(arms)
                .field(&"_")
                .finish(),
        }
    }
}

/// Optional arms for [`Variant::if_tag`] and [`Variant::if_not`].
///
/// Arms return `Option<R>`; `None` means "no value" and the guard reports a
/// flag instead.
pub struct Guard<'a, V: Variant, R> {
    matched: Option<Arm<'a, V, Option<R>>>,
    unmatched: Option<Fallback<'a, V, Option<R>>>,
}

impl<'a, V: Variant, R> Guard<'a, V, R> {
    pub fn new() -> Self {
        Guard {
            matched: None,
            unmatched: None,
        }
    }

    /// Arm for a value whose tag equals the checked tag
    pub fn matched<F>(mut self, handler: F) -> Self
    where
        F: for<'v> FnOnce(&'v V::Payload, &'v V) -> Option<R> + 'a,
    {
        self.matched = Some(Box::new(handler));
        self
    }

    /// Arm for any other variant
    pub fn unmatched<F>(mut self, handler: F) -> Self
    where
        F: for<'v> FnOnce(&'v V) -> Option<R> + 'a,
    {
        self.unmatched = Some(Box::new(handler));
        self
    }
}

impl<'a, V: Variant, R> Default for Guard<'a, V, R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guarded<R> {
    /// The arm that ran produced a value
    Value(R),
    /// No arm ran, or it produced no value
    Flag(bool),
}

impl<R> Guarded<R> {
    pub fn value(self) -> Option<R> {
        match self {
            Guarded::Value(value) => Some(value),
            Guarded::Flag(_) => None,
        }
    }

    pub fn flag(&self) -> Option<bool> {
        match self {
            Guarded::Value(_) => None,
            Guarded::Flag(flag) => Some(*flag),
        }
    }
}

fn dispatch<V: Variant, R>(value: &V, handlers: Handlers<'_, V, R>) -> Result<R> {
    let (mut arms, fallback) = handlers.split();
    let tag = value.tag();

    if let Some(arm) = arms.take(tag) {
        return Ok(arm(value.payload(), value));
    }

    match fallback {
        Some(fallback) => {
            trace!(tag, "no arm for variant, using fallback");
            Ok(fallback(value))
        }
        None => Err(VariantError::MissingHandler {
            tag: tag.to_string(),
        }),
    }
}

fn evaluate<V: Variant, R>(value: &V, tag: &str, guard: Guard<'_, V, R>, wanted: bool) -> Guarded<R> {
    let hit = value.tag() == tag;
    let produced = if hit {
        guard.matched.and_then(|arm| arm(value.payload(), value))
    } else {
        guard.unmatched.and_then(|arm| arm(value))
    };
    trace!(tag = value.tag(), checked = tag, hit, "evaluated guard");

    match produced {
        Some(result) => Guarded::Value(result),
        None => Guarded::Flag(hit == wanted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    // A caller-defined union: dispatch works on anything implementing Variant.
    #[derive(Debug)]
    struct Signal {
        tag: &'static str,
        level: u8,
    }

    impl Variant for Signal {
        type Payload = u8;

        fn tag(&self) -> &str {
            self.tag
        }

        fn payload(&self) -> &u8 {
            &self.level
        }

        fn variant_names(&self) -> Option<Vec<&str>> {
            Some(vec!["Red", "Amber", "Green"])
        }
    }

    fn red() -> Signal {
        Signal {
            tag: "Red",
            level: 3,
        }
    }

    #[test]
    fn test_arm_receives_payload_and_value() {
        let out = red()
            .match_on(
                Signal::handlers()
                    .on("Red", |level, signal| format!("{}:{}", signal.tag, level))
                    .on("Green", |_, _| "go".to_string()),
            )
            .unwrap();
        assert_eq!(out, "Red:3");
    }

    #[test]
    fn test_fallback_only_when_no_arm() {
        let fallback_ran = Cell::new(false);
        let out = red()
            .match_on(Signal::handlers().on("Red", |l, _| *l).otherwise(|_| {
                fallback_ran.set(true);
                0
            }))
            .unwrap();
        assert_eq!(out, 3);
        assert!(!fallback_ran.get());
    }

    #[test]
    fn test_missing_handler() {
        let err = red()
            .match_on(Signal::handlers().on("Green", |l, _| *l))
            .unwrap_err();
        assert_eq!(
            err,
            VariantError::MissingHandler {
                tag: "Red".to_string()
            }
        );
    }

    #[test]
    fn test_underscore_arm_is_not_a_fallback() {
        let err = red()
            .match_on(Signal::handlers().on("_", |l, _| *l))
            .unwrap_err();
        assert!(matches!(err, VariantError::MissingHandler { .. }));
    }

    #[test]
    fn test_exhaustive_requires_every_known_variant() {
        let err = red()
            .match_exhaustive(Signal::arms().on("Red", |l, _| *l).on("Green", |l, _| *l))
            .unwrap_err();
        assert_eq!(
            err,
            VariantError::NonExhaustive {
                missing: vec!["Amber".to_string()]
            }
        );

        let ok = red().match_exhaustive(
            Signal::arms()
                .on("Red", |l, _| *l)
                .on("Amber", |_, _| 0)
                .on("Green", |_, _| 0),
        );
        assert_eq!(ok, Ok(3));
    }

    #[test]
    fn test_handler_table_shape() {
        let arms = Signal::arms::<u8>();
        assert!(arms.is_empty());
        let arms = arms.on("Red", |l, _| *l).on("Green", |l, _| *l);
        assert_eq!(arms.len(), 2);
        assert!(!arms.is_empty());

        assert!(!Signal::handlers::<u8>().on("Red", |l, _| *l).has_fallback());
        let handlers = arms.otherwise(|_| 0);
        assert!(handlers.has_fallback());
        assert_eq!(red().match_on(handlers), Ok(3));
    }

    #[test]
    fn test_guard_defaults() {
        let signal = red();
        assert_eq!(signal.if_tag("Red", Signal::guard::<()>()), Guarded::Flag(true));
        assert_eq!(signal.if_tag("Green", Signal::guard::<()>()), Guarded::Flag(false));
        assert_eq!(signal.if_not("Red", Signal::guard::<()>()), Guarded::Flag(false));
        assert_eq!(signal.if_not("Green", Signal::guard::<()>()), Guarded::Flag(true));
    }

    #[test]
    fn test_guard_arms_and_no_value_marker() {
        let signal = red();
        let hit = signal.if_tag("Red", Signal::guard().matched(|l, _| Some(*l * 2)));
        assert_eq!(hit, Guarded::Value(6));

        let silent = signal.if_tag("Red", Signal::guard::<u8>().matched(|_, _| None));
        assert_eq!(silent, Guarded::Flag(true));
        assert_eq!(hit.value(), Some(6));
        assert_eq!(silent.value(), None);

        let other = signal.if_tag("Green", Signal::guard().unmatched(|s| Some(s.tag)));
        assert_eq!(other, Guarded::Value("Red"));

        let inverse = signal.if_not("Green", Signal::guard().unmatched(|s| Some(s.level)));
        assert_eq!(inverse, Guarded::Value(3));

        let inverse_hit = signal.if_not("Red", Signal::guard::<u8>().matched(|_, _| None));
        assert_eq!(inverse_hit, Guarded::Flag(false));
    }

    #[tokio::test]
    async fn test_match_async_awaits_selected_arm() {
        let level = red()
            .match_async(
                Signal::async_handlers()
                    .on_async("Red", |l, _| {
                        let l = *l;
                        async move { l + 1 }
                    })
                    .otherwise_async(|_| async { 0 }),
            )
            .await
            .unwrap();
        assert_eq!(level, 4);
    }

    #[tokio::test]
    async fn test_match_async_missing_handler() {
        let err = red()
            .match_async(Signal::async_handlers::<u8>().on_async("Green", |_, _| async { 1 }))
            .await
            .unwrap_err();
        assert!(matches!(err, VariantError::MissingHandler { .. }));
    }
}
