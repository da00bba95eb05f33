// Factory layer - constructors and wire parsing for one schema

use crate::error::{Result, VariantError};
use crate::schema::{VariantSchema, RESERVED_TAG};
use crate::value::{Payload, Tag, TaggedValue, Wire};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// How a factory resolves variant names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Any tag except `_` is accepted and resolved on every access.
    /// Declared tags still get their payload validated.
    Dynamic,
    /// Only the bound tags are accepted. Each is resolved once up front.
    Prebound,
}

enum Binding {
    Dynamic,
    Prebound {
        order: Vec<Tag>,
        slots: HashMap<Tag, usize>,
    },
}

struct Inner {
    schema: VariantSchema,
    binding: Binding,
}

/// Builds [`TaggedValue`]s for one [`VariantSchema`].
///
/// Cloning is cheap (a shared handle). A dynamic factory is the trust-boundary
/// escape hatch: its `parse` accepts tags the local schema has never heard of,
/// so use [`VariantFactory::closed`] for untrusted input.
#[derive(Clone)]
pub struct VariantFactory {
    inner: Arc<Inner>,
}

/// A resolved constructor for a single variant
#[derive(Clone)]
pub struct Constructor {
    tag: Tag,
    slot: Option<usize>,
    factory: VariantFactory,
}

impl VariantFactory {
    /// Open factory: no explicit variant list
    pub fn dynamic(schema: VariantSchema) -> Result<Self> {
        check_declarations(&schema)?;
        debug!(schema = %schema.name, mode = "dynamic", "created variant factory");
        Ok(Self::from_parts(schema, Binding::Dynamic))
    }

    /// Closed factory bound to an explicit list of declared variant names
    pub fn prebound<I, S>(schema: VariantSchema, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        check_declarations(&schema)?;

        let mut order = Vec::new();
        let mut slots = HashMap::new();
        for name in names {
            let name = name.as_ref();
            if name == RESERVED_TAG {
                return Err(VariantError::reserved(name));
            }
            let slot = schema
                .position(name)
                .ok_or_else(|| VariantError::unknown(&schema.name, name))?;
            let tag = Tag::new(name);
            if slots.insert(tag.clone(), slot).is_none() {
                order.push(tag);
            }
        }

        debug!(
            schema = %schema.name,
            mode = "prebound",
            bound = order.len(),
            "created variant factory"
        );
        Ok(Self::from_parts(schema, Binding::Prebound { order, slots }))
    }

    /// Closed factory over every declared variant
    pub fn closed(schema: VariantSchema) -> Result<Self> {
        let names: Vec<String> = schema.names().map(str::to_string).collect();
        Self::prebound(schema, names)
    }

    /// Closed factory for the built-in adapter schemas, which are known to be
    /// well formed.
    pub(crate) fn adapter(schema: VariantSchema) -> Self {
        let order: Vec<Tag> = schema.names().map(Tag::new).collect();
        let slots = order.iter().cloned().zip(0..).collect();
        Self::from_parts(schema, Binding::Prebound { order, slots })
    }

    fn from_parts(schema: VariantSchema, binding: Binding) -> Self {
        VariantFactory {
            inner: Arc::new(Inner { schema, binding }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.schema.name
    }

    pub fn schema(&self) -> &VariantSchema {
        &self.inner.schema
    }

    pub fn mode(&self) -> Mode {
        match self.inner.binding {
            Binding::Dynamic => Mode::Dynamic,
            Binding::Prebound { .. } => Mode::Prebound,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.mode() == Mode::Prebound
    }

    /// Union-type metadata: bound names when closed, declared names otherwise
    pub fn variants(&self) -> Vec<&str> {
        match &self.inner.binding {
            Binding::Dynamic => self.inner.schema.names().collect(),
            Binding::Prebound { order, .. } => order.iter().map(Tag::as_str).collect(),
        }
    }

    /// Resolve the constructor for `tag`
    pub fn constructor(&self, tag: &str) -> Result<Constructor> {
        if tag == RESERVED_TAG {
            return Err(VariantError::reserved(tag));
        }

        match &self.inner.binding {
            Binding::Prebound { slots, .. } => {
                let (tag, slot) = slots
                    .get_key_value(tag)
                    .ok_or_else(|| VariantError::unknown(self.name(), tag))?;
                Ok(Constructor {
                    tag: tag.clone(),
                    slot: Some(*slot),
                    factory: self.clone(),
                })
            }
            Binding::Dynamic => Ok(Constructor {
                tag: Tag::new(tag),
                slot: self.inner.schema.position(tag),
                factory: self.clone(),
            }),
        }
    }

    pub fn construct(&self, tag: &str, payload: Payload) -> Result<TaggedValue> {
        self.constructor(tag)?.call(payload)
    }

    /// Construct a variant carrying the empty marker
    pub fn empty(&self, tag: &str) -> Result<TaggedValue> {
        self.construct(tag, Payload::Null)
    }

    /// Rebuild a value from its wire form. The only entry point meant for
    /// untrusted input.
    pub fn parse(&self, wire: Wire) -> Result<TaggedValue> {
        let Wire { tag, data } = wire;
        self.construct(&tag, data).map_err(|err| {
            debug!(schema = %self.name(), tag = %tag, error = %err, "rejected wire value");
            err
        })
    }

    pub fn parse_json(&self, json: &str) -> Result<TaggedValue> {
        let wire: Wire =
            serde_json::from_str(json).map_err(|e| VariantError::Wire(e.to_string()))?;
        self.parse(wire)
    }

    pub fn parse_value(&self, json: Payload) -> Result<TaggedValue> {
        let wire: Wire =
            serde_json::from_value(json).map_err(|e| VariantError::Wire(e.to_string()))?;
        self.parse(wire)
    }
}

impl Constructor {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn call(&self, payload: Payload) -> Result<TaggedValue> {
        if let Some(slot) = self.slot {
            self.factory.inner.schema.variants[slot]
                .payload
                .check(&payload)
                .map_err(|e| VariantError::payload(&self.tag, e))?;
        }
        Ok(TaggedValue::new(
            self.tag.clone(),
            payload,
            self.factory.clone(),
        ))
    }
}

fn check_declarations(schema: &VariantSchema) -> Result<()> {
    if schema.names().any(|name| name == RESERVED_TAG) {
        return Err(VariantError::reserved(RESERVED_TAG));
    }
    schema.validate()?;
    Ok(())
}

impl fmt::Debug for VariantFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantFactory")
            .field("name", &self.name())
            .field("mode", &self.mode())
            .field("variants", &self.variants())
            .finish()
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("factory", &self.factory.name())
            .field("tag", &self.tag)
            .finish()
    }
}
