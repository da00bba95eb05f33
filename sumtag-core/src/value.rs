// Core value types for sumtag

use crate::dispatch::Variant;
use crate::error::Result;
use crate::factory::VariantFactory;
use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Dynamic payload. `null` is the empty marker for unit variants.
pub type Payload = serde_json::Value;

/// Interned variant name. Pre-bound factories hand out clones of one
/// allocation per variant.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub(crate) Arc<str>);

impl Tag {
    pub fn new(name: &str) -> Self {
        Tag(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Tag {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Tag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialized form: `{ "tag": <name>, "data": <payload> }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub tag: String,
    #[serde(default)]
    pub data: Payload,
}

impl Wire {
    pub fn new(tag: impl Into<String>, data: Payload) -> Self {
        Wire {
            tag: tag.into(),
            data,
        }
    }
}

/// An immutable `{ tag, payload }` instance produced by a [`VariantFactory`].
///
/// The value holds a handle to its factory so sibling variants can be built
/// from inside a handler. The factory keeps no reference back.
#[derive(Clone)]
pub struct TaggedValue {
    tag: Tag,
    payload: Payload,
    factory: VariantFactory,
}

impl TaggedValue {
    pub(crate) fn new(tag: Tag, payload: Payload, factory: VariantFactory) -> Self {
        TaggedValue {
            tag,
            payload,
            factory,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn factory(&self) -> &VariantFactory {
        &self.factory
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// Construct another variant of the same union
    pub fn sibling(&self, tag: &str, payload: Payload) -> Result<TaggedValue> {
        self.factory.construct(tag, payload)
    }

    /// Lossless projection to the wire form
    pub fn to_wire(&self) -> Wire {
        Wire::new(self.tag.as_str(), self.payload.clone())
    }

    pub fn into_wire(self) -> Wire {
        Wire {
            tag: self.tag.as_str().to_string(),
            data: self.payload,
        }
    }
}

impl Variant for TaggedValue {
    type Payload = Payload;

    fn tag(&self) -> &str {
        &self.tag
    }

    fn payload(&self) -> &Payload {
        &self.payload
    }

    fn variant_names(&self) -> Option<Vec<&str>> {
        if self.factory.is_closed() {
            Some(self.factory.variants())
        } else {
            None
        }
    }
}

// Equality is structural over tag and payload; the factory handle is not
// part of a value's identity.
impl PartialEq for TaggedValue {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.payload == other.payload
    }
}

impl fmt::Debug for TaggedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggedValue")
            .field("tag", &self.tag)
            .field("payload", &self.payload)
            .finish()
    }
}

impl Serialize for TaggedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct WireRef<'a> {
            tag: &'a str,
            data: &'a Payload,
        }

        WireRef {
            tag: &self.tag,
            data: &self.payload,
        }
        .serialize(serializer)
    }
}
