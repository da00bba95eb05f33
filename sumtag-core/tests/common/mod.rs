// Test utilities and generators for sumtag property-based testing

#![allow(dead_code)]

use proptest::prelude::*;
use serde_json::{Map, Number};
use sumtag_core::schema::{PayloadSchema, VariantSchema};
use sumtag_core::value::{Payload, Wire};

/// Generate variant names. Never the reserved `_`.
pub fn arb_variant_name() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z0-9]{0,8}"
}

/// Generate struct field names
pub fn arb_field_name() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,6}"
}

/// Generate payload descriptors with limited recursion depth
pub fn arb_payload_schema_depth(depth: u32) -> impl Strategy<Value = PayloadSchema> {
    let leaf = prop_oneof![
        Just(PayloadSchema::Unit),
        Just(PayloadSchema::Bool),
        Just(PayloadSchema::Int),
        Just(PayloadSchema::Double),
        Just(PayloadSchema::Text),
        Just(PayloadSchema::Timestamp),
        Just(PayloadSchema::Any),
    ];

    leaf.prop_recursive(depth, 32, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(PayloadSchema::array),
            inner.clone().prop_map(PayloadSchema::optional),
            prop::collection::btree_map(arb_field_name(), inner, 0..4)
                .prop_map(|fields| PayloadSchema::record(fields)),
        ]
    })
}

pub fn arb_payload_schema() -> impl Strategy<Value = PayloadSchema> {
    arb_payload_schema_depth(3)
}

/// Generate a valid schema with 1-6 distinct variants
pub fn arb_schema() -> impl Strategy<Value = VariantSchema> {
    (
        arb_variant_name(),
        prop::collection::btree_map(arb_variant_name(), arb_payload_schema(), 1..6),
    )
        .prop_map(|(name, variants)| {
            variants
                .into_iter()
                .fold(VariantSchema::new(name), |schema, (tag, payload)| {
                    schema.variant(tag, payload)
                })
        })
}

/// Generate arbitrary JSON leaves, for `Any` payloads
pub fn arb_json_leaf() -> impl Strategy<Value = Payload> {
    prop_oneof![
        Just(Payload::Null),
        any::<bool>().prop_map(Payload::Bool),
        any::<i64>().prop_map(Payload::from),
        "[a-z ]{0,12}".prop_map(Payload::String),
    ]
}

/// Generate a payload that satisfies `schema`
pub fn arb_payload_for(schema: &PayloadSchema) -> BoxedStrategy<Payload> {
    match schema {
        PayloadSchema::Unit => Just(Payload::Null).boxed(),
        PayloadSchema::Bool => any::<bool>().prop_map(Payload::Bool).boxed(),
        PayloadSchema::Int | PayloadSchema::Timestamp => {
            any::<i64>().prop_map(Payload::from).boxed()
        }
        // quarters keep the decimal text form exact
        PayloadSchema::Double => (-1_000_000i32..1_000_000)
            .prop_filter_map("finite", |n| Number::from_f64(f64::from(n) / 4.0))
            .prop_map(Payload::Number)
            .boxed(),
        PayloadSchema::Text => "[a-zA-Z0-9 ]{0,16}".prop_map(Payload::String).boxed(),
        PayloadSchema::Any => arb_json_leaf().boxed(),
        PayloadSchema::Array { element } => {
            prop::collection::vec(arb_payload_for(element), 0..4)
                .prop_map(Payload::Array)
                .boxed()
        }
        PayloadSchema::Optional { inner } => {
            prop_oneof![Just(Payload::Null), arb_payload_for(inner)].boxed()
        }
        PayloadSchema::Struct { fields } => {
            let entries: Vec<BoxedStrategy<(String, Payload)>> = fields
                .iter()
                .map(|field| {
                    let name = field.name.clone();
                    arb_payload_for(&field.schema)
                        .prop_map(move |value| (name.clone(), value))
                        .boxed()
                })
                .collect();
            entries
                .prop_map(|pairs| Payload::Object(pairs.into_iter().collect::<Map<_, _>>()))
                .boxed()
        }
    }
}

/// Generate a schema together with a wire value of one of its variants
pub fn arb_schema_and_wire() -> impl Strategy<Value = (VariantSchema, Wire)> {
    arb_schema().prop_flat_map(|schema| {
        let count = schema.variants.len();
        (Just(schema), 0..count).prop_flat_map(|(schema, index)| {
            let def = schema.variants[index].clone();
            (Just(schema), arb_payload_for(&def.payload))
                .prop_map(move |(schema, data)| (schema, Wire::new(def.name.clone(), data)))
        })
    })
}

/// Generate a payload that does *not* satisfy a scalar descriptor
pub fn arb_mismatched_scalar() -> impl Strategy<Value = (PayloadSchema, Payload)> {
    prop_oneof![
        any::<i64>().prop_map(|n| (PayloadSchema::Text, Payload::from(n))),
        "[a-z]{1,8}".prop_map(|s| (PayloadSchema::Int, Payload::String(s))),
        any::<bool>().prop_map(|b| (PayloadSchema::Timestamp, Payload::Bool(b))),
        any::<i64>().prop_map(|n| (PayloadSchema::Bool, Payload::from(n))),
        "[a-z]{1,8}".prop_map(|s| (PayloadSchema::Unit, Payload::String(s))),
    ]
}

/// The status union used across the scenario tests
pub fn status_schema() -> VariantSchema {
    VariantSchema::new("Status")
        .unit("Loading")
        .variant(
            "Ready",
            PayloadSchema::record([("finishedAt", PayloadSchema::Timestamp)]),
        )
        .variant("Failed", PayloadSchema::Text)
}
