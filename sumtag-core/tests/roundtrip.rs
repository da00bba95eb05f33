// Property-based wire roundtrip tests for sumtag

mod common;

use common::*;
use proptest::prelude::*;
use sumtag_core::dispatch::Variant;
use sumtag_core::factory::VariantFactory;
use sumtag_core::maybe::Maybe;
use sumtag_core::outcome::Outcome;
use sumtag_core::value::Wire;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// parse(to_wire(v)) equals v for a pre-bound factory
    #[test]
    fn test_prebound_wire_roundtrip((schema, wire) in arb_schema_and_wire()) {
        let factory = VariantFactory::closed(schema)?;
        let value = factory.parse(wire.clone())?;
        prop_assert_eq!(value.to_wire(), wire);
        prop_assert_eq!(factory.parse(value.to_wire())?, value);
    }

    /// Same for a dynamic factory
    #[test]
    fn test_dynamic_wire_roundtrip((schema, wire) in arb_schema_and_wire()) {
        let factory = VariantFactory::dynamic(schema)?;
        let value = factory.parse(wire)?;
        prop_assert_eq!(factory.parse(value.to_wire())?, value);
    }

    /// Both modes build the same value from the same input
    #[test]
    fn test_modes_agree((schema, wire) in arb_schema_and_wire()) {
        let closed = VariantFactory::closed(schema.clone())?;
        let open = VariantFactory::dynamic(schema)?;
        prop_assert_eq!(closed.parse(wire.clone())?, open.parse(wire)?);
    }

    /// The JSON text form survives too
    #[test]
    fn test_json_text_roundtrip((schema, wire) in arb_schema_and_wire()) {
        let factory = VariantFactory::closed(schema)?;
        let value = factory.parse(wire)?;
        let text = serde_json::to_string(&value)?;
        prop_assert_eq!(factory.parse_json(&text)?, value);
    }

    /// A value carries its own closed variant set
    #[test]
    fn test_closed_values_know_their_variants((schema, wire) in arb_schema_and_wire()) {
        let names: Vec<String> = schema.names().map(str::to_string).collect();
        let value = VariantFactory::closed(schema)?.parse(wire)?;
        let known = value.variant_names().unwrap_or_default();
        prop_assert_eq!(known, names.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_outcome_wire_roundtrip(outcome in prop_oneof![
        any::<i64>().prop_map(Outcome::<i64, String>::Ok),
        "[a-z]{0,10}".prop_map(Outcome::<i64, String>::Err),
    ]) {
        let wire = outcome.to_wire()?;
        prop_assert_eq!(Outcome::<i64, String>::from_wire(wire)?, outcome);
    }

    #[test]
    fn test_maybe_wire_roundtrip(maybe in any::<Option<Vec<u16>>>().prop_map(Maybe::from)) {
        let wire = maybe.to_wire()?;
        let expected_tag = if maybe.is_some() { "Some" } else { "None" };
        prop_assert_eq!(wire.tag.as_str(), expected_tag);
        prop_assert_eq!(Maybe::<Vec<u16>>::from_wire(wire)?, maybe);
    }
}

#[test]
fn test_missing_data_reads_as_empty_marker() {
    let factory = VariantFactory::closed(status_schema()).unwrap();
    let loading = factory.parse_json(r#"{"tag": "Loading"}"#).unwrap();
    assert_eq!(loading.to_wire(), Wire::new("Loading", serde_json::Value::Null));
}
