//! Value-state invariants under arbitrary input.

use fiatlight_core::{Bounds, DataValue, FiatAttributes, FiatRecord, FiatType, FiatValue, GuiRegistry, TypeSpec};
use proptest::prelude::*;

#[derive(FiatRecord, Debug, Clone, PartialEq)]
struct Sample {
    count: i64,
    ratio: f64,
    name: String,
    tags: Vec<String>,
    pair: (i64, bool),
    note: Option<String>,
}

/// Saves a widget holding `value`, loads the document into a fresh widget
/// for `T`, and returns the loaded state.
fn reloaded<T: FiatType>(value: T) -> DataValue {
    let registry = GuiRegistry::new();
    let saved = registry
        .to_data_with_gui(value, &FiatAttributes::new())
        .unwrap()
        .call_save_to_dict();
    let mut fresh = registry.factor_type::<T>(&FiatAttributes::new()).unwrap();
    fresh.call_load_from_dict(&saved).unwrap();
    fresh.value().clone()
}

fn sample() -> impl Strategy<Value = Sample> {
    (
        any::<i64>(),
        -1.0e6..1.0e6f64,
        ".{0,12}",
        prop::collection::vec("[a-z]{0,6}", 0..4),
        (any::<i64>(), any::<bool>()),
        prop::option::of(".{0,8}"),
    )
        .prop_map(|(count, ratio, name, tags, pair, note)| Sample {
            count,
            ratio,
            name,
            tags,
            pair,
            note,
        })
}

proptest! {
    #[test]
    fn bounded_ints_are_valid_exactly_inside_the_bounds(x in -1_000i64..1_000, lo in -50i64..50, span in 0i64..100) {
        let hi = lo + span;
        let registry = GuiRegistry::new();
        let spec = TypeSpec::annotated(TypeSpec::Int, Bounds::between(lo as f64, hi as f64));
        let mut data = registry.factor(&spec, &FiatAttributes::new()).unwrap();

        data.set_value(FiatValue::Int(x));
        if (lo..=hi).contains(&x) {
            prop_assert_eq!(data.value(), &DataValue::Value(FiatValue::Int(x)));
        } else {
            prop_assert!(data.value().is_invalid());
            prop_assert_eq!(data.value().displayed_value(), Some(&FiatValue::Int(x)));
        }
    }

    #[test]
    fn only_valid_values_are_persisted(values in prop::collection::vec(-20i64..20, 1..20)) {
        let registry = GuiRegistry::new();
        let attrs = FiatAttributes::new().with_validator("validator", |v: &FiatValue| match v {
            FiatValue::Int(n) if *n >= 0 => Ok(v.clone()),
            _ => Err("must be non-negative".to_string()),
        });
        let mut data = registry.factor_type::<i64>(&attrs).unwrap();

        for x in values {
            data.set_value(FiatValue::Int(x));
            let saved = data.call_save_to_dict();
            if x >= 0 {
                prop_assert_eq!(saved["value"].as_i64(), Some(x));
            } else {
                prop_assert_eq!(saved["type"].as_str(), Some("Unspecified"));
                prop_assert_eq!(data.value().invalid_message(), Some("must be non-negative"));
            }
        }
    }

    #[test]
    fn forwarding_keeps_only_the_addressed_parameter(names in prop::collection::vec("[a-z]{1,6}", 1..6)) {
        let mut attrs = FiatAttributes::new();
        for (idx, name) in names.iter().enumerate() {
            attrs.insert(format!("{name}__width"), idx as i64);
        }
        for name in &names {
            let own = attrs.for_param(name);
            let expected = names.iter().rposition(|n| n == name).map(|idx| idx as i64);
            prop_assert_eq!(own.get_int("width"), expected);
            prop_assert_eq!(own.names().count(), 1);
        }
    }

    #[test]
    fn saved_ints_and_strings_load_back(x in any::<i64>(), text in ".{0,24}") {
        prop_assert_eq!(reloaded(x), DataValue::Value(x.into_fiat()));
        prop_assert_eq!(reloaded(text.clone()), DataValue::Value(text.into_fiat()));
    }

    #[test]
    fn saved_floats_load_back_including_non_finite(x in prop::num::f64::ANY) {
        let loaded = reloaded(x);
        let loaded = loaded.as_value().and_then(FiatValue::as_float).unwrap();
        if x.is_nan() {
            prop_assert!(loaded.is_nan());
        } else {
            prop_assert_eq!(loaded, x);
        }
    }

    #[test]
    fn saved_containers_load_back(
        maybe in prop::option::of(any::<i64>()),
        list in prop::collection::vec(any::<i64>(), 0..8),
        pair in (any::<i64>(), ".{0,8}"),
    ) {
        prop_assert_eq!(reloaded(maybe), DataValue::Value(maybe.into_fiat()));
        prop_assert_eq!(reloaded(list.clone()), DataValue::Value(list.into_fiat()));
        prop_assert_eq!(reloaded(pair.clone()), DataValue::Value(pair.into_fiat()));
    }

    #[test]
    fn saved_records_load_back(value in sample()) {
        let loaded = reloaded(value.clone());
        let loaded = Sample::from_fiat(loaded.as_value().unwrap().clone()).unwrap();
        prop_assert_eq!(loaded, value);
    }
}
