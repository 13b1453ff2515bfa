//! Derived reflected types going through the registry.

use fiatlight_core::ui::HeadlessUi;
use fiatlight_core::widgets::{IntWidget, RecordWidget};
use fiatlight_core::{
    DataValue, FiatAttributes, FiatEnum, FiatNewType, FiatRecord, FiatType, FiatValue, GuiRegistry, RecordKind,
    RegistryError, TypeSpec,
};

/// Bounded settings.
#[derive(FiatRecord, Debug, PartialEq)]
#[fiat(model)]
struct Settings {
    /// Strength, from 0 to 10.
    #[fiat(ge = 0, le = 10, default = 0)]
    x: i64,
    #[fiat(default)]
    label: String,
}

/// An axis-aligned box.
#[derive(FiatRecord, Debug, PartialEq)]
#[fiat(validator = check_box, attributes(width__range = (1, 50)))]
struct Rect {
    width: i64,
    height: i64,
}

fn check_box(rect: &Rect) -> Result<(), String> {
    if rect.height > rect.width {
        Err("a box is never taller than wide".to_string())
    } else {
        Ok(())
    }
}

#[derive(FiatEnum, Debug, PartialEq)]
enum Mode {
    Fast,
    /// Slower but exact.
    #[fiat(label = "Exact (slow)")]
    Exact,
}

/// A non-negative duration, in seconds.
#[derive(FiatNewType, Debug, PartialEq)]
#[fiat(ge = 0)]
struct Seconds(f64);

fn settings(x: i64) -> FiatValue {
    Settings {
        x,
        label: String::new(),
    }
    .into_fiat()
}

#[test]
fn model_field_bounds_become_range_and_validator() {
    let registry = GuiRegistry::new();
    let mut data = registry.factor_type::<Settings>(&FiatAttributes::new()).unwrap();

    let record = data.widget_as::<RecordWidget>().unwrap();
    assert_eq!(record.spec().kind, RecordKind::Model);
    let x = record.field("x").unwrap();
    assert_eq!(x.data_with_gui.widget_as::<IntWidget>().unwrap().params().range, (0, 10));
    assert_eq!(x.default_value, DataValue::Value(FiatValue::Int(0)));
    assert_eq!(x.data_with_gui.tooltip(), Some("Strength, from 0 to 10."));

    data.set_value(settings(11));
    let message = data.value().invalid_message().unwrap();
    assert!(message.contains("Input should be less than or equal to 10"), "{message}");
    assert_eq!(data.value().displayed_value(), Some(&settings(11)));

    data.set_value(settings(10));
    assert_eq!(data.value(), &DataValue::Value(settings(10)));
}

#[test]
fn redrawing_an_invalid_record_keeps_the_field_invalid() {
    let registry = GuiRegistry::new();
    let mut data = registry.factor_type::<Settings>(&FiatAttributes::new()).unwrap();
    data.set_value(settings(11));

    let mut ui = HeadlessUi::new();
    for _ in 0..2 {
        assert!(!data.gui_edit(&mut ui));
    }
    let x = data.widget_as::<RecordWidget>().unwrap().field("x").unwrap();
    assert_eq!(x.data_with_gui.value().displayed_value(), Some(&FiatValue::Int(11)));
    assert!(x.data_with_gui.value().is_invalid());
    assert!(data.value().is_invalid());

    data.set_value(settings(4));
    assert!(!data.gui_edit(&mut ui));
    let x = data.widget_as::<RecordWidget>().unwrap().field("x").unwrap();
    assert_eq!(x.data_with_gui.value(), &DataValue::Value(FiatValue::Int(4)));
}

#[test]
fn record_default_uses_field_defaults() {
    let registry = GuiRegistry::new();
    let default: Settings = registry.construct_default().unwrap();
    assert_eq!(
        default,
        Settings {
            x: 0,
            label: String::new()
        }
    );
}

#[test]
fn record_validator_and_attributes_apply() {
    let registry = GuiRegistry::new();
    let mut data = registry.factor_type::<Rect>(&FiatAttributes::new()).unwrap();

    let width = data.widget_as::<RecordWidget>().unwrap().field("width").unwrap();
    assert_eq!(width.data_with_gui.widget_as::<IntWidget>().unwrap().params().range, (1, 50));

    data.set_typed(Rect { width: 3, height: 8 });
    assert_eq!(
        data.value().invalid_message(),
        Some("a box is never taller than wide")
    );
    data.set_typed(Rect { width: 8, height: 3 });
    assert!(data.value().is_valid());
    assert_eq!(
        Rect::from_fiat(data.value().as_value().unwrap().clone()).unwrap(),
        Rect { width: 8, height: 3 }
    );
}

#[test]
fn record_values_round_trip_through_json() {
    let registry = GuiRegistry::new();
    let mut data = registry.to_data_with_gui(Settings { x: 4, label: "four".into() }, &FiatAttributes::new()).unwrap();
    let saved = data.call_save_to_dict();
    assert_eq!(saved["type"], "Pydantic");

    data.set_value(settings(0));
    data.call_load_from_dict(&saved).unwrap();
    assert_eq!(
        Settings::from_fiat(data.value().as_value().unwrap().clone()).unwrap(),
        Settings { x: 4, label: "four".into() }
    );
}

#[test]
fn enum_variants_carry_labels() {
    let TypeSpec::Enum(spec) = Mode::type_spec() else {
        panic!("enum spec expected");
    };
    assert_eq!(spec.variants.len(), 2);
    assert_eq!(spec.variants[1].label.as_deref(), Some("Exact (slow)"));
    assert_eq!(Mode::from_fiat(Mode::Exact.into_fiat()).unwrap(), Mode::Exact);

    let registry = GuiRegistry::new();
    let default: Mode = registry.construct_default().unwrap();
    assert_eq!(default, Mode::Fast);
}

#[test]
fn new_types_keep_their_doc_and_bounds() {
    let TypeSpec::NewType(spec) = Seconds::type_spec() else {
        panic!("new type spec expected");
    };
    assert_eq!(spec.doc.as_deref(), Some("A non-negative duration, in seconds."));

    let registry = GuiRegistry::new();
    let mut data = registry.factor_type::<Seconds>(&FiatAttributes::new()).unwrap();
    assert_eq!(data.tooltip(), Some("A non-negative duration, in seconds."));
    data.set_typed(Seconds(-1.0));
    assert_eq!(
        data.value().invalid_message(),
        Some("Input should be greater than or equal to 0")
    );
}

#[test]
fn unknown_field_attributes_are_rejected() {
    let registry = GuiRegistry::new();
    let attrs = FiatAttributes::new().with("width__colour", "red");
    let err = registry.factor_type::<Rect>(&attrs).unwrap_err();
    assert!(matches!(err, RegistryError::UnknownAttribute { .. }), "{err}");
}
