//! `#[fiat_function]` on plain functions.

use fiatlight_core::{DataValue, FiatValue, ParamKind};
use fiatlight_graph::{FunctionsGraph, fiat_function};

/// Scales a value.
#[fiat_function(label = "Scale", attributes(return__range = (0, 100)))]
fn scale(
    /// Value to scale.
    x: i64,
    /// Multiplier.
    #[fiat(default = 3, attributes(range = (1, 10)))]
    factor: i64,
) -> i64 {
    x * factor
}

#[fiat_function(invoke_async, invoke_always_dirty)]
fn clock() -> i64 {
    0
}

#[fiat_function]
fn greet(name: Option<String>) -> String {
    format!("hello {}", name.as_deref().unwrap_or("world"))
}

#[test]
fn the_function_stays_callable() {
    assert_eq!(scale(2, 5), 10);
    assert_eq!(greet(None), "hello world");
}

#[test]
fn parameters_carry_names_docs_and_defaults() {
    let function = scale_with_gui().unwrap();
    assert_eq!(function.name(), "scale");
    assert_eq!(function.label(), "Scale");
    assert_eq!(function.doc(), Some("Scales a value."));
    assert_eq!(function.input_names(), ["x", "factor"]);

    let x = function.input("x").unwrap();
    assert_eq!(x.param_kind, ParamKind::PositionalOrKeyword);
    assert_eq!(x.data_with_gui.tooltip(), Some("Value to scale."));
    assert!(x.default_value.is_unspecified());

    let factor = function.input("factor").unwrap();
    assert_eq!(factor.default_value, DataValue::Value(FiatValue::Int(3)));
    assert!(factor.data_with_gui.fiat_attributes().get("range").is_some());
    assert!(function.output(0).unwrap().fiat_attributes().get("range").is_some());
}

#[test]
fn flags_are_applied() {
    let function = clock_with_gui().unwrap();
    assert!(function.invoke_async());
    assert!(function.invoke_always_dirty());
    assert!(!function.invoke_manually());
    assert_eq!(function.nb_inputs(), 0);
}

#[test]
fn generated_functions_run_in_a_graph() {
    let mut graph = FunctionsGraph::new();
    graph.add_function(scale_with_gui().unwrap());
    graph.add_function(greet_with_gui().unwrap());

    graph.set_param_value("scale", "x", FiatValue::Int(4)).unwrap();
    graph.invoke_all().unwrap();
    let scale = graph.function_with_gui_by_unique_name("scale").unwrap();
    assert_eq!(scale.output(0).unwrap().value(), &DataValue::Value(FiatValue::Int(12)));
    let greet = graph.function_with_gui_by_unique_name("greet").unwrap();
    assert_eq!(
        greet.output(0).unwrap().value(),
        &DataValue::Value(FiatValue::Str("hello world".to_string()))
    );
}
