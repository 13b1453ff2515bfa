//! End-to-end behavior of function graphs.

use fiatlight_core::{DataValue, FiatAttributes, FiatValue};
use fiatlight_graph::{FunctionWithGui, FunctionsGraph, GraphError};

fn add() -> FunctionWithGui {
    FunctionWithGui::builder("add", |a: i64, b: i64| a + b)
        .signature_str("add(a: int, b: int = 2) -> int")
        .build()
        .unwrap()
}

fn mul2() -> FunctionWithGui {
    FunctionWithGui::builder("mul2", |a: i64| a * 2)
        .signature_str("mul2(a: int) -> int")
        .build()
        .unwrap()
}

fn with_unit() -> FunctionWithGui {
    FunctionWithGui::builder("with_unit", |n: i64, unit: String| format!("{n}{unit}"))
        .signature_str("with_unit(n: int, unit: str = 'px') -> str")
        .build()
        .unwrap()
}

fn factory(name: &str) -> Option<FunctionWithGui> {
    match name {
        "add" => Some(add()),
        "mul2" => Some(mul2()),
        "with_unit" => Some(with_unit()),
        _ => None,
    }
}

fn output(graph: &FunctionsGraph, unique_name: &str, idx: usize) -> DataValue {
    graph
        .function_with_gui_by_unique_name(unique_name)
        .and_then(|f| f.output(idx))
        .map(|o| o.value().clone())
        .unwrap_or_default()
}

#[test]
fn linear_pipeline() {
    let mut graph = FunctionsGraph::from_function_composition(vec![add(), mul2()]);
    graph.set_param_value("add", "a", FiatValue::Int(3)).unwrap();
    graph.invoke_all().unwrap();

    assert_eq!(output(&graph, "add", 0), DataValue::Value(FiatValue::Int(5)));
    assert_eq!(output(&graph, "mul2", 0), DataValue::Value(FiatValue::Int(10)));

    let mul2_id = graph.node_by_unique_name("mul2").unwrap().id().clone();
    assert_eq!(
        graph.input_link_info(&mul2_id, "a").as_deref(),
        Some("linked to add (output 0)")
    );
}

#[test]
fn invalid_input_is_kept_and_not_propagated() {
    let attributes = FiatAttributes::new().with_validator("x__validator", |value: &FiatValue| match value {
        FiatValue::Int(n) if n % 2 == 0 => Ok(value.clone()),
        _ => Err("must be even".to_string()),
    });
    let even_only = FunctionWithGui::builder("even_only", |x: i64| x)
        .param_names(&["x"])
        .attributes(attributes)
        .build()
        .unwrap();
    let mut graph = FunctionsGraph::from_function_composition(vec![even_only, mul2()]);

    graph.set_param_value("even_only", "x", FiatValue::Int(4)).unwrap();
    assert_eq!(output(&graph, "mul2", 0), DataValue::Value(FiatValue::Int(8)));

    graph.set_param_value("even_only", "x", FiatValue::Int(3)).unwrap();
    let x = graph
        .function_with_gui_by_unique_name("even_only")
        .and_then(|f| f.input("x"))
        .unwrap();
    assert_eq!(x.data_with_gui.value(), &DataValue::invalid(FiatValue::Int(3), "must be even"));
    assert_eq!(x.data_with_gui.value().displayed_value(), Some(&FiatValue::Int(3)));
    assert!(!output(&graph, "mul2", 0).is_valid());
}

#[test]
fn cycle_is_rejected_and_graph_unchanged() {
    let inc = |name: &str| {
        FunctionWithGui::builder(name, |x: i64| x + 1)
            .param_names(&["x"])
            .build()
            .unwrap()
    };
    let mut graph = FunctionsGraph::from_function_composition(vec![inc("a"), inc("b"), inc("c")]);
    let before = graph.graph_composition();

    let err = graph.add_link("c", "a", Some("x"), 0).unwrap_err();
    assert!(matches!(err, GraphError::WouldCreateCycle));
    assert_eq!(err.to_string(), "Link would create a cycle");
    assert_eq!(graph.graph_composition(), before);
    assert!(!graph.has_cycle());
}

#[test]
fn optional_param_defaults_to_none() {
    let describe = FunctionWithGui::builder("describe", |x: Option<i64>| match x {
        Some(x) => format!("got {x}"),
        None => "nothing".to_string(),
    })
    .param_names(&["x"])
    .build()
    .unwrap();
    let mut graph = FunctionsGraph::new();
    graph.add_function(describe);

    let x = graph
        .function_with_gui_by_unique_name("describe")
        .and_then(|f| f.input("x"))
        .unwrap();
    assert_eq!(x.default_value, DataValue::Value(FiatValue::None));

    graph.invoke_all().unwrap();
    assert_eq!(output(&graph, "describe", 0), DataValue::Value(FiatValue::Str("nothing".to_string())));
}

#[test]
fn persistence_round_trip() {
    let mut graph = FunctionsGraph::from_function_composition(vec![add(), mul2(), with_unit()]);
    graph.set_param_value("add", "a", FiatValue::Int(7)).unwrap();
    graph
        .set_param_value("with_unit", "unit", FiatValue::Str("cm".to_string()))
        .unwrap();

    let node = graph.node_by_unique_name_mut("mul2").unwrap();
    node.gui_state_mut().collapsed = true;
    node.gui_state_mut().position = Some((120.0, 40.0));
    graph
        .function_with_gui_by_unique_name_mut("add")
        .and_then(|f| f.input_mut("b"))
        .unwrap()
        .data_with_gui
        .set_expanded(false);

    let composition = graph.save_graph_composition_to_json().unwrap();
    let user_inputs = graph.save_user_inputs_to_json();
    let gui_options = graph.save_gui_options_to_json().unwrap();

    let mut restored = FunctionsGraph::load_graph_composition_from_json(&composition, factory).unwrap();
    assert_eq!(restored.len(), 3);
    assert_eq!(restored.links().len(), 2);
    restored.load_user_inputs_from_json(&user_inputs).unwrap();
    restored.load_gui_options_from_json(&gui_options).unwrap();

    assert_eq!(restored.save_user_inputs_to_json(), user_inputs);
    assert_eq!(restored.save_gui_options_to_json().unwrap(), gui_options);
    assert!(restored.node_by_unique_name("mul2").unwrap().gui_state().collapsed);

    restored.invoke_all().unwrap();
    assert_eq!(
        output(&restored, "with_unit", 0),
        DataValue::Value(FiatValue::Str("18cm".to_string()))
    );
}

#[test]
fn failures_are_captured_on_the_function() {
    let checked = FunctionWithGui::builder("checked", |x: i64| -> i64 {
        assert!(x >= 0, "negative input");
        x
    })
    .param_names(&["x"])
    .build()
    .unwrap();
    let fallible = FunctionWithGui::builder("fallible", |x: i64| -> Result<i64, String> {
        if x > 100 { Err(format!("{x} is too large")) } else { Ok(x) }
    })
    .param_names(&["x"])
    .build()
    .unwrap();
    let mut graph = FunctionsGraph::from_function_composition(vec![checked, fallible, mul2()]);

    graph.set_param_value("checked", "x", FiatValue::Int(-1)).unwrap();
    let checked = graph.function_with_gui_by_unique_name("checked").unwrap();
    assert_eq!(output(&graph, "checked", 0), DataValue::Error);
    let failure = checked.last_exception().unwrap();
    assert_eq!(failure.message, "negative input");
    assert!(failure.is_panic());
    assert!(!checked.is_dirty());

    graph.set_param_value("checked", "x", FiatValue::Int(101)).unwrap();
    assert!(graph.function_with_gui_by_unique_name("checked").unwrap().last_exception().is_none());
    let fallible = graph.function_with_gui_by_unique_name("fallible").unwrap();
    assert_eq!(fallible.last_exception().unwrap().message, "101 is too large");
    assert!(!fallible.last_exception().unwrap().is_panic());
    assert!(!output(&graph, "mul2", 0).is_valid());
}

#[test]
fn duplicated_functions_are_addressed_by_unique_name() {
    let mut graph = FunctionsGraph::from_function_composition(vec![mul2(), mul2(), add()]);
    assert_eq!(graph.unique_names(), ["mul2_1", "mul2_2", "add"]);

    graph.set_param_value("mul2_1", "a", FiatValue::Int(3)).unwrap();
    assert_eq!(output(&graph, "add", 0), DataValue::Value(FiatValue::Int(14)));

    let removed = graph.remove_function_by_unique_name("mul2_2").unwrap();
    assert_eq!(removed.name(), "mul2");
    assert_eq!(graph.unique_names(), ["mul2", "add"]);
    assert!(graph.links().is_empty());
}

fn slow_increment() -> FunctionWithGui {
    FunctionWithGui::builder("slow_increment", |x: i64| {
        std::thread::sleep(std::time::Duration::from_millis(300));
        x + 1
    })
    .param_names(&["x"])
    .attributes(FiatAttributes::new().with("invoke_async", true))
    .build()
    .unwrap()
}

fn double() -> FunctionWithGui {
    FunctionWithGui::builder("double", |x: i64| x * 2)
        .param_names(&["x"])
        .build()
        .unwrap()
}

#[test]
fn invoke_all_completes_nodes_with_a_running_async_call() {
    let mut graph = FunctionsGraph::from_function_composition(vec![slow_increment(), double()]);
    graph.set_param_value("slow_increment", "x", FiatValue::Int(1)).unwrap();
    assert!(graph.node_by_unique_name("slow_increment").unwrap().is_running_async());

    graph.invoke_all().unwrap();
    assert_eq!(output(&graph, "slow_increment", 0), DataValue::Value(FiatValue::Int(2)));
    assert_eq!(output(&graph, "double", 0), DataValue::Value(FiatValue::Int(4)));
    for node in graph.nodes() {
        assert!(!node.function_with_gui().is_dirty(), "{} is dirty", node.function_with_gui().name());
        assert!(!node.is_running_async());
    }

    std::thread::sleep(std::time::Duration::from_millis(400));
    graph.heartbeat().unwrap();
    assert_eq!(output(&graph, "double", 0), DataValue::Value(FiatValue::Int(4)));
}
