//! Runs going through setup, frames and shutdown, with state on disk.

use std::path::PathBuf;

use fiatlight_core::ui::HeadlessUi;
use fiatlight_core::{DataValue, FiatValue};
use fiatlight_graph::{FunctionWithGui, FunctionsGraph};
use fiatlight_runtime::{FiatRunner, RunParams, StateFiles};

fn add() -> FunctionWithGui {
    FunctionWithGui::builder("add", |a: i64, b: i64| a + b)
        .signature_str("add(a: int, b: int = 2) -> int")
        .build()
        .unwrap()
}

fn mul2() -> FunctionWithGui {
    FunctionWithGui::builder("mul2", |x: i64| x * 2)
        .param_names(&["x"])
        .build()
        .unwrap()
}

fn factory(name: &str) -> Option<FunctionWithGui> {
    match name {
        "add" => Some(add()),
        "mul2" => Some(mul2()),
        _ => None,
    }
}

fn pipeline() -> FunctionsGraph {
    FunctionsGraph::from_function_composition(vec![add(), mul2()])
}

/// A fresh ini base in the temp directory; the files are removed on drop.
struct IniBase(PathBuf);

impl IniBase {
    fn new() -> Self {
        Self(std::env::temp_dir().join(format!("fiatlight_{}", nanoid::nanoid!())))
    }

    fn params(&self) -> RunParams {
        RunParams::new("runner_test")
            .with_ini_base(&self.0)
            .with_user_run_config(false)
    }
}

impl Drop for IniBase {
    fn drop(&mut self) {
        let files = StateFiles::new(&self.0);
        for path in [
            files.user_inputs_path(),
            files.gui_options_path(),
            files.graph_composition_path(),
        ] {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn output(graph: &FunctionsGraph, unique_name: &str) -> DataValue {
    graph
        .function_with_gui_by_unique_name(unique_name)
        .unwrap()
        .output(0)
        .unwrap()
        .value()
        .clone()
}

#[test]
fn user_inputs_and_layout_survive_a_restart() {
    let ini = IniBase::new();

    let mut first = FiatRunner::new(pipeline(), ini.params());
    first.setup().unwrap();
    first.graph_mut().set_param_value("add", "a", FiatValue::Int(5)).unwrap();
    first
        .graph_mut()
        .node_by_unique_name_mut("mul2")
        .unwrap()
        .gui_state_mut()
        .collapsed = true;
    first.frame(&mut HeadlessUi::new()).unwrap();
    first.shutdown().unwrap();
    assert!(first.state_files().user_inputs_path().exists());
    assert!(first.state_files().gui_options_path().exists());
    assert!(!first.state_files().graph_composition_path().exists());

    let mut second = FiatRunner::new(pipeline(), ini.params());
    second.setup().unwrap();
    assert_eq!(output(second.graph(), "mul2"), DataValue::Value(FiatValue::Int(14)));
    let mul2 = second.graph().node_by_unique_name("mul2").unwrap();
    assert!(mul2.gui_state().collapsed);
}

#[test]
fn editable_graphs_restore_their_composition() {
    let ini = IniBase::new();
    let params = ini.params().with_user_editable_graph(true);

    let mut first = FiatRunner::new(pipeline(), params.clone()).with_function_factory(factory);
    first.setup().unwrap();
    first.graph_mut().add_function(mul2());
    first.shutdown().unwrap();
    assert!(first.state_files().graph_composition_path().exists());

    let mut second = FiatRunner::new(FunctionsGraph::new(), params).with_function_factory(factory);
    second.setup().unwrap();
    assert_eq!(second.graph().unique_names(), ["add", "mul2_1", "mul2_2"]);
    assert_eq!(second.graph().links().len(), 1);
    assert_eq!(second.graph().graph_composition(), first.graph().graph_composition());
}

#[test]
fn edits_on_the_host_flow_through_the_next_frame() {
    let ini = IniBase::new();
    let mut runner = FiatRunner::new(pipeline(), ini.params());
    runner.setup().unwrap();
    runner.graph_mut().set_param_value("add", "a", FiatValue::Int(1)).unwrap();
    assert_eq!(output(runner.graph(), "mul2"), DataValue::Value(FiatValue::Int(6)));

    let mut ui = HeadlessUi::new();
    ui.set_int("a", 7);
    assert!(runner.frame(&mut ui).unwrap());
    assert_eq!(output(runner.graph(), "mul2"), DataValue::Value(FiatValue::Int(18)));
    assert_eq!(runner.frame_count(), 1);
    runner.shutdown().unwrap();
}

#[test]
fn frame_limit_bounds_the_run() {
    let ini = IniBase::new();
    let mut runner = FiatRunner::new(pipeline(), ini.params().with_max_frames(4));
    assert_eq!(runner.run(&mut HeadlessUi::new()).unwrap(), 4);
    assert!(runner.state_files().user_inputs_path().exists());
}

#[test]
fn a_stop_request_ends_an_unbounded_run() {
    let ini = IniBase::new();
    let mut runner = FiatRunner::new(pipeline(), ini.params());
    runner.stop_handle().request_stop();
    assert_eq!(runner.run(&mut HeadlessUi::new()).unwrap(), 0);
}

#[test]
fn editable_graph_without_factory_keeps_the_given_graph() {
    let ini = IniBase::new();
    let params = ini.params().with_user_editable_graph(true);
    let mut first = FiatRunner::new(pipeline(), params.clone()).with_function_factory(factory);
    first.setup().unwrap();
    first.shutdown().unwrap();

    let mut second = FiatRunner::new(FunctionsGraph::from_function_composition(vec![mul2()]), params);
    second.setup().unwrap();
    assert_eq!(second.graph().unique_names(), ["mul2"]);
}
