//! Re-invocation with failure catching disabled.
//!
//! The catching flag is process-wide, so these tests live in their own
//! binary and run one after the other.

use fiatlight_core::{DataValue, FiatValue, catch_function_exceptions, set_catch_function_exceptions};
use fiatlight_graph::{FunctionError, FunctionWithGui, FunctionsGraph, GraphError};
use parking_lot::Mutex;

static FLAG_LOCK: Mutex<()> = Mutex::new(());

fn checked_sqrt() -> FunctionWithGui {
    FunctionWithGui::builder("checked_sqrt", |x: f64| -> Result<f64, String> {
        if x < 0.0 {
            Err(format!("cannot take the root of {x}"))
        } else {
            Ok(x.sqrt())
        }
    })
    .param_names(&["x"])
    .build()
    .unwrap()
}

#[test]
fn debugger_reinvocation_returns_the_failure() {
    let _guard = FLAG_LOCK.lock();
    let mut graph = FunctionsGraph::new();
    let id = graph.add_function(checked_sqrt());

    graph.set_param_value("checked_sqrt", "x", FiatValue::Float(-4.0)).unwrap();
    let function = graph.node(&id).unwrap().function_with_gui();
    assert_eq!(function.output(0).unwrap().value(), &DataValue::Error);

    let err = graph.reinvoke_for_debugger(&id).unwrap_err();
    let GraphError::Invocation(FunctionError::Failed { function, message }) = err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(function, "checked_sqrt");
    assert_eq!(message, "cannot take the root of -4");
    assert!(catch_function_exceptions(), "catching mode is restored");
    assert!(graph.node(&id).unwrap().function_with_gui().is_dirty());
}

#[test]
fn uncaught_failures_unwind_to_the_caller() {
    let _guard = FLAG_LOCK.lock();
    let mut graph = FunctionsGraph::new();
    graph.add_function(checked_sqrt());

    set_catch_function_exceptions(false);
    let result = graph.set_param_value("checked_sqrt", "x", FiatValue::Float(-1.0));
    set_catch_function_exceptions(true);

    assert!(matches!(result, Err(GraphError::Invocation(_))));
    let function = graph.function_with_gui_by_unique_name("checked_sqrt").unwrap();
    assert!(function.is_dirty());
    assert!(function.last_exception().is_some());

    graph.set_param_value("checked_sqrt", "x", FiatValue::Float(9.0)).unwrap();
    let function = graph.function_with_gui_by_unique_name("checked_sqrt").unwrap();
    assert_eq!(function.output(0).unwrap().value(), &DataValue::Value(FiatValue::Float(3.0)));
    assert!(function.last_exception().is_none());
}
