//! Function wrappers and the dataflow graph for Fiatlight (Layer 2).
//!
//! `fiatlight_graph` turns ordinary typed functions into graph nodes:
//!
//! - [`callable`] - Adapting Rust closures to dynamic calls ([`IntoFiatFunction`])
//! - [`signature`] - Declared parameter names, kinds, defaults and docs
//! - [`function`] - [`FunctionWithGui`]: a function with one widget per input and output
//! - [`node`] - Nodes, their links and their GUI state
//! - [`graph`] - [`FunctionsGraph`]: linking, propagation and the heartbeat loop
//! - [`worker`] - Off-thread invocation for async functions
//! - [`persistence`] - User inputs, GUI options and graph composition documents
//! - [`error`] - Graph, invocation and persistence errors
//!
//! # Example
//!
//! ```
//! use fiatlight_core::FiatValue;
//! use fiatlight_graph::{FunctionWithGui, FunctionsGraph};
//!
//! let square = FunctionWithGui::builder("square", |x: i64| x * x)
//!     .signature_str("square(x: int = 3) -> int")
//!     .build()
//!     .unwrap();
//! let negate = FunctionWithGui::new("negate", |x: i64| -x).unwrap();
//!
//! let mut graph = FunctionsGraph::from_function_composition(vec![square, negate]);
//! graph.invoke_all().unwrap();
//!
//! let negate = graph.function_with_gui_by_unique_name("negate").unwrap();
//! assert_eq!(negate.input_names(), ["p0"]);
//! assert_eq!(negate.output(0).unwrap().value().as_value(), Some(&FiatValue::Int(-9)));
//! ```

// Self-reference so `#[fiat_function]` can emit `fiatlight_graph::` paths inside this crate.
extern crate self as fiatlight_graph;

pub mod callable;
pub mod error;
pub mod function;
pub mod graph;
pub mod node;
pub mod persistence;
pub mod signature;
pub mod worker;

pub use callable::{DynCallable, FiatFunctionParts, FunctionFailure, IntoFiatFunction, call_catching};
pub use error::{FunctionError, GraphError, PersistenceError};
pub use function::{FunctionWithGui, FunctionWithGuiBuilder};
pub use graph::FunctionsGraph;
pub use node::{FunctionNode, FunctionNodeLink, NodeDrawOutcome, NodeGuiState, NodeId};
pub use persistence::{GraphComposition, LinkDescription};
pub use signature::{Signature, SignatureParam};
pub use worker::AsyncInvocation;

/// Attribute macro declaring a documented function as a Fiatlight function.
pub use fiatlight_graph_macros::fiat_function;

/// Re-export of the common types.
pub mod prelude {
    pub use crate::callable::IntoFiatFunction;
    pub use crate::error::*;
    pub use crate::function::*;
    pub use crate::graph::*;
    pub use crate::node::*;
    pub use crate::signature::*;
    pub use fiatlight_graph_macros::fiat_function;
}
