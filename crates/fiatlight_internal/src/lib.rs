//! # Fiatlight Internal Library
//!
//! Re-exports the Fiatlight layer crates for convenience.

/// Layer 1: values, type reflection, widgets and the type registry.
pub use fiatlight_core;

/// Layer 2: function wrappers and the dataflow graph.
pub use fiatlight_graph;

/// Layer 3: tracing setup, state files and the frame runner.
pub use fiatlight_runtime;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use fiatlight_core::prelude::*;
    pub use fiatlight_graph::prelude::*;
    pub use fiatlight_runtime::{FiatRunner, RunParams, StateFiles, TracingFormat, TracingSetup};
}
