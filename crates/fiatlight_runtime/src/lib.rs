//! Application runtime for Fiatlight.
//!
//! - [`tracing_setup`]: installs the `tracing` subscriber.
//! - [`state_files`]: the user inputs, GUI options and graph composition
//!   documents, on disk.
//! - [`runner`]: the frame loop (setup, heartbeat and draw per frame,
//!   shutdown).
//!
//! ```
//! use fiatlight_core::ui::HeadlessUi;
//! use fiatlight_graph::{FunctionWithGui, FunctionsGraph};
//! use fiatlight_runtime::{FiatRunner, RunParams};
//!
//! let double = FunctionWithGui::builder("double", |x: i64| x * 2)
//!     .signature_str("double(x: int = 21) -> int")
//!     .build()
//!     .unwrap();
//! let graph = FunctionsGraph::from_function_composition(vec![double]);
//!
//! let ini_base = std::env::temp_dir().join("fiatlight_runtime_doc");
//! let params = RunParams::new("doc").with_ini_base(&ini_base).with_max_frames(3);
//! let mut runner = FiatRunner::new(graph, params);
//! assert_eq!(runner.run(&mut HeadlessUi::new()).unwrap(), 3);
//! assert!(runner.state_files().user_inputs_path().exists());
//! ```

pub mod runner;
pub mod state_files;
pub mod tracing_setup;

pub use runner::{FiatRunner, RunError, RunParams, StopHandle};
pub use state_files::StateFiles;
pub use tracing_setup::{TracingConfig, TracingFormat, TracingSetup};
