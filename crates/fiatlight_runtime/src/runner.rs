//! The application frame loop.
//!
//! A [`FiatRunner`] drives a [`FunctionsGraph`] through the lifetime of an
//! application: it restores the saved state, invokes what needs invoking,
//! renders one frame at a time on a [`Ui`] host, and saves the state back
//! on exit.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fiatlight_core::ConfigError;
use fiatlight_core::load_user_default_run_config;
use fiatlight_core::ui::Ui;
use fiatlight_graph::{FunctionError, FunctionWithGui, FunctionsGraph, GraphError, PersistenceError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::state_files::StateFiles;
use crate::tracing_setup::TracingSetup;

/// Errors that stop a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// A state document could not be read or written.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// A user action on the graph failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A function failure unwound (failures are not caught).
    #[error(transparent)]
    Function(#[from] FunctionError),

    /// The user default run configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Parameters of a run.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Application name, used in logs and as the default ini base.
    pub app_name: String,
    /// Base path of the state files.
    pub ini_base: PathBuf,
    /// Whether the user may edit the graph; if so its composition is saved
    /// and restored too.
    pub user_editable_graph: bool,
    /// Stop after this many frames. `None` runs until a stop is requested.
    pub max_frames: Option<usize>,
    /// Whether to look for a `.fiat_run_config.json` file at setup.
    pub load_user_run_config: bool,
    /// Subscriber to install at setup, if any.
    pub tracing: Option<TracingSetup>,
}

impl RunParams {
    /// Parameters for `app_name`, with state files in the current directory.
    #[must_use]
    pub fn new(app_name: impl Into<String>) -> Self {
        let app_name = app_name.into();
        Self {
            ini_base: PathBuf::from(&app_name),
            app_name,
            user_editable_graph: false,
            max_frames: None,
            load_user_run_config: true,
            tracing: None,
        }
    }

    /// Sets the base path of the state files.
    #[must_use]
    pub fn with_ini_base(mut self, ini_base: impl Into<PathBuf>) -> Self {
        self.ini_base = ini_base.into();
        self
    }

    /// Makes the graph user-editable.
    #[must_use]
    pub fn with_user_editable_graph(mut self, editable: bool) -> Self {
        self.user_editable_graph = editable;
        self
    }

    /// Limits the number of frames.
    #[must_use]
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    /// Enables or disables the user default run configuration lookup.
    #[must_use]
    pub fn with_user_run_config(mut self, load: bool) -> Self {
        self.load_user_run_config = load;
        self
    }

    /// Installs `setup` as the tracing subscriber at startup.
    #[must_use]
    pub fn with_tracing(mut self, setup: TracingSetup) -> Self {
        self.tracing = Some(setup);
        self
    }
}

/// Requests a running [`FiatRunner`] to stop after the current frame.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Asks the run loop to stop.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether a stop was requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

type FunctionFactory = Box<dyn Fn(&str) -> Option<FunctionWithGui> + Send>;

/// Owns a graph and runs it frame by frame.
pub struct FiatRunner {
    graph: FunctionsGraph,
    params: RunParams,
    state_files: StateFiles,
    factory: Option<FunctionFactory>,
    stop: StopHandle,
    frames: usize,
}

impl FiatRunner {
    /// Creates a runner for `graph`.
    #[must_use]
    pub fn new(graph: FunctionsGraph, params: RunParams) -> Self {
        let state_files = StateFiles::new(&params.ini_base);
        Self {
            graph,
            params,
            state_files,
            factory: None,
            stop: StopHandle::default(),
            frames: 0,
        }
    }

    /// Sets the factory used to rebuild a user-edited graph from its saved
    /// composition: it returns a fresh function for a function name.
    #[must_use]
    pub fn with_function_factory(
        mut self,
        factory: impl Fn(&str) -> Option<FunctionWithGui> + Send + 'static,
    ) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    /// The graph being run.
    #[must_use]
    pub fn graph(&self) -> &FunctionsGraph {
        &self.graph
    }

    /// Mutable access to the graph being run.
    pub fn graph_mut(&mut self) -> &mut FunctionsGraph {
        &mut self.graph
    }

    /// The run parameters.
    #[must_use]
    pub fn params(&self) -> &RunParams {
        &self.params
    }

    /// Where the state documents live.
    #[must_use]
    pub fn state_files(&self) -> &StateFiles {
        &self.state_files
    }

    /// A handle that can stop the run from elsewhere.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Asks the run loop to stop after the current frame.
    pub fn request_stop(&self) {
        self.stop.request_stop();
    }

    /// Number of frames rendered so far.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    /// Restores the saved state and brings every output up to date.
    ///
    /// The graph composition is restored first (for user-editable graphs),
    /// then the user inputs and the GUI options. Top-leaf functions are
    /// invoked before the whole graph.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] when a state file is unreadable, or when an
    /// uncaught function failure unwinds.
    pub fn setup(&mut self) -> Result<(), RunError> {
        if let Some(tracing) = &self.params.tracing {
            tracing.init();
        }
        if self.params.load_user_run_config {
            load_user_default_run_config()?;
        }

        if self.params.user_editable_graph {
            match &self.factory {
                Some(factory) => {
                    if let Some(graph) = self.state_files.load_graph_composition(factory)? {
                        self.graph = graph;
                    }
                }
                None => warn!(
                    app = %self.params.app_name,
                    "user-editable graph without a function factory, composition not restored"
                ),
            }
        }
        self.state_files.load_user_inputs(&mut self.graph)?;
        self.state_files.load_gui_options(&mut self.graph)?;

        self.graph.invoke_top_leaf_functions()?;
        self.graph.invoke_all()?;
        info!(app = %self.params.app_name, functions = self.graph.len(), "application started");
        Ok(())
    }

    /// Runs one frame: the graph heartbeat, then drawing on `ui`.
    ///
    /// Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] when an uncaught function failure unwinds.
    pub fn frame(&mut self, ui: &mut dyn Ui) -> Result<bool, RunError> {
        let mut changed = self.graph.heartbeat()?;
        changed |= self.graph.draw(ui)?;
        self.frames += 1;
        Ok(changed)
    }

    /// Saves the state documents and releases the widgets' resources.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Persistence`] when a document cannot be written.
    /// Widgets are released in any case.
    pub fn shutdown(&mut self) -> Result<(), RunError> {
        let saved = self.save_state();
        self.graph.shutdown();
        info!(app = %self.params.app_name, frames = self.frames, "application stopped");
        saved
    }

    fn save_state(&self) -> Result<(), RunError> {
        self.state_files.save_user_inputs(&self.graph)?;
        self.state_files.save_gui_options(&self.graph)?;
        if self.params.user_editable_graph {
            self.state_files.save_graph_composition(&self.graph)?;
        }
        debug!(app = %self.params.app_name, "state saved");
        Ok(())
    }

    /// Sets up, renders frames until the frame limit or a stop request,
    /// then shuts down; returns the number of frames rendered.
    ///
    /// With no frame limit the loop only ends on a stop request.
    ///
    /// # Errors
    ///
    /// Returns the first [`RunError`]. The state is still saved when a frame
    /// fails.
    pub fn run(&mut self, ui: &mut dyn Ui) -> Result<usize, RunError> {
        self.setup()?;
        let looped = self.run_frames(ui);
        let shut = self.shutdown();
        looped?;
        shut?;
        Ok(self.frames)
    }

    fn run_frames(&mut self, ui: &mut dyn Ui) -> Result<(), RunError> {
        while !self.stop.is_stop_requested() && self.params.max_frames.is_none_or(|max| self.frames < max) {
            self.frame(ui)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for FiatRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FiatRunner")
            .field("app_name", &self.params.app_name)
            .field("functions", &self.graph.len())
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}
