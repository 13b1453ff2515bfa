//! The three state documents of an application, on disk.
//!
//! All of them sit next to each other and share an "ini base" path: for
//! `/home/me/my_app` they are `my_app.fiatlight_user_inputs.json`,
//! `my_app.fiatlight_gui_options.json` and `my_app.fiatlight_graph.json`.

use std::path::{Path, PathBuf};

use fiatlight_graph::{FunctionWithGui, FunctionsGraph, PersistenceError};
use serde_json::Value as JsonValue;
use tracing::debug;

const USER_INPUTS_SUFFIX: &str = ".fiatlight_user_inputs.json";
const GUI_OPTIONS_SUFFIX: &str = ".fiatlight_gui_options.json";
const GRAPH_COMPOSITION_SUFFIX: &str = ".fiatlight_graph.json";

/// Paths of the state documents, derived from an ini base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFiles {
    user_inputs: PathBuf,
    gui_options: PathBuf,
    graph_composition: PathBuf,
}

impl StateFiles {
    /// Computes the three paths from `ini_base`.
    #[must_use]
    pub fn new(ini_base: impl AsRef<Path>) -> Self {
        let base = ini_base.as_ref().as_os_str();
        let with_suffix = |suffix: &str| {
            let mut path = base.to_os_string();
            path.push(suffix);
            PathBuf::from(path)
        };
        Self {
            user_inputs: with_suffix(USER_INPUTS_SUFFIX),
            gui_options: with_suffix(GUI_OPTIONS_SUFFIX),
            graph_composition: with_suffix(GRAPH_COMPOSITION_SUFFIX),
        }
    }

    /// Path of the user inputs document.
    #[must_use]
    pub fn user_inputs_path(&self) -> &Path {
        &self.user_inputs
    }

    /// Path of the GUI options document.
    #[must_use]
    pub fn gui_options_path(&self) -> &Path {
        &self.gui_options
    }

    /// Path of the graph composition document.
    #[must_use]
    pub fn graph_composition_path(&self) -> &Path {
        &self.graph_composition
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Saving
    // ─────────────────────────────────────────────────────────────────────────

    /// Writes the user inputs of `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] when the file cannot be written.
    pub fn save_user_inputs(&self, graph: &FunctionsGraph) -> Result<(), PersistenceError> {
        write_json(&self.user_inputs, &graph.save_user_inputs_to_json())
    }

    /// Writes the GUI options of `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the options cannot be serialized or
    /// the file cannot be written.
    pub fn save_gui_options(&self, graph: &FunctionsGraph) -> Result<(), PersistenceError> {
        write_json(&self.gui_options, &graph.save_gui_options_to_json()?)
    }

    /// Writes the graph composition of `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the composition cannot be serialized
    /// or the file cannot be written.
    pub fn save_graph_composition(&self, graph: &FunctionsGraph) -> Result<(), PersistenceError> {
        write_json(&self.graph_composition, &graph.save_graph_composition_to_json()?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────────

    /// Restores the user inputs into `graph`; returns `false` when there is no
    /// such file yet.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the file exists but cannot be read
    /// or parsed.
    pub fn load_user_inputs(&self, graph: &mut FunctionsGraph) -> Result<bool, PersistenceError> {
        let Some(json) = read_json(&self.user_inputs)? else {
            return Ok(false);
        };
        let loaded = graph.load_user_inputs_from_json(&json)?;
        debug!(path = %self.user_inputs.display(), loaded, "user inputs restored");
        Ok(true)
    }

    /// Restores the GUI options into `graph`; returns `false` when there is no
    /// such file yet.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the file exists but cannot be read
    /// or parsed.
    pub fn load_gui_options(&self, graph: &mut FunctionsGraph) -> Result<bool, PersistenceError> {
        let Some(json) = read_json(&self.gui_options)? else {
            return Ok(false);
        };
        let loaded = graph.load_gui_options_from_json(&json)?;
        debug!(path = %self.gui_options.display(), loaded, "gui options restored");
        Ok(true)
    }

    /// Rebuilds a graph from the saved composition, or `None` when there is no
    /// such file yet.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the file exists but cannot be read
    /// or parsed.
    pub fn load_graph_composition(
        &self,
        factory: impl Fn(&str) -> Option<FunctionWithGui>,
    ) -> Result<Option<FunctionsGraph>, PersistenceError> {
        let Some(json) = read_json(&self.graph_composition)? else {
            return Ok(None);
        };
        let graph = FunctionsGraph::load_graph_composition_from_json(&json, factory)?;
        debug!(path = %self.graph_composition.display(), functions = graph.len(), "graph composition restored");
        Ok(Some(graph))
    }
}

fn write_json(path: &Path, json: &JsonValue) -> Result<(), PersistenceError> {
    let content = serde_json::to_string_pretty(json)?;
    std::fs::write(path, content).map_err(|err| PersistenceError::io(path, err))
}

fn read_json(path: &Path) -> Result<Option<JsonValue>, PersistenceError> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|err| PersistenceError::io(path, err))?;
    Ok(Some(serde_json::from_str(&content)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_share_the_ini_base() {
        let files = StateFiles::new("/tmp/apps/demo");
        assert_eq!(
            files.user_inputs_path(),
            Path::new("/tmp/apps/demo.fiatlight_user_inputs.json")
        );
        assert_eq!(
            files.gui_options_path(),
            Path::new("/tmp/apps/demo.fiatlight_gui_options.json")
        );
        assert_eq!(
            files.graph_composition_path(),
            Path::new("/tmp/apps/demo.fiatlight_graph.json")
        );
    }

    #[test]
    fn missing_files_are_not_an_error() {
        let files = StateFiles::new(std::env::temp_dir().join("fiatlight_state_files_never_written"));
        let mut graph = FunctionsGraph::new();
        assert!(!files.load_user_inputs(&mut graph).unwrap());
        assert!(!files.load_gui_options(&mut graph).unwrap());
        assert!(files.load_graph_composition(|_| None).unwrap().is_none());
    }
}
