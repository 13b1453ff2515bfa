//! Process-wide configuration.
//!
//! The configuration is set up by application code at startup and read by
//! the core afterwards. A `.fiat_run_config.json` file in the working
//! directory (or any parent) overrides the run defaults:
//!
//! ```json
//! {
//!     "catch_function_exceptions": true,
//!     "disable_input_during_execution": false
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the per-user run configuration file.
pub const RUN_CONFIG_FILENAME: &str = ".fiat_run_config.json";

/// Which helper buttons a widget header shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnyGuiWithDataSettings {
    /// Show the collapse / expand button.
    pub show_collapse_button: bool,
    /// Show the "open in popup" button.
    pub show_popup_button: bool,
    /// Show the copy-to-clipboard button.
    pub show_clipboard_button: bool,
}

impl AnyGuiWithDataSettings {
    /// Settings used inside a function graph.
    #[must_use]
    pub fn default_in_function_graph() -> Self {
        Self {
            show_collapse_button: true,
            show_popup_button: true,
            show_clipboard_button: true,
        }
    }

    /// Settings used by a standalone widget application.
    #[must_use]
    pub fn default_in_standalone_app() -> Self {
        Self {
            show_collapse_button: true,
            show_popup_button: false,
            show_clipboard_button: false,
        }
    }
}

impl Default for AnyGuiWithDataSettings {
    fn default() -> Self {
        Self::default_in_function_graph()
    }
}

/// Controls the behavior of the engine during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiatRunConfig {
    /// When `true`, failures of user functions are captured and stored;
    /// when `false` they unwind to the caller (debug mode).
    pub catch_function_exceptions: bool,
    /// Disable input widgets while a function is running.
    pub disable_input_during_execution: bool,
    /// Header settings inside a function graph.
    pub any_gui_with_data_settings_function_graph: AnyGuiWithDataSettings,
    /// Header settings inside a standalone application.
    pub any_gui_with_data_settings_standalone_app: AnyGuiWithDataSettings,
}

impl Default for FiatRunConfig {
    fn default() -> Self {
        Self {
            catch_function_exceptions: true,
            disable_input_during_execution: false,
            any_gui_with_data_settings_function_graph:
                AnyGuiWithDataSettings::default_in_function_graph(),
            any_gui_with_data_settings_standalone_app:
                AnyGuiWithDataSettings::default_in_standalone_app(),
        }
    }
}

/// Presentation settings shared by widgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiatStyle {
    /// Number of list elements shown inside a node.
    pub list_maximum_elements_in_node: usize,
    /// Number of list elements added per "Show more" in the details popup.
    pub list_popup_page_size: usize,
    /// Strings longer than this are truncated in one-line summaries.
    pub str_max_displayed_chars: usize,
}

impl Default for FiatStyle {
    fn default() -> Self {
        Self {
            list_maximum_elements_in_node: 10,
            list_popup_page_size: 300,
            str_max_displayed_chars: 40,
        }
    }
}

/// The complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiatConfig {
    /// Presentation settings.
    pub style: FiatStyle,
    /// Execution settings.
    pub run_config: FiatRunConfig,
}

impl FiatConfig {
    /// Header settings for the current context.
    #[must_use]
    pub fn any_gui_with_data_settings(&self, in_function_graph: bool) -> &AnyGuiWithDataSettings {
        if in_function_graph {
            &self.run_config.any_gui_with_data_settings_function_graph
        } else {
            &self.run_config.any_gui_with_data_settings_standalone_app
        }
    }
}

static FIAT_CONFIG: LazyLock<RwLock<FiatConfig>> = LazyLock::new(|| RwLock::new(FiatConfig::default()));

/// Returns a snapshot of the configuration.
#[must_use]
pub fn fiat_config() -> FiatConfig {
    FIAT_CONFIG.read().clone()
}

/// Mutates the configuration.
pub fn update_fiat_config(f: impl FnOnce(&mut FiatConfig)) {
    f(&mut FIAT_CONFIG.write());
}

/// Whether user function failures are captured (`true`) or unwind (`false`).
#[must_use]
pub fn catch_function_exceptions() -> bool {
    FIAT_CONFIG.read().run_config.catch_function_exceptions
}

/// Sets the "catch function exceptions" flag.
pub fn set_catch_function_exceptions(catch: bool) {
    FIAT_CONFIG.write().run_config.catch_function_exceptions = catch;
}

/// Reads a run configuration from `path`.
pub fn load_run_config(path: impl AsRef<Path>) -> Result<FiatRunConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Writes a run configuration to `path`.
pub fn save_run_config(config: &FiatRunConfig, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Finds [`RUN_CONFIG_FILENAME`] in `start` or its closest parent.
#[must_use]
pub fn find_run_config_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(RUN_CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}

/// Loads the user default run configuration (searching from the current
/// directory upwards) and installs it.
///
/// Returns the loaded configuration, or `None` when no file was found.
pub fn load_user_default_run_config() -> Result<Option<FiatRunConfig>, ConfigError> {
    let cwd = std::env::current_dir()?;
    let Some(path) = find_run_config_file(&cwd) else {
        return Ok(None);
    };
    let run_config = load_run_config(&path)?;
    tracing::warn!(path = %path.display(), ?run_config, "loaded user default fiat run config");
    update_fiat_config(|config| config.run_config = run_config.clone());
    Ok(Some(run_config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FiatConfig::default();
        assert!(config.run_config.catch_function_exceptions);
        assert_eq!(config.style.list_maximum_elements_in_node, 10);
        assert!(!config.any_gui_with_data_settings(false).show_popup_button);
        assert!(config.any_gui_with_data_settings(true).show_popup_button);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let run_config: FiatRunConfig =
            serde_json::from_str(r#"{"disable_input_during_execution": true}"#).unwrap();
        assert!(run_config.catch_function_exceptions);
        assert!(run_config.disable_input_during_execution);
    }

    #[test]
    fn run_config_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("fiat_config_{}", std::process::id()));
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        let path = dir.join(RUN_CONFIG_FILENAME);

        let config = FiatRunConfig {
            catch_function_exceptions: false,
            ..FiatRunConfig::default()
        };
        save_run_config(&config, &path).unwrap();

        assert_eq!(find_run_config_file(&dir.join("nested")), Some(path.clone()));
        assert_eq!(load_run_config(&path).unwrap(), config);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
