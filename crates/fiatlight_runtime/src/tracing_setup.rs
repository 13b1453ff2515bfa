//! Installation of the `tracing` subscriber.
//!
//! Fiatlight libraries only emit events; an application decides where they
//! go by calling [`TracingSetup::init`] once at startup (the runner does so
//! when asked to).
//!
//! ```
//! use fiatlight_runtime::{TracingFormat, TracingSetup};
//! use tracing::Level;
//!
//! TracingSetup::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .with_env_filter("fiatlight_graph=debug,fiatlight_core=info")
//!     .init();
//! ```

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// The configuration a subscriber was installed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// Maximum log level.
    pub level: Level,
    /// Output format.
    pub format: TracingFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingSetup
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for the process-wide subscriber.
#[derive(Debug, Clone, Default)]
pub struct TracingSetup {
    config: TracingConfig,
    /// Environment filter (e.g. `"fiatlight_graph=debug"`).
    env_filter: Option<String>,
    /// Whether to include span enter/exit events.
    span_events: bool,
}

impl TracingSetup {
    /// Creates a setup with the default level (`INFO`) and format.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Sets a custom environment filter string, `target=level,...`.
    ///
    /// An unparsable filter falls back to the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in the output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// The level and format this setup installs.
    #[must_use]
    pub fn config(&self) -> TracingConfig {
        self.config
    }

    fn env_filter(&self) -> EnvFilter {
        let level = self.config.level.as_str();
        match &self.env_filter {
            Some(filter) => EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(level)),
            None => EnvFilter::new(level),
        }
    }

    /// Installs the global subscriber.
    ///
    /// Returns `false` when a subscriber was already installed, in which case
    /// the existing one is kept.
    pub fn init(&self) -> bool {
        let env_filter = self.env_filter();
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        let installed = match self.config.format {
            TracingFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_span_events(span_events))
                .try_init()
                .is_ok(),
            TracingFormat::Compact => tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().compact().with_span_events(span_events))
                .try_init()
                .is_ok(),
            TracingFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_span_events(span_events))
                .try_init()
                .is_ok(),
        };

        if installed {
            tracing::info!(
                level = %self.config.level,
                format = ?self.config.format,
                "tracing initialized"
            );
        }
        installed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_records_level_and_format() {
        let setup = TracingSetup::new()
            .with_level(Level::DEBUG)
            .with_format(TracingFormat::Json);
        assert_eq!(
            setup.config(),
            TracingConfig {
                level: Level::DEBUG,
                format: TracingFormat::Json
            }
        );
    }

    #[test]
    fn second_installation_is_ignored() {
        let setup = TracingSetup::new().with_format(TracingFormat::Compact);
        setup.init();
        assert!(!setup.init());
    }

    #[test]
    fn format_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&TracingFormat::Json).unwrap(), "\"json\"");
        let format: TracingFormat = serde_json::from_str("\"compact\"").unwrap();
        assert_eq!(format, TracingFormat::Compact);
    }
}
