//! Output formatting utilities
//!
//! This module provides formatters for CLI output in both human-readable
//! and JSON formats. It also handles spinners, tables and colored output.

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::ProgressBar;

use pan_core::{ColorMode, Defaults, OutputFormat};

/// Output configuration derived from CLI flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Color even when stdout is not a terminal
    pub force_color: bool,
    /// Disable progress spinners
    pub no_progress: bool,
    /// Suppress non-error output
    pub quiet: bool,
}

impl OutputConfig {
    /// Fill in what the flags left unset from the config file's `[defaults]`
    ///
    /// The file can add to the flags but never undo one.
    pub fn with_defaults(mut self, defaults: &Defaults) -> Self {
        self.json |= defaults.output == OutputFormat::Json;
        match defaults.color {
            ColorMode::Never => self.no_color = true,
            ColorMode::Always => self.force_color = !self.no_color,
            ColorMode::Auto => {}
        }
        self.no_progress |= !defaults.progress;
        self
    }
}
