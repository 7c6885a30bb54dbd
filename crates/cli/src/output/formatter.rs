//! Human-readable and JSON output
//!
//! Results go to stdout, diagnostics to stderr. In JSON mode stdout carries
//! exactly one JSON document per command.

use comfy_table::{ContentArrangement, Table, presets};
use console::style;
use serde::Serialize;

use super::OutputConfig;

/// Output sink shared by every command
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    /// Turns off `console` styling globally when colors are not wanted
    pub fn new(config: OutputConfig) -> Self {
        if config.no_color || config.json {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        } else if config.force_color {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        }
        Self { config }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    pub fn is_json(&self) -> bool {
        self.config.json
    }

    pub fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    /// Check if colors are enabled
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// `✓ message` on stdout, hidden in quiet and JSON modes
    pub fn success(&self, message: &str) {
        if self.chatty() {
            println!("{} {message}", style("✓").green());
        }
    }

    /// `⚠ message` on stderr, hidden in quiet and JSON modes
    pub fn warning(&self, message: &str) {
        if self.chatty() {
            eprintln!("{} {message}", style("⚠").yellow());
        }
    }

    /// Errors always reach stderr; in JSON mode as `{"error": ...}`
    pub fn error(&self, message: &str) {
        if self.config.json {
            eprintln!("{}", serde_json::json!({ "error": message }));
        } else {
            eprintln!("{} {message}", style("✗").red());
        }
    }

    /// One path that could not be processed
    pub fn path_error(&self, path: &str, reason: &str) {
        if self.config.json {
            eprintln!("{}", serde_json::json!({ "path": path, "error": reason }));
        } else {
            eprintln!("{} {}: {reason}", style("✗").red(), style(path).bold());
        }
    }

    fn chatty(&self) -> bool {
        !self.config.quiet && !self.config.json
    }

    /// Output JSON directly
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// Print a line of text (respects quiet mode)
    pub fn println(&self, message: &str) {
        if self.config.quiet {
            return;
        }
        println!("{message}");
    }

    /// A table in the house style, without borders when colors are off
    pub fn table<S: ToString>(&self, header: &[S]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(if self.colors_enabled() {
                presets::UTF8_FULL_CONDENSED
            } else {
                presets::ASCII_MARKDOWN
            })
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(header.iter().map(ToString::to_string));
        table
    }

    /// Print a table (respects quiet mode)
    pub fn print_table(&self, table: &Table) {
        self.println(&table.to_string());
    }
}
