//! config command - Show or change settings
//!
//! Settings live in `config.toml` under the config directory, which can be
//! overridden with `PAN_CONFIG_DIR`.

use clap::Subcommand;
use pan_core::ConfigManager;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current settings with their recommended ranges
    Show,

    /// Change one setting
    Set {
        /// Setting key, e.g. max_download_parallel or poll.timeout_ms
        key: String,

        /// New value, sizes and rates accept units such as 64KB or 2MB/s
        value: String,
    },
}

#[derive(Debug, Serialize)]
struct SetOutput<'a> {
    key: &'a str,
    value: &'a str,
    path: String,
}

/// Execute a config subcommand
pub fn execute(cmd: ConfigCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let manager = match ConfigManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            formatter.error(&format!("Failed to locate configuration: {e}"));
            return ExitCode::from(&e);
        }
    };
    let mut config = match manager.load() {
        Ok(config) => config,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from(&e);
        }
    };

    match cmd {
        ConfigCommands::Show => {
            let entries = config.entries();
            if formatter.is_json() {
                formatter.json(&entries);
            } else {
                let mut table = formatter.table(&["KEY", "VALUE", "RECOMMENDED", "DESCRIPTION"]);
                for entry in &entries {
                    table.add_row(vec![
                        entry.key.to_string(),
                        entry.value.clone(),
                        entry.recommended.to_string(),
                        entry.description.to_string(),
                    ]);
                }
                formatter.print_table(&table);
            }
            ExitCode::Success
        }
        ConfigCommands::Set { key, value } => {
            if let Err(e) = config.set_key(&key, &value) {
                formatter.error(&e.to_string());
                return ExitCode::UsageError;
            }
            if let Err(e) = manager.save(&config) {
                formatter.error(&format!("Failed to save configuration: {e}"));
                return ExitCode::GeneralError;
            }
            if formatter.is_json() {
                formatter.json(&SetOutput {
                    key: &key,
                    value: &value,
                    path: manager.config_path().display().to_string(),
                });
            } else {
                formatter.success(&format!("Set {key} = {value}"));
            }
            ExitCode::Success
        }
    }
}
