//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.
//! Every command that touches the drive goes through a `Context`, which
//! loads the config, picks the scope and builds the client.

use clap::{Parser, Subcommand};
use pan_core::{ConfigManager, Defaults};

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

mod batch;
mod cd;
mod completions;
mod config;
mod context;
mod cp;
mod ls;
mod mv;
mod rm;
mod search;
mod stat;

/// pan - cloud drive CLI client
///
/// Lists, searches and bulk-manages files in a personal or family cloud
/// drive using familiar filesystem paths.
#[derive(Parser, Debug)]
#[command(name = "pan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress spinner
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Work in the family drive with this id instead of the personal drive
    #[arg(long, global = true, env = "PAN_FAMILY_ID", default_value_t = 0)]
    pub family: i64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List a folder
    Ls(ls::LsArgs),

    /// Search a folder by keyword
    Search(search::SearchArgs),

    /// Show file or folder metadata
    Stat(stat::StatArgs),

    /// Remove files and folders (to the recycle bin)
    Rm(rm::RmArgs),

    /// Move files and folders into a folder
    Mv(mv::MvArgs),

    /// Copy files and folders into a folder
    Cp(cp::CpArgs),

    /// Change the working directory
    Cd(cd::CdArgs),

    /// Print the working directory
    Pwd,

    /// Show or change settings
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
        ..Default::default()
    }
    .with_defaults(&output_defaults());
    let family = cli.family;

    match cli.command {
        Commands::Ls(args) => ls::execute(args, family, output_config).await,
        Commands::Search(args) => search::execute(args, family, output_config).await,
        Commands::Stat(args) => stat::execute(args, family, output_config).await,
        Commands::Rm(args) => rm::execute(args, family, output_config).await,
        Commands::Mv(args) => mv::execute(args, family, output_config).await,
        Commands::Cp(args) => cp::execute(args, family, output_config).await,
        Commands::Cd(args) => cd::execute(args, family, output_config).await,
        Commands::Pwd => cd::pwd(family, output_config),
        Commands::Config(cmd) => config::execute(cmd, output_config),
        Commands::Completions(args) => completions::execute(args),
    }
}

/// `[defaults]` of the config file; a broken file is reported by the command
fn output_defaults() -> Defaults {
    match ConfigManager::new().and_then(|manager| manager.load()) {
        Ok(config) => config.defaults,
        Err(e) => {
            tracing::debug!("Using built-in output defaults: {}", e);
            Defaults::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_anywhere() {
        let cli = Cli::try_parse_from(["pan", "rm", "/a.txt", "--json", "--family", "12"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.family, 12);
        assert!(matches!(cli.command, Commands::Rm(_)));
    }

    #[test]
    fn test_rm_requires_a_path() {
        assert!(Cli::try_parse_from(["pan", "rm"]).is_err());
    }

    #[test]
    fn test_mv_requires_source_and_target() {
        assert!(Cli::try_parse_from(["pan", "mv", "/a.txt"]).is_err());
        assert!(Cli::try_parse_from(["pan", "mv", "/a.txt", "/b.txt", "/dest"]).is_ok());
    }
}
