//! Shell completion generation
//!
//! Completion scripts cover every subcommand and global flag, including
//! `--family`.

use std::io::Write;

use clap::CommandFactory;
use clap_complete::Shell;

use super::Cli;
use crate::exit_code::ExitCode;

/// Arguments for the completions command
#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Generate shell completions and print to stdout
pub fn execute(args: CompletionsArgs) -> ExitCode {
    let script = render(args.shell);
    match std::io::stdout().write_all(&script) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Failed to write completions: {e}");
            ExitCode::GeneralError
        }
    }
}

fn render(shell: Shell) -> Vec<u8> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut cmd, name, &mut buf);
    buf
}
