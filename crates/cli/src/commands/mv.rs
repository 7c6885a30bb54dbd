//! mv command - Move files and folders into a folder
//!
//! The last path is the destination folder. It must already exist.

use clap::Args;
use pan_core::BatchTaskKind;

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

/// Move files and folders
#[derive(Args, Debug)]
pub struct MvArgs {
    /// Source path(s) followed by the destination folder
    #[arg(required = true, num_args = 2..)]
    pub paths: Vec<String>,
}

/// Execute the mv command
pub async fn execute(args: MvArgs, family: i64, output_config: OutputConfig) -> ExitCode {
    let Some((target, sources)) = args.paths.split_last() else {
        return ExitCode::UsageError;
    };
    if sources.is_empty() {
        return ExitCode::UsageError;
    }
    super::batch::run(
        BatchTaskKind::Move,
        sources,
        Some(target),
        family,
        output_config,
    )
    .await
}
