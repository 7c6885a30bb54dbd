//! cp command - Copy files and folders into a folder

use clap::Args;
use pan_core::BatchTaskKind;

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

/// Copy files and folders
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source path(s) followed by the destination folder
    #[arg(required = true, num_args = 2..)]
    pub paths: Vec<String>,
}

/// Execute the cp command
pub async fn execute(args: CpArgs, family: i64, output_config: OutputConfig) -> ExitCode {
    let Some((target, sources)) = args.paths.split_last() else {
        return ExitCode::UsageError;
    };
    if sources.is_empty() {
        return ExitCode::UsageError;
    }
    super::batch::run(
        BatchTaskKind::Copy,
        sources,
        Some(target),
        family,
        output_config,
    )
    .await
}
