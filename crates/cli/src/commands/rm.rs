//! rm command - Remove files and folders
//!
//! Removed entities go to the service's recycle bin.

use clap::Args;
use pan_core::BatchTaskKind;

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

/// Remove files and folders
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Path(s) to remove, absolute or relative to the working directory
    #[arg(required = true)]
    pub paths: Vec<String>,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, family: i64, output_config: OutputConfig) -> ExitCode {
    super::batch::run(BatchTaskKind::Delete, &args.paths, None, family, output_config).await
}
