//! cd and pwd commands - Working directory of the current scope
//!
//! The personal and family drives each keep their own working directory in
//! the config file. Relative paths in every other command start from it.

use clap::Args;
use pan_core::{ConfigManager, Scope};
use serde::Serialize;

use super::context::Context;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Change the working directory
#[derive(Args, Debug)]
pub struct CdArgs {
    /// Folder to switch to, defaults to the root
    #[arg(default_value = "/")]
    pub path: String,
}

#[derive(Debug, Serialize)]
struct WorkdirOutput {
    scope: Scope,
    workdir: String,
}

/// Execute the cd command
pub async fn execute(args: CdArgs, family: i64, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let mut ctx = match Context::load_or_report(family, &formatter) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let (path, entity) = match ctx.resolve(&args.path).await {
        Ok(resolved) => resolved,
        Err(e) => {
            formatter.error(&format!("Cannot access {}: {e}", args.path));
            return ExitCode::from(&e);
        }
    };
    if !entity.is_folder {
        formatter.error(&format!("{path} is not a folder"));
        return ExitCode::UsageError;
    }

    ctx.config.set_workdir(ctx.scope, path.to_string());
    if let Err(e) = ctx.manager.save(&ctx.config) {
        formatter.error(&format!("Failed to save working directory: {e}"));
        return ExitCode::GeneralError;
    }

    if formatter.is_json() {
        formatter.json(&WorkdirOutput {
            scope: ctx.scope,
            workdir: path.to_string(),
        });
    } else {
        formatter.success(&format!("Working directory is now {path}"));
    }
    ExitCode::Success
}

/// Print the working directory; needs no network access
pub fn pwd(family: i64, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let config = match ConfigManager::new().and_then(|manager| manager.load()) {
        Ok(config) => config,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from(&e);
        }
    };

    let scope = Scope::from_family_id(family);
    let workdir = config.workdir_for(scope).to_string();
    if formatter.is_json() {
        formatter.json(&WorkdirOutput { scope, workdir });
    } else {
        formatter.println(&workdir);
    }
    ExitCode::Success
}
