//! stat command - Show file or folder metadata
//!
//! The path is resolved first, then the full metadata is fetched by id. The
//! root has no metadata on the service and is described locally.

use clap::Args;
use pan_core::{CloudApi as _, Entity};
use serde::Serialize;

use super::context::Context;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Show file or folder metadata
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Remote path, absolute or relative to the working directory
    pub path: String,
}

#[derive(Debug, Serialize)]
struct StatOutput {
    path: String,
    size_human: String,
    #[serde(flatten)]
    entity: Entity,
}

/// Execute the stat command
pub async fn execute(args: StatArgs, family: i64, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let ctx = match Context::load_or_report(family, &formatter) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let (path, resolved) = match ctx.resolve(&args.path).await {
        Ok(resolved) => resolved,
        Err(e) => {
            formatter.error(&format!("Cannot access {}: {e}", args.path));
            return ExitCode::from(&e);
        }
    };

    let entity = if resolved.is_root_of(ctx.scope) {
        resolved
    } else {
        match ctx.client.file_info(ctx.scope, &resolved.id).await {
            Ok(entity) => entity,
            Err(e) => {
                formatter.error(&format!("Failed to get metadata of {path}: {e}"));
                return ExitCode::from(&e);
            }
        }
    };

    if formatter.is_json() {
        formatter.json(&StatOutput {
            path: path.to_string(),
            size_human: entity.size_human(),
            entity,
        });
    } else {
        for line in describe(path.as_str(), &entity) {
            formatter.println(&line);
        }
    }

    ExitCode::Success
}

/// Key/value lines of the human-readable view
fn describe(path: &str, entity: &Entity) -> Vec<String> {
    let mut lines = vec![
        format!("Path      : {path}"),
        format!("Name      : {}", entity.name),
        format!("ID        : {}", entity.id),
        format!(
            "Type      : {}",
            if entity.is_folder { "folder" } else { "file" }
        ),
    ];
    if entity.is_folder {
        if let Some(count) = entity.child_count {
            lines.push(format!("Children  : {count}"));
        }
    } else {
        lines.push(format!(
            "Size      : {} ({} bytes)",
            entity.size_human(),
            entity.size
        ));
        if !entity.file_type.is_empty() {
            lines.push(format!("Extension : {}", entity.file_type));
        }
    }
    if let Some(created) = &entity.created_at {
        lines.push(format!("Created   : {created}"));
    }
    if let Some(modified) = &entity.modified_at {
        lines.push(format!("Modified  : {modified}"));
    }
    if entity.starred {
        lines.push("Starred   : yes".to_string());
    }
    lines
}
