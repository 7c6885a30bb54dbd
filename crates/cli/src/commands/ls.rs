//! ls command - List a folder
//!
//! Lists the children of a folder, or the entity itself when the path names
//! a file. Every page of the listing is fetched up to `--max-pages`.

use clap::Args;
use pan_core::search::{DEFAULT_PAGE_SIZE, search_all};
use pan_core::{Entity, SearchParams};
use serde::Serialize;

use super::context::Context;
use super::search::{OrderArg, order_direction};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List a folder
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Remote path, defaults to the working directory
    pub path: Option<String>,

    /// Entries fetched per request
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Stop after this many pages
    #[arg(long, default_value_t = 100)]
    pub max_pages: u32,

    /// Sort field
    #[arg(long, value_enum, default_value_t = OrderArg::Name)]
    pub order: OrderArg,

    /// Sort in descending order
    #[arg(long)]
    pub desc: bool,

    /// Summarize output (show totals only)
    #[arg(long)]
    pub summarize: bool,
}

/// Output structure for ls command (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput {
    path: String,
    items: Vec<Entity>,
    record_count: u64,
    truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_files: usize,
    total_folders: usize,
    total_size_bytes: u64,
    total_size_human: String,
}

impl Summary {
    fn of(items: &[Entity]) -> Self {
        let total_files = items.iter().filter(|e| !e.is_folder).count();
        let total_size_bytes = items.iter().map(|e| e.size).sum();
        Self {
            total_files,
            total_folders: items.len() - total_files,
            total_size_bytes,
            total_size_human: humansize::format_size(total_size_bytes, humansize::BINARY),
        }
    }
}

/// Execute the ls command
pub async fn execute(args: LsArgs, family: i64, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let ctx = match Context::load_or_report(family, &formatter) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let input = args.path.as_deref().unwrap_or(".");
    let (path, entity) = match ctx.resolve(input).await {
        Ok(resolved) => resolved,
        Err(e) => {
            formatter.error(&format!("Cannot access {input}: {e}"));
            return ExitCode::from(&e);
        }
    };

    if !entity.is_folder {
        if formatter.is_json() {
            formatter.json(&LsOutput {
                path: path.to_string(),
                items: vec![entity],
                record_count: 1,
                truncated: false,
                summary: None,
            });
        } else {
            formatter.println(&entry_line(&entity));
        }
        return ExitCode::Success;
    }

    let params = SearchParams {
        page_size: args.page_size,
        order_by: args.order.into(),
        order: order_direction(args.desc),
        ..SearchParams::in_folder(&entity.id)
    };
    let listing = match search_all(&ctx.client, ctx.scope, &params, args.max_pages).await {
        Ok(listing) => listing,
        Err(e) => {
            formatter.error(&format!("Failed to list {path}: {e}"));
            return ExitCode::from(&e);
        }
    };
    let truncated = (listing.entities.len() as u64) < listing.record_count;
    if truncated {
        formatter.warning(&format!(
            "Showing {} of {} entries, raise --max-pages to see more",
            listing.entities.len(),
            listing.record_count
        ));
    }

    if formatter.is_json() {
        let summary = args.summarize.then(|| Summary::of(&listing.entities));
        formatter.json(&LsOutput {
            path: path.to_string(),
            items: listing.entities,
            record_count: listing.record_count,
            truncated,
            summary,
        });
    } else {
        for entity in &listing.entities {
            formatter.println(&entry_line(entity));
        }
        if args.summarize {
            let summary = Summary::of(&listing.entities);
            formatter.println(&format!(
                "\nTotal: {} files, {} folders, {}",
                summary.total_files, summary.total_folders, summary.total_size_human
            ));
        }
    }

    ExitCode::Success
}

/// One listing line: date, size and name, folders marked with a slash
fn entry_line(entity: &Entity) -> String {
    let date = entity
        .modified_time()
        .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| " ".repeat(19));

    if entity.is_folder {
        format!("[{date}] {:>10} {}/", "0 B", entity.name)
    } else {
        format!("[{date}] {:>10} {}", entity.size_human(), entity.name)
    }
}
