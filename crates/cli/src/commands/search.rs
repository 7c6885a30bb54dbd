//! search command - Search one folder by keyword
//!
//! The service matches the keyword against the children of a single folder.
//! One page is fetched per call; use `--page` to walk further.

use clap::{Args, ValueEnum};
use pan_core::search::DEFAULT_PAGE_SIZE;
use pan_core::{CloudApi as _, MediaType, OrderBy, OrderDirection, SearchParams, SearchResult};
use serde::Serialize;

use super::context::Context;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Sort field accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    Name,
    Size,
    Time,
}

impl From<OrderArg> for OrderBy {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Name => OrderBy::Name,
            OrderArg::Size => OrderBy::Size,
            OrderArg::Time => OrderBy::Time,
        }
    }
}

pub(crate) fn order_direction(desc: bool) -> OrderDirection {
    if desc {
        OrderDirection::Desc
    } else {
        OrderDirection::Asc
    }
}

/// Media filter accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaArg {
    All,
    Music,
    Image,
    Video,
    Document,
}

impl From<MediaArg> for MediaType {
    fn from(arg: MediaArg) -> Self {
        match arg {
            MediaArg::All => MediaType::All,
            MediaArg::Music => MediaType::Music,
            MediaArg::Image => MediaType::Image,
            MediaArg::Video => MediaType::Video,
            MediaArg::Document => MediaType::Document,
        }
    }
}

/// Search a folder by keyword
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Keyword to match against names
    pub keyword: String,

    /// Folder to search, defaults to the working directory
    #[arg(long, default_value = ".")]
    pub path: String,

    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Entries per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Sort field
    #[arg(long, value_enum, default_value_t = OrderArg::Name)]
    pub order: OrderArg,

    /// Sort in descending order
    #[arg(long)]
    pub desc: bool,

    /// Only return entities of this media type
    #[arg(long, value_enum, default_value_t = MediaArg::All)]
    pub media: MediaArg,

    /// Search the shared group space
    #[arg(long)]
    pub group_space: bool,
}

impl SearchArgs {
    fn params(&self, folder_id: &str) -> SearchParams {
        SearchParams {
            folder_id: folder_id.to_string(),
            media_type: self.media.into(),
            keyword: self.keyword.clone(),
            in_group_space: self.group_space,
            order_by: self.order.into(),
            order: order_direction(self.desc),
            page_num: self.page,
            page_size: self.page_size,
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    folder: String,
    keyword: String,
    has_more: bool,
    #[serde(flatten)]
    result: SearchResult,
}

/// Execute the search command
pub async fn execute(args: SearchArgs, family: i64, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let ctx = match Context::load_or_report(family, &formatter) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let (folder, entity) = match ctx.resolve(&args.path).await {
        Ok(resolved) => resolved,
        Err(e) => {
            formatter.error(&format!("Cannot access {}: {e}", args.path));
            return ExitCode::from(&e);
        }
    };
    if !entity.is_folder {
        formatter.error(&format!("{folder} is not a folder"));
        return ExitCode::UsageError;
    }

    let params = args.params(&entity.id);
    if let Err(e) = params.validate() {
        formatter.error(&e.to_string());
        return ExitCode::UsageError;
    }

    tracing::debug!(keyword = %args.keyword, folder = %folder, "Searching");
    let result = match ctx.client.search(ctx.scope, &params).await {
        Ok(result) => result,
        Err(e) => {
            formatter.error(&format!("Search failed: {e}"));
            return ExitCode::from(&e);
        }
    };

    if formatter.is_json() {
        formatter.json(&SearchOutput {
            folder: folder.to_string(),
            keyword: args.keyword,
            has_more: result.has_more(),
            result,
        });
        return ExitCode::Success;
    }

    if result.entities.is_empty() {
        formatter.println(&format!("No match for '{}' in {folder}", args.keyword));
        return ExitCode::Success;
    }

    let mut table = formatter.table(&["NAME", "SIZE", "MODIFIED", "ID"]);
    for entity in &result.entities {
        let name = if entity.is_folder {
            format!("{}/", entity.name)
        } else {
            entity.name.clone()
        };
        let size = if entity.is_folder {
            "-".to_string()
        } else {
            entity.size_human()
        };
        table.add_row(vec![
            name,
            size,
            entity.modified_at.clone().unwrap_or_default(),
            entity.id.clone(),
        ]);
    }
    formatter.print_table(&table);
    formatter.println(&format!(
        "Page {}: {} of {} match(es){}",
        result.page_num,
        result.entities.len(),
        result.record_count,
        if result.has_more() {
            ", more with --page"
        } else {
            ""
        }
    ));

    ExitCode::Success
}
