//! Folder listing and keyword search
//!
//! The service only lists the children of one folder at a time, optionally
//! filtered by keyword and media type. Pagination is offset based: page N of
//! identical parameters over an unchanged namespace is the same slice.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, MediaType, PathSegment};
use crate::error::{Error, Result};
use crate::scope::Scope;
use crate::traits::CloudApi;

/// Page size used when none is given
pub const DEFAULT_PAGE_SIZE: u32 = 60;

/// Largest page size the service accepts
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Field to order a listing by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    #[default]
    Name,
    Size,
    Time,
}

impl OrderBy {
    /// Numeric code used by the personal listing route
    pub const fn code(self) -> u32 {
        match self {
            OrderBy::Name => 1,
            OrderBy::Size => 2,
            OrderBy::Time => 3,
        }
    }

    /// Field name used by the family listing route
    pub const fn field(self) -> &'static str {
        match self {
            OrderBy::Name => "filename",
            OrderBy::Size => "filesize",
            OrderBy::Time => "lastOpTime",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }

    pub const fn is_descending(self) -> bool {
        matches!(self, OrderDirection::Desc)
    }
}

/// Parameters of one listing/search call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Folder to list
    pub folder_id: String,
    pub media_type: MediaType,
    /// Keyword filter, empty for a plain listing
    pub keyword: String,
    /// Search inside the shared group space
    pub in_group_space: bool,
    pub order_by: OrderBy,
    pub order: OrderDirection,
    /// 1-based page number
    pub page_num: u32,
    pub page_size: u32,
}

impl SearchParams {
    /// List a folder with default ordering and paging
    pub fn in_folder(folder_id: impl Into<String>) -> Self {
        Self {
            folder_id: folder_id.into(),
            media_type: MediaType::All,
            keyword: String::new(),
            in_group_space: false,
            order_by: OrderBy::Name,
            order: OrderDirection::Asc,
            page_num: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Look for a name among the children of a folder
    pub fn child_named(folder_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyword: name.into(),
            ..Self::in_folder(folder_id)
        }
    }

    /// Same query, another page
    pub fn with_page(&self, page_num: u32) -> Self {
        Self {
            page_num,
            ..self.clone()
        }
    }

    /// Check paging bounds before anything is sent
    pub fn validate(&self) -> Result<()> {
        if self.page_num == 0 {
            return Err(Error::InvalidInput("page number must be at least 1".into()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::InvalidInput(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        Ok(())
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::in_folder(Scope::Personal.root_id())
    }
}

/// One page of a listing/search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub entities: Vec<Entity>,
    pub page_num: u32,
    pub page_size: u32,
    /// Breadcrumb of the listed folder
    pub path: Vec<PathSegment>,
    /// Total number of matches across all pages
    pub record_count: u64,
}

impl SearchResult {
    /// Whether pages after this one hold more records
    pub fn has_more(&self) -> bool {
        let consumed = u64::from(self.page_num) * u64::from(self.page_size);
        self.page_size > 0 && consumed < self.record_count
    }
}

/// Walk every page of a query, up to `max_pages`
///
/// The breadcrumb and record count of the first page are kept.
pub async fn search_all<A>(
    api: &A,
    scope: Scope,
    params: &SearchParams,
    max_pages: u32,
) -> Result<SearchResult>
where
    A: CloudApi + ?Sized,
{
    params.validate()?;

    let mut merged = api.search(scope, params).await?;
    let mut page = merged.clone();
    let mut fetched = 1;

    while page.has_more() && fetched < max_pages {
        let next = params.with_page(page.page_num + 1);
        page = api.search(scope, &next).await?;
        if page.entities.is_empty() {
            break;
        }
        merged.entities.extend(page.entities.iter().cloned());
        fetched += 1;
    }

    if page.has_more() {
        tracing::warn!(
            "Listing of folder {} truncated after {} page(s)",
            params.folder_id,
            fetched
        );
    }

    Ok(merged)
}
