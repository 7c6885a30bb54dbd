//! Remote file and folder metadata
//!
//! `Entity` is a read-only snapshot of one node in a remote namespace. The
//! service stays the source of truth; nothing here is cached.

use serde::{Deserialize, Serialize};

use crate::scope::Scope;

/// Timestamp layout used by the service for create/modify times
const SERVICE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Media classification used both as an entity attribute and a search filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum MediaType {
    /// No filter / unclassified
    #[default]
    All,
    Music,
    Image,
    Video,
    Document,
    /// Any code this client does not know about
    Other(u32),
}

impl MediaType {
    pub const fn code(self) -> u32 {
        match self {
            MediaType::All => 0,
            MediaType::Music => 1,
            MediaType::Image => 2,
            MediaType::Video => 3,
            MediaType::Document => 4,
            MediaType::Other(code) => code,
        }
    }
}

impl From<u32> for MediaType {
    fn from(code: u32) -> Self {
        match code {
            0 => MediaType::All,
            1 => MediaType::Music,
            2 => MediaType::Image,
            3 => MediaType::Video,
            4 => MediaType::Document,
            other => MediaType::Other(other),
        }
    }
}

impl From<MediaType> for u32 {
    fn from(media: MediaType) -> Self {
        media.code()
    }
}

/// A file or folder in a remote namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Opaque id, unique within the scope
    pub id: String,

    /// File or folder name
    pub name: String,

    /// Size in bytes, always 0 for folders
    pub size: u64,

    /// Extension reported by the service, empty when unknown
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_type: String,

    /// Whether this is a folder
    pub is_folder: bool,

    /// Id of the containing folder
    pub parent_id: String,

    /// Creation time as reported by the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Last modification time as reported by the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,

    /// Download reference, files only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    #[serde(default)]
    pub starred: bool,

    #[serde(default)]
    pub media_type: MediaType,

    /// Number of children, folders only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_count: Option<u64>,
}

impl Entity {
    /// Create a file entity
    pub fn file(
        id: impl Into<String>,
        name: impl Into<String>,
        size: u64,
        parent_id: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let file_type = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_string())
            .unwrap_or_default();
        Self {
            id: id.into(),
            name,
            size,
            file_type,
            is_folder: false,
            parent_id: parent_id.into(),
            created_at: None,
            modified_at: None,
            download_url: None,
            starred: false,
            media_type: MediaType::All,
            child_count: None,
        }
    }

    /// Create a folder entity
    pub fn folder(
        id: impl Into<String>,
        name: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size: 0,
            file_type: String::new(),
            is_folder: true,
            parent_id: parent_id.into(),
            created_at: None,
            modified_at: None,
            download_url: None,
            starred: false,
            media_type: MediaType::All,
            child_count: None,
        }
    }

    /// The well-known root folder of a scope
    pub fn root(scope: Scope) -> Self {
        Self::folder(scope.root_id(), "/", "")
    }

    /// Whether this entity is the root of the given scope
    pub fn is_root_of(&self, scope: Scope) -> bool {
        self.is_folder && self.id == scope.root_id()
    }

    /// Parsed modification time, if present and well formed
    pub fn modified_time(&self) -> Option<jiff::civil::DateTime> {
        self.modified_at
            .as_deref()
            .and_then(|t| jiff::civil::DateTime::strptime(SERVICE_TIME_FORMAT, t).ok())
    }

    /// Human-readable size
    pub fn size_human(&self) -> String {
        humansize::format_size(self.size, humansize::BINARY)
    }
}

/// One breadcrumb element of a listed folder's path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    pub id: String,
    pub name: String,
    /// Whether the folder is co-shared
    #[serde(default)]
    pub shared: bool,
}

impl PathSegment {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shared: false,
        }
    }
}

/// Render a breadcrumb as an absolute path, skipping the root element
pub fn breadcrumb_path(segments: &[PathSegment], scope: Scope) -> String {
    let names: Vec<&str> = segments
        .iter()
        .filter(|s| s.id != scope.root_id())
        .map(|s| s.name.as_str())
        .collect();
    format!("/{}", names.join("/"))
}
