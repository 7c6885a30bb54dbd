//! pan-core: Core library for the pan cloud drive client
//!
//! This crate provides the core functionality for the pan CLI, including:
//! - Configuration management
//! - Path parsing and path-to-entity resolution
//! - Batch task coordination (delete, move, copy)
//! - CloudApi trait for remote drive operations
//!
//! This crate is independent of any HTTP client, allowing for easy testing
//! against an in-memory drive.

pub mod batch;
pub mod config;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod path;
pub mod resolver;
pub mod scope;
pub mod search;
pub mod traits;

#[cfg(test)]
mod testing;

pub use batch::{
    BatchTaskHandle, BatchTaskItem, BatchTaskKind, BatchTaskStatus, BatchTaskSubmission,
    ItemFailure, TaskState,
};
pub use config::{
    ColorMode, Config, ConfigManager, Defaults, OutputFormat, PollConfig, TransportSettings,
};
pub use coordinator::{
    BatchCoordinator, BatchReport, BatchState, PollPolicy, ProcessedItem, RemoteFailure,
    ResolveFailure,
};
pub use entity::{Entity, MediaType, PathSegment};
pub use error::{Error, Result};
pub use path::{RemotePath, parse_path};
pub use resolver::{MatchPolicy, PathResolver};
pub use scope::Scope;
pub use search::{OrderBy, OrderDirection, SearchParams, SearchResult};
pub use traits::CloudApi;
