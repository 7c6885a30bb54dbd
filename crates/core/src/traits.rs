//! CloudApi trait definition
//!
//! This trait defines the interface to the remote drive service.
//! It allows the resolver, the batch coordinator and the CLI to be decoupled
//! from the HTTP adapter.

use async_trait::async_trait;

use crate::batch::{BatchTaskHandle, BatchTaskStatus, BatchTaskSubmission};
use crate::entity::Entity;
use crate::error::Result;
use crate::scope::Scope;
use crate::search::{SearchParams, SearchResult};

/// Remote drive operations, parameterized by namespace scope
///
/// This trait is implemented by the HTTP adapter and faked in tests.
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// List or search the children of one folder
    async fn search(&self, scope: Scope, params: &SearchParams) -> Result<SearchResult>;

    /// Get metadata of one entity by id
    async fn file_info(&self, scope: Scope, file_id: &str) -> Result<Entity>;

    /// Submit a batch task
    async fn create_batch_task(
        &self,
        scope: Scope,
        submission: &BatchTaskSubmission,
    ) -> Result<BatchTaskHandle>;

    /// Query the current status of a submitted task
    async fn check_batch_task(
        &self,
        scope: Scope,
        handle: &BatchTaskHandle,
    ) -> Result<BatchTaskStatus>;
}
