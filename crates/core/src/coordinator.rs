//! Batch task coordination
//!
//! Runs one bulk operation over a list of user paths:
//! resolve every path, submit one task for everything that resolved, poll the
//! task until it is terminal or the poll timeout elapses, then sort each path
//! into succeeded, failed to resolve, or failed remotely.
//!
//! Resolution failures are per path and never abort the batch. Errors while
//! submitting or polling abort it, since a task is all-or-nothing to submit.

use std::collections::HashSet;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::batch::{
    BatchTaskHandle, BatchTaskItem, BatchTaskKind, BatchTaskStatus, BatchTaskSubmission, TaskState,
};
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::resolver::{MatchPolicy, PathResolver};
use crate::scope::Scope;
use crate::traits::CloudApi;

/// Polling schedule for a submitted task
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Wait before the first status check
    pub initial_delay: Duration,
    /// Wait after the first pending answer
    pub interval: Duration,
    /// Cap on the wait between checks
    pub max_interval: Duration,
    /// Growth factor applied to the wait after each pending answer
    pub multiplier: f64,
    /// Overall bound on polling, measured from submission
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(200),
            interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(5),
            multiplier: 2.0,
            timeout: Duration::from_secs(60),
        }
    }
}

impl PollPolicy {
    /// Wait that follows `current`
    pub fn next_interval(&self, current: Duration) -> Duration {
        let multiplier = if self.multiplier.is_finite() && self.multiplier >= 1.0 {
            self.multiplier
        } else {
            1.0
        };
        Duration::try_from_secs_f64(current.as_secs_f64() * multiplier)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }
}

/// Final state of a coordinated batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    /// No path resolved, nothing was submitted
    NothingToDo,
    /// Every submitted item was processed
    Completed,
    /// The task finished but some items failed
    Partial,
    /// The task ended in the failed state
    Failed,
    /// The task was still pending when the poll timeout elapsed
    TimedOut,
}

/// A path whose entity the service processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedItem {
    pub path: String,
    pub file_id: String,
    pub is_folder: bool,
}

/// A path that never reached the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveFailure {
    pub path: String,
    pub reason: String,
}

/// A submitted path the service did not process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFailure {
    pub path: String,
    pub file_id: String,
    pub reason: String,
}

/// Outcome of one batch operation, in three buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub kind: BatchTaskKind,
    pub scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub state: BatchState,
    pub succeeded: Vec<ProcessedItem>,
    pub failed_to_resolve: Vec<ResolveFailure>,
    pub failed_remotely: Vec<RemoteFailure>,
}

impl BatchReport {
    fn empty(kind: BatchTaskKind, scope: Scope) -> Self {
        Self {
            kind,
            scope,
            task_id: None,
            state: BatchState::NothingToDo,
            succeeded: Vec::new(),
            failed_to_resolve: Vec::new(),
            failed_remotely: Vec::new(),
        }
    }

    /// Every input path was processed
    pub fn is_success(&self) -> bool {
        self.failed_to_resolve.is_empty() && self.failed_remotely.is_empty()
    }

    /// Number of input paths covered by the report
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed_to_resolve.len() + self.failed_remotely.len()
    }
}

/// Orchestrates resolve, submit and poll for one bulk operation
pub struct BatchCoordinator<'a, A: CloudApi + ?Sized> {
    api: &'a A,
    poll: PollPolicy,
    match_policy: MatchPolicy,
    concurrency: usize,
}

impl<'a, A: CloudApi + ?Sized> BatchCoordinator<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            poll: PollPolicy::default(),
            match_policy: MatchPolicy::default(),
            concurrency: 1,
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }

    /// Resolve up to `limit` paths at once; 1 keeps resolution sequential
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    /// Run an operation that takes no destination (delete)
    pub async fn run(
        &self,
        kind: BatchTaskKind,
        paths: &[String],
        scope: Scope,
    ) -> Result<BatchReport> {
        if kind.needs_target() {
            return Err(Error::InvalidInput(format!(
                "a {kind} operation needs a target folder"
            )));
        }
        self.execute(kind, paths, None, scope).await
    }

    /// Run an operation into a destination folder (move, copy)
    pub async fn run_to(
        &self,
        kind: BatchTaskKind,
        paths: &[String],
        target: &Entity,
        scope: Scope,
    ) -> Result<BatchReport> {
        if !kind.needs_target() {
            return Err(Error::InvalidInput(format!(
                "a {kind} operation takes no target folder"
            )));
        }
        if !target.is_folder {
            return Err(Error::InvalidInput(format!(
                "target '{}' is not a folder",
                target.name
            )));
        }
        self.execute(kind, paths, Some(target.id.clone()), scope)
            .await
    }

    async fn execute(
        &self,
        kind: BatchTaskKind,
        paths: &[String],
        target_folder_id: Option<String>,
        scope: Scope,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::empty(kind, scope);

        // Resolving
        let resolved = self.resolve_all(paths, scope, &mut report).await;
        if resolved.is_empty() {
            tracing::debug!("No path resolved for {kind}, nothing to submit");
            return Ok(report);
        }

        // Submitting
        let mut seen = HashSet::new();
        let items: Vec<BatchTaskItem> = resolved
            .iter()
            .filter(|(_, entity)| seen.insert(entity.id.clone()))
            .map(|(_, entity)| BatchTaskItem::from(entity))
            .collect();
        let submission = BatchTaskSubmission::new(kind, items, target_folder_id)?;
        let handle = self.api.create_batch_task(scope, &submission).await?;
        tracing::debug!("Submitted {} task {}", kind, handle.task_id);
        report.task_id = Some(handle.task_id.clone());

        // Polling
        let status = self.poll(scope, &handle).await?;
        reconcile(&mut report, resolved, status, &handle);

        Ok(report)
    }

    async fn resolve_all(
        &self,
        paths: &[String],
        scope: Scope,
        report: &mut BatchReport,
    ) -> Vec<(String, Entity)> {
        let resolver = PathResolver::new(self.api).with_policy(self.match_policy);
        let resolver = &resolver;

        let outcomes: Vec<(String, Result<Entity>)> = stream::iter(paths)
            .map(|path| async move { (path.clone(), resolver.resolve(path, scope).await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut resolved = Vec::with_capacity(outcomes.len());
        for (path, outcome) in outcomes {
            match outcome {
                Ok(entity) if entity.is_root_of(scope) => {
                    report.failed_to_resolve.push(ResolveFailure {
                        path,
                        reason: "the root folder cannot be a batch target".into(),
                    });
                }
                Ok(entity) => resolved.push((path, entity)),
                Err(e) => {
                    tracing::debug!("Failed to resolve {}: {}", path, e);
                    report.failed_to_resolve.push(ResolveFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
        resolved
    }

    /// Poll until terminal; `None` means the timeout elapsed first
    async fn poll(
        &self,
        scope: Scope,
        handle: &BatchTaskHandle,
    ) -> Result<Option<BatchTaskStatus>> {
        let deadline = Instant::now() + self.poll.timeout;
        tokio::time::sleep(self.poll.initial_delay.min(self.poll.timeout)).await;

        let mut interval = self.poll.interval;
        let mut attempts = 0u32;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            attempts += 1;
            let status = match tokio::time::timeout(
                remaining,
                self.api.check_batch_task(scope, handle),
            )
            .await
            {
                Ok(result) => result?,
                Err(_) => break,
            };
            tracing::debug!(
                "Task {} is {:?} after {} check(s)",
                handle.task_id,
                status.state,
                attempts
            );

            if status.state.is_terminal() {
                return Ok(Some(status));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(interval.min(remaining)).await;
            interval = self.poll.next_interval(interval);
        }

        tracing::warn!(
            "Task {} still pending after {:?} ({} check(s))",
            handle.task_id,
            self.poll.timeout,
            attempts
        );
        Ok(None)
    }
}

/// Sort submitted paths into succeeded / failed remotely
fn reconcile(
    report: &mut BatchReport,
    resolved: Vec<(String, Entity)>,
    status: Option<BatchTaskStatus>,
    handle: &BatchTaskHandle,
) {
    let Some(status) = status else {
        report.state = BatchState::TimedOut;
        for (path, entity) in resolved {
            report.failed_remotely.push(RemoteFailure {
                path,
                file_id: entity.id,
                reason: format!("task {} did not finish in time", handle.task_id),
            });
        }
        return;
    };

    // Failures naming none of our items say nothing about the rest
    let has_detail = resolved
        .iter()
        .any(|(_, entity)| status.failure_for(&entity.id).is_some());
    for (path, entity) in resolved {
        let failure = status.failure_for(&entity.id);
        let reason = match failure {
            Some(f) if report.kind == BatchTaskKind::Delete && f.is_already_gone() => None,
            Some(f) => Some(f.reason()),
            None if status.state == TaskState::Ok || has_detail => None,
            None => Some(format!("task {} failed", handle.task_id)),
        };

        match reason {
            None => report.succeeded.push(ProcessedItem {
                path,
                file_id: entity.id,
                is_folder: entity.is_folder,
            }),
            Some(reason) => {
                tracing::warn!("{} of {} failed: {}", report.kind, path, reason);
                report.failed_remotely.push(RemoteFailure {
                    path,
                    file_id: entity.id,
                    reason,
                });
            }
        }
    }

    report.state = match (status.state, report.failed_remotely.is_empty()) {
        (_, true) => BatchState::Completed,
        (TaskState::Failed, false) => BatchState::Failed,
        (_, false) => BatchState::Partial,
    };
}
