//! In-memory drive used by unit tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::batch::{
    BatchTaskHandle, BatchTaskKind, BatchTaskStatus, BatchTaskSubmission, ItemFailure,
};
use crate::entity::{Entity, PathSegment};
use crate::error::{Error, Result};
use crate::scope::Scope;
use crate::search::{OrderBy, OrderDirection, SearchParams, SearchResult};
use crate::traits::CloudApi;

#[derive(Default)]
struct State {
    entities: HashMap<String, Entity>,
    next_id: u64,
    /// Folders whose listing fails with a network error
    broken_folders: HashSet<String>,
    /// Statuses returned by the next checks, before the computed one
    scripted: VecDeque<BatchTaskStatus>,
    /// Status computed when the last task was applied
    outcome: Option<BatchTaskStatus>,
    always_pending: bool,
    fail_submit: bool,
    /// Real id behind the family root sentinel
    family_root: Option<String>,
    submissions: Vec<BatchTaskSubmission>,
}

/// Fake drive with a single namespace shared by every scope
///
/// With `set_family_root`, family listings of the root sentinel return the
/// children of a real folder id, as the service does.
#[derive(Default)]
pub struct FakeCloud {
    state: Mutex<State>,
    search_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    check_calls: AtomicUsize,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, entity: Entity) -> String {
        let id = entity.id.clone();
        self.state.lock().unwrap().entities.insert(id.clone(), entity);
        id
    }

    fn next_id(&self) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        format!("{}", 1000 + state.next_id)
    }

    pub fn add_folder(&self, parent_id: &str, name: &str) -> String {
        let id = self.next_id();
        self.insert(Entity::folder(id, name, parent_id))
    }

    pub fn add_file(&self, parent_id: &str, name: &str, size: u64) -> String {
        let id = self.next_id();
        self.insert(Entity::file(id, name, size, parent_id))
    }

    pub fn remove(&self, id: &str) {
        self.state.lock().unwrap().entities.remove(id);
    }

    pub fn exists(&self, id: &str) -> bool {
        self.state.lock().unwrap().entities.contains_key(id)
    }

    pub fn break_folder(&self, folder_id: &str) {
        self.state
            .lock()
            .unwrap()
            .broken_folders
            .insert(folder_id.to_string());
    }

    pub fn script_status(&self, status: BatchTaskStatus) {
        self.state.lock().unwrap().scripted.push_back(status);
    }

    pub fn set_always_pending(&self) {
        self.state.lock().unwrap().always_pending = true;
    }

    pub fn set_family_root(&self, folder_id: &str) {
        self.state.lock().unwrap().family_root = Some(folder_id.to_string());
    }

    pub fn set_fail_submit(&self) {
        self.state.lock().unwrap().fail_submit = true;
    }

    pub fn submissions(&self) -> Vec<BatchTaskSubmission> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.search_calls() + self.submit_calls() + self.check_calls()
    }

    fn breadcrumb(state: &State, scope: Scope, folder_id: &str) -> Vec<PathSegment> {
        let mut path = Vec::new();
        let mut current = folder_id.to_string();
        while let Some(entity) = state.entities.get(&current) {
            path.push(PathSegment::new(&entity.id, &entity.name));
            current = entity.parent_id.clone();
        }
        path.push(PathSegment::new(scope.root_id(), "/"));
        path.reverse();
        path
    }

    fn apply(state: &mut State, submission: &BatchTaskSubmission) -> BatchTaskStatus {
        let mut status = BatchTaskStatus::ok();
        for item in submission.items() {
            if !state.entities.contains_key(&item.file_id) {
                status.failures.push(ItemFailure {
                    file_id: item.file_id.clone(),
                    code: "FileNotFound".into(),
                    message: String::new(),
                });
                status.failed_count += 1;
                continue;
            }
            match submission.kind() {
                BatchTaskKind::Delete => {
                    state.entities.remove(&item.file_id);
                }
                BatchTaskKind::Move => {
                    let target = submission.target_folder_id().unwrap_or_default().to_string();
                    if let Some(entity) = state.entities.get_mut(&item.file_id) {
                        entity.parent_id = target;
                    }
                }
                BatchTaskKind::Copy => {}
            }
            status.success_count += 1;
        }
        status
    }
}

#[async_trait]
impl CloudApi for FakeCloud {
    async fn search(&self, scope: Scope, params: &SearchParams) -> Result<SearchResult> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        params.validate()?;

        let state = self.state.lock().unwrap();
        if state.broken_folders.contains(&params.folder_id) {
            return Err(Error::Network("connection reset".into()));
        }

        let folder_id = match (&state.family_root, scope) {
            (Some(real), Scope::Family(_)) if params.folder_id == scope.root_id() => real.clone(),
            _ => params.folder_id.clone(),
        };

        // Keyword match is fuzzy and case-insensitive, like the real service
        let keyword = params.keyword.to_lowercase();
        let mut matches: Vec<Entity> = state
            .entities
            .values()
            .filter(|e| e.parent_id == folder_id)
            .filter(|e| keyword.is_empty() || e.name.to_lowercase().contains(&keyword))
            .cloned()
            .collect();
        matches.sort_by(|a, b| match params.order_by {
            OrderBy::Name => a.name.cmp(&b.name),
            OrderBy::Size => a.size.cmp(&b.size).then(a.name.cmp(&b.name)),
            OrderBy::Time => a.id.cmp(&b.id),
        });
        if params.order == OrderDirection::Desc {
            matches.reverse();
        }

        let record_count = matches.len() as u64;
        let start = ((params.page_num - 1) * params.page_size) as usize;
        let entities = matches
            .into_iter()
            .skip(start)
            .take(params.page_size as usize)
            .collect();

        Ok(SearchResult {
            entities,
            page_num: params.page_num,
            page_size: params.page_size,
            path: Self::breadcrumb(&state, scope, &params.folder_id),
            record_count,
        })
    }

    async fn file_info(&self, _scope: Scope, file_id: &str) -> Result<Entity> {
        self.state
            .lock()
            .unwrap()
            .entities
            .get(file_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("file id {file_id}")))
    }

    async fn create_batch_task(
        &self,
        _scope: Scope,
        submission: &BatchTaskSubmission,
    ) -> Result<BatchTaskHandle> {
        let count = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.lock().unwrap();
        if state.fail_submit {
            return Err(Error::Network("submit refused".into()));
        }
        state.submissions.push(submission.clone());
        let outcome = Self::apply(&mut state, submission);
        state.outcome = Some(outcome);
        Ok(BatchTaskHandle {
            task_id: format!("task-{count}"),
            kind: submission.kind(),
        })
    }

    async fn check_batch_task(
        &self,
        _scope: Scope,
        _handle: &BatchTaskHandle,
    ) -> Result<BatchTaskStatus> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.always_pending {
            return Ok(BatchTaskStatus::pending());
        }
        if let Some(status) = state.scripted.pop_front() {
            return Ok(status);
        }
        Ok(state.outcome.clone().unwrap_or_else(BatchTaskStatus::failed))
    }
}
