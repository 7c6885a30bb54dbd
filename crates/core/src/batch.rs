//! Batch task model
//!
//! A batch task is an asynchronous, multi-item job on the service (delete,
//! move, copy). It is submitted once, identified by a handle, and polled
//! until it reaches `Ok` or `Failed`.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{Error, Result};

/// Error codes meaning the item is already gone
const ALREADY_GONE_CODES: &[&str] = &["FileNotFound", "FileAlreadyDeleted", "NoSuchFile"];

/// Kind of bulk operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchTaskKind {
    Delete,
    Move,
    Copy,
}

impl BatchTaskKind {
    /// Type flag sent to the service
    pub const fn type_flag(self) -> &'static str {
        match self {
            BatchTaskKind::Delete => "DELETE",
            BatchTaskKind::Move => "MOVE",
            BatchTaskKind::Copy => "COPY",
        }
    }

    /// Whether the operation needs a destination folder
    pub const fn needs_target(self) -> bool {
        !matches!(self, BatchTaskKind::Delete)
    }
}

impl std::fmt::Display for BatchTaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BatchTaskKind::Delete => "delete",
            BatchTaskKind::Move => "move",
            BatchTaskKind::Copy => "copy",
        };
        f.write_str(name)
    }
}

/// One entity targeted by a batch task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTaskItem {
    pub file_id: String,
    pub file_name: String,
    pub is_folder: bool,
    pub src_parent_id: String,
}

impl From<&Entity> for BatchTaskItem {
    fn from(entity: &Entity) -> Self {
        Self {
            file_id: entity.id.clone(),
            file_name: entity.name.clone(),
            is_folder: entity.is_folder,
            src_parent_id: entity.parent_id.clone(),
        }
    }
}

/// A bulk operation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTaskSubmission {
    kind: BatchTaskKind,
    items: Vec<BatchTaskItem>,
    target_folder_id: Option<String>,
}

impl BatchTaskSubmission {
    /// Build a submission, checking it is non-empty and has a target exactly
    /// when the kind needs one
    pub fn new(
        kind: BatchTaskKind,
        items: Vec<BatchTaskItem>,
        target_folder_id: Option<String>,
    ) -> Result<Self> {
        if items.is_empty() {
            return Err(Error::InvalidInput(format!(
                "a {kind} task needs at least one item"
            )));
        }
        match (kind.needs_target(), &target_folder_id) {
            (true, None) => {
                return Err(Error::InvalidInput(format!(
                    "a {kind} task needs a target folder"
                )));
            }
            (false, Some(_)) => {
                return Err(Error::InvalidInput(format!(
                    "a {kind} task takes no target folder"
                )));
            }
            _ => {}
        }
        Ok(Self {
            kind,
            items,
            target_folder_id,
        })
    }

    pub fn kind(&self) -> BatchTaskKind {
        self.kind
    }

    pub fn items(&self) -> &[BatchTaskItem] {
        &self.items
    }

    pub fn target_folder_id(&self) -> Option<&str> {
        self.target_folder_id.as_deref()
    }
}

/// Identifies a submitted, in-flight task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTaskHandle {
    pub task_id: String,
    pub kind: BatchTaskKind,
}

/// State of a submitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Ok,
    Failed,
}

impl TaskState {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, TaskState::Pending)
    }
}

/// Failure of one item reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub file_id: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl ItemFailure {
    /// The service says the item no longer exists
    pub fn is_already_gone(&self) -> bool {
        ALREADY_GONE_CODES.contains(&self.code.as_str())
    }

    /// Short text for reports
    pub fn reason(&self) -> String {
        if self.message.is_empty() {
            self.code.clone()
        } else {
            format!("{}: {}", self.code, self.message)
        }
    }
}

/// Current status of a submitted task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTaskStatus {
    pub state: TaskState,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub failed_count: u64,
    #[serde(default)]
    pub skip_count: u64,
    /// Item-level failures, when the service reports them
    #[serde(default)]
    pub failures: Vec<ItemFailure>,
}

impl BatchTaskStatus {
    pub fn pending() -> Self {
        Self::with_state(TaskState::Pending)
    }

    pub fn ok() -> Self {
        Self::with_state(TaskState::Ok)
    }

    pub fn failed() -> Self {
        Self::with_state(TaskState::Failed)
    }

    fn with_state(state: TaskState) -> Self {
        Self {
            state,
            success_count: 0,
            failed_count: 0,
            skip_count: 0,
            failures: Vec::new(),
        }
    }

    /// Failure detail for one file id
    pub fn failure_for(&self, file_id: &str) -> Option<&ItemFailure> {
        self.failures.iter().find(|f| f.file_id == file_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> BatchTaskItem {
        BatchTaskItem::from(&Entity::file(id, format!("{id}.txt"), 1, "-11"))
    }

    #[test]
    fn test_item_from_entity() {
        let entity = Entity::folder("9", "photos", "3");
        let item = BatchTaskItem::from(&entity);
        assert_eq!(item.file_id, "9");
        assert_eq!(item.file_name, "photos");
        assert!(item.is_folder);
        assert_eq!(item.src_parent_id, "3");
    }

    #[test]
    fn test_submission_rejects_empty() {
        let result = BatchTaskSubmission::new(BatchTaskKind::Delete, vec![], None);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_submission_target_rules() {
        assert!(BatchTaskSubmission::new(BatchTaskKind::Move, vec![item("1")], None).is_err());
        assert!(
            BatchTaskSubmission::new(BatchTaskKind::Delete, vec![item("1")], Some("2".into()))
                .is_err()
        );

        let copy =
            BatchTaskSubmission::new(BatchTaskKind::Copy, vec![item("1")], Some("2".into()))
                .unwrap();
        assert_eq!(copy.kind(), BatchTaskKind::Copy);
        assert_eq!(copy.target_folder_id(), Some("2"));
        assert_eq!(copy.items().len(), 1);
    }

    #[test]
    fn test_task_state_terminal() {
        assert!(!TaskState::Pending.is_terminal());
        assert!(TaskState::Ok.is_terminal());
        assert!(TaskState::Failed.is_terminal());
    }

    #[test]
    fn test_item_failure_already_gone() {
        let failure = ItemFailure {
            file_id: "1".into(),
            code: "FileNotFound".into(),
            message: String::new(),
        };
        assert!(failure.is_already_gone());
        assert_eq!(failure.reason(), "FileNotFound");

        let failure = ItemFailure {
            file_id: "1".into(),
            code: "PermissionDenied".into(),
            message: "read only".into(),
        };
        assert!(!failure.is_already_gone());
        assert_eq!(failure.reason(), "PermissionDenied: read only");
    }

    #[test]
    fn test_type_flags() {
        assert_eq!(BatchTaskKind::Delete.type_flag(), "DELETE");
        assert_eq!(BatchTaskKind::Move.type_flag(), "MOVE");
        assert_eq!(BatchTaskKind::Copy.type_flag(), "COPY");
    }
}
