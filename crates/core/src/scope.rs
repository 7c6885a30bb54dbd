//! Namespace scope selection
//!
//! Every remote call targets either the personal drive or a shared family
//! drive. The scope decides the root folder id and which routes the adapter
//! uses.

use serde::{Deserialize, Serialize};

/// Root folder id of the personal namespace
pub const PERSONAL_ROOT_ID: &str = "-11";

/// Root folder id of a family namespace
pub const FAMILY_ROOT_ID: &str = "";

/// Which remote namespace an operation targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// The account's own drive
    #[default]
    Personal,
    /// A shared family drive identified by its family id
    Family(i64),
}

impl Scope {
    /// Build a scope from a family id; zero or negative ids mean personal
    pub fn from_family_id(family_id: i64) -> Self {
        if family_id > 0 {
            Scope::Family(family_id)
        } else {
            Scope::Personal
        }
    }

    /// Id of the namespace root folder
    pub fn root_id(&self) -> &'static str {
        match self {
            Scope::Personal => PERSONAL_ROOT_ID,
            Scope::Family(_) => FAMILY_ROOT_ID,
        }
    }

    /// Family id, if this is a family scope
    pub fn family_id(&self) -> Option<i64> {
        match self {
            Scope::Personal => None,
            Scope::Family(id) => Some(*id),
        }
    }

    pub fn is_family(&self) -> bool {
        matches!(self, Scope::Family(_))
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Personal => write!(f, "personal"),
            Scope::Family(id) => write!(f, "family:{id}"),
        }
    }
}
