//! Group Entity
//!
//! Groups are column candidates. `ColumnOption` is the derived, render-ready
//! column; `PinnedGroup` is a column the caller forces into the matrix.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::principal::entity::GroupRef;

/// Pseudo-group holding every logged-in user. Never a matrix column.
pub const AUTHENTICATED_USERS: &str = "AuthenticatedUsers";

/// Group entity as reported by the directory service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Group {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Roles granted to members, in directory order
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Group {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            roles: vec![],
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Title, or the id when the title is missing or empty
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or(&self.id)
    }
}

/// Joined-group references carry no roles.
impl From<GroupRef> for Group {
    fn from(group: GroupRef) -> Self {
        Self {
            id: group.id,
            title: group.title,
            roles: vec![],
        }
    }
}

/// A column forced into the matrix regardless of the group query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PinnedGroup {
    pub value: String,
    pub label: String,
}

impl PinnedGroup {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

impl From<&Group> for PinnedGroup {
    fn from(group: &Group) -> Self {
        Self::new(group.id.clone(), group.label())
    }
}

/// A matrix column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ColumnOption {
    /// Group id
    pub value: String,
    pub label: String,
    pub roles: Vec<String>,
}

impl ColumnOption {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
