//! Authorization Policy
//!
//! Decides who counts as a manager and which columns they may edit. The
//! matrix only carries column identity and roles; the decision lives here.

use crate::group::entity::ColumnOption;
use crate::principal::entity::Principal;

pub const MANAGER_ROLE: &str = "Manager";

/// Capability checks for membership edits
pub trait MembershipPolicy: Send + Sync {
    /// Whether the acting principal is a manager. `None` means the actor
    /// could not be resolved.
    fn is_manager(&self, principal: Option<&Principal>) -> bool;

    /// Whether members of `column` may be toggled by the actor.
    fn can_assign_group(&self, is_manager: bool, column: &ColumnOption) -> bool;
}

/// Role-based policy: managers may edit every column, everybody else only
/// columns that do not grant the manager role.
#[derive(Debug, Clone)]
pub struct RolePolicy {
    manager_role: String,
}

impl RolePolicy {
    pub fn new(manager_role: impl Into<String>) -> Self {
        Self {
            manager_role: manager_role.into(),
        }
    }
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self::new(MANAGER_ROLE)
    }
}

impl MembershipPolicy for RolePolicy {
    fn is_manager(&self, principal: Option<&Principal>) -> bool {
        principal.is_some_and(|p| p.has_role(&self.manager_role))
    }

    fn can_assign_group(&self, is_manager: bool, column: &ColumnOption) -> bool {
        is_manager || !column.has_role(&self.manager_role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(roles: &[&str]) -> ColumnOption {
        ColumnOption {
            value: "g".to_string(),
            label: "G".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_manager_detection() {
        let policy = RolePolicy::default();
        assert!(policy.is_manager(Some(&Principal::new("admin").with_role("Manager"))));
        assert!(!policy.is_manager(Some(&Principal::new("ed").with_role("Editor"))));
        assert!(!policy.is_manager(None));
    }

    #[test]
    fn test_only_managers_assign_manager_groups() {
        let policy = RolePolicy::default();
        let administrators = column(&["Manager", "Authenticated"]);
        let editors = column(&["Editor"]);

        assert!(policy.can_assign_group(true, &administrators));
        assert!(!policy.can_assign_group(false, &administrators));
        assert!(policy.can_assign_group(false, &editors));
        assert!(policy.can_assign_group(false, &column(&[])));
    }

    #[test]
    fn test_custom_manager_role() {
        let policy = RolePolicy::new("Site Administrator");
        let principal = Principal::new("sa").with_role("Site Administrator");
        assert!(policy.is_manager(Some(&principal)));
        assert!(!policy.can_assign_group(false, &column(&["Site Administrator"])));
    }
}
