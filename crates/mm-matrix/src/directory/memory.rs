//! In-memory directory (for testing/development)

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::{Directory, MembershipPatch, PrincipalQuery};
use crate::group::entity::Group;
use crate::principal::entity::{GroupRef, Principal};
use crate::shared::error::{MatrixError, Result};

#[derive(Default)]
pub struct InMemoryDirectory {
    principals: RwLock<Vec<Principal>>,
    groups: RwLock<Vec<Group>>,
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_principal(self, principal: Principal) -> Self {
        self.insert_principal(principal);
        self
    }

    pub fn with_group(self, group: Group) -> Self {
        self.insert_group(group);
        self
    }

    /// Insert or replace by id
    pub fn insert_principal(&self, principal: Principal) {
        let mut principals = self.principals.write();
        match principals.iter_mut().find(|p| p.id == principal.id) {
            Some(existing) => *existing = principal,
            None => principals.push(principal),
        }
    }

    /// Insert or replace by id
    pub fn insert_group(&self, group: Group) {
        let mut groups = self.groups.write();
        match groups.iter_mut().find(|g| g.id == group.id) {
            Some(existing) => *existing = group,
            None => groups.push(group),
        }
    }

    /// Current state of one principal, bypassing search
    pub fn principal(&self, id: &str) -> Option<Principal> {
        self.principals.read().iter().find(|p| p.id == id).cloned()
    }

    /// Demo data for development servers
    pub fn seeded() -> Self {
        let editors = GroupRef::new("editors").with_title("Editors");
        let reviewers = GroupRef::new("reviewers").with_title("Reviewers");
        let administrators = GroupRef::new("Administrators").with_title("Administrators");

        Self::new()
            .with_group(Group::new("Administrators").with_title("Administrators").with_role("Manager"))
            .with_group(Group::new("Site Administrators").with_title("Site Administrators").with_role("Site Administrator"))
            .with_group(Group::new("editors").with_title("Editors").with_role("Editor"))
            .with_group(Group::new("reviewers").with_title("Reviewers").with_role("Reviewer"))
            .with_group(Group::new("AuthenticatedUsers").with_title("Authenticated Users (Virtual Group)"))
            .with_principal(
                Principal::new("admin")
                    .with_fullname("Site Admin")
                    .with_role("Manager")
                    .with_group(administrators),
            )
            .with_principal(
                Principal::new("alice")
                    .with_fullname("Alice Liddell")
                    .with_role("Member")
                    .with_group(editors.clone()),
            )
            .with_principal(
                Principal::new("bob")
                    .with_fullname("Bob Marley")
                    .with_role("Member")
                    .with_group(editors)
                    .with_group(reviewers),
            )
            .with_principal(Principal::new("carol").with_role("Member"))
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn fetch_principal(&self, id: &str) -> Result<Principal> {
        self.principal(id)
            .ok_or_else(|| MatrixError::not_found("Principal", id))
    }

    async fn list_principals(&self, query: &PrincipalQuery) -> Result<Vec<Principal>> {
        let search = query.search.to_lowercase();
        let principals = self.principals.read();

        let matches = principals
            .iter()
            .filter(|p| {
                search.is_empty()
                    || contains_ci(&p.id, &search)
                    || p.fullname.as_deref().is_some_and(|name| contains_ci(name, &search))
            })
            .filter(|p| {
                query.groups_filter.is_empty()
                    || query.groups_filter.iter().any(|g| p.is_member_of(g))
            });

        let result: Vec<Principal> = if query.limit == 0 {
            matches.cloned().collect()
        } else {
            matches.take(query.limit).cloned().collect()
        };

        Ok(result)
    }

    async fn list_groups(&self, search: &str) -> Result<Vec<Group>> {
        let search = search.to_lowercase();
        Ok(self
            .groups
            .read()
            .iter()
            .filter(|g| {
                search.is_empty()
                    || contains_ci(&g.id, &search)
                    || g.title.as_deref().is_some_and(|title| contains_ci(title, &search))
            })
            .cloned()
            .collect())
    }

    async fn set_group_members(&self, group_id: &str, members: &MembershipPatch) -> Result<()> {
        let group_ref = {
            let groups = self.groups.read();
            let group = groups
                .iter()
                .find(|g| g.id == group_id)
                .ok_or_else(|| MatrixError::not_found("Group", group_id))?;
            GroupRef {
                id: group.id.clone(),
                title: group.title.clone(),
            }
        };

        let mut principals = self.principals.write();

        // Validate the whole patch before touching anything.
        if let Some(unknown) = members
            .keys()
            .find(|id| !principals.iter().any(|p| &p.id == *id))
        {
            return Err(MatrixError::not_found("Principal", unknown.as_str()));
        }

        for principal in principals.iter_mut() {
            match members.get(&principal.id) {
                Some(true) => {
                    principal.join(group_ref.clone());
                }
                Some(false) => {
                    principal.leave(group_id);
                }
                None => {}
            }
        }

        debug!(group_id, changes = members.len(), "Applied membership patch");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(search: &str, groups: &[&str], limit: usize) -> PrincipalQuery {
        PrincipalQuery {
            search: search.to_string(),
            groups_filter: groups.iter().map(|g| g.to_string()).collect(),
            limit,
        }
    }

    #[tokio::test]
    async fn test_search_matches_id_and_fullname() {
        let dir = InMemoryDirectory::seeded();
        let by_name = dir.list_principals(&query("liddell", &[], 0)).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "alice");

        let by_id = dir.list_principals(&query("CAR", &[], 0)).await.unwrap();
        assert_eq!(by_id[0].id, "carol");
    }

    #[tokio::test]
    async fn test_groups_filter_and_limit() {
        let dir = InMemoryDirectory::seeded();
        let editors = dir.list_principals(&query("", &["editors"], 0)).await.unwrap();
        let ids: Vec<_> = editors.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob"]);

        let limited = dir.list_principals(&query("", &[], 2)).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_group_search() {
        let dir = InMemoryDirectory::seeded();
        assert_eq!(dir.list_groups("").await.unwrap().len(), 5);
        let admins = dir.list_groups("admin").await.unwrap();
        assert_eq!(admins.len(), 2);
    }

    #[tokio::test]
    async fn test_patch_adds_and_removes() {
        let dir = InMemoryDirectory::seeded();
        let patch = MembershipPatch::from([
            ("carol".to_string(), true),
            ("alice".to_string(), false),
        ]);
        dir.set_group_members("editors", &patch).await.unwrap();

        let carol = dir.principal("carol").unwrap();
        assert!(carol.is_member_of("editors"));
        assert_eq!(carol.groups.items[0].title.as_deref(), Some("Editors"));
        assert!(!dir.principal("alice").unwrap().is_member_of("editors"));
    }

    #[tokio::test]
    async fn test_patch_with_unknown_ids_changes_nothing() {
        let dir = InMemoryDirectory::seeded();

        let err = dir
            .set_group_members("nope", &MembershipPatch::from([("alice".to_string(), true)]))
            .await
            .unwrap_err();
        assert!(matches!(err, MatrixError::NotFound { .. }));

        let patch = MembershipPatch::from([
            ("carol".to_string(), true),
            ("mallory".to_string(), true),
        ]);
        assert!(dir.set_group_members("editors", &patch).await.is_err());
        assert!(!dir.principal("carol").unwrap().is_member_of("editors"));
    }

    #[tokio::test]
    async fn test_fetch_unknown_principal() {
        let dir = InMemoryDirectory::new();
        assert!(matches!(
            dir.fetch_principal("ghost").await,
            Err(MatrixError::NotFound { .. })
        ));
    }
}
