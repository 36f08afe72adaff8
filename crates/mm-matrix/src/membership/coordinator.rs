//! Mutation Coordinator
//!
//! Applies membership edits through the directory, then re-reads the rows and
//! tells the user. Every step runs only after the previous one succeeded.

use std::sync::Arc;

use tracing::{info, warn};

use super::in_flight::{CellClaim, InFlightCells};
use crate::directory::{Directory, MembershipPatch, PrincipalQuery};
use crate::matrix::rows::sort_rows;
use crate::principal::entity::Principal;
use crate::shared::error::Result;
use crate::shared::notification::{Notifier, MEMBERSHIP_UPDATED, SUCCESS_TITLE};

pub struct MembershipCoordinator {
    directory: Arc<dyn Directory>,
    notifier: Arc<dyn Notifier>,
    in_flight: InFlightCells,
}

impl MembershipCoordinator {
    pub fn new(directory: Arc<dyn Directory>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            directory,
            notifier,
            in_flight: InFlightCells::new(),
        }
    }

    pub fn in_flight(&self) -> &InFlightCells {
        &self.in_flight
    }

    /// Set one principal's membership in one group.
    ///
    /// `refresh` is the row query to re-run after the write; the sorted rows
    /// are returned.
    pub async fn toggle_cell(
        &self,
        group_id: &str,
        principal_id: &str,
        checked: bool,
        refresh: &PrincipalQuery,
    ) -> Result<Vec<Principal>> {
        let claim = self.in_flight.claim(group_id, [principal_id])?;
        let patch = MembershipPatch::from([(principal_id.to_string(), checked)]);
        self.apply(claim, group_id, &patch, refresh).await
    }

    /// Set the membership of every listed principal in one group with a
    /// single write.
    pub async fn toggle_column(
        &self,
        group_id: &str,
        principal_ids: &[String],
        checked: bool,
        refresh: &PrincipalQuery,
    ) -> Result<Vec<Principal>> {
        let claim = self
            .in_flight
            .claim(group_id, principal_ids.iter().map(String::as_str))?;
        let patch: MembershipPatch = principal_ids
            .iter()
            .map(|id| (id.clone(), checked))
            .collect();
        self.apply(claim, group_id, &patch, refresh).await
    }

    async fn apply(
        &self,
        _claim: CellClaim,
        group_id: &str,
        patch: &MembershipPatch,
        refresh: &PrincipalQuery,
    ) -> Result<Vec<Principal>> {
        if let Err(e) = self.directory.set_group_members(group_id, patch).await {
            warn!(group_id, error = %e, "Membership write failed");
            return Err(e);
        }

        info!(group_id, changes = patch.len(), "Membership updated");

        let mut rows = self.directory.list_principals(refresh).await?;
        sort_rows(&mut rows);

        self.notifier
            .notify_success(SUCCESS_TITLE, MEMBERSHIP_UPDATED)
            .await;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::shared::error::MatrixError;
    use crate::shared::notification::NoOpNotifier;

    fn coordinator(directory: Arc<InMemoryDirectory>) -> MembershipCoordinator {
        MembershipCoordinator::new(directory, Arc::new(NoOpNotifier))
    }

    #[tokio::test]
    async fn test_toggle_cell_returns_refreshed_rows() {
        let directory = Arc::new(InMemoryDirectory::seeded());
        let coordinator = coordinator(directory.clone());

        let rows = coordinator
            .toggle_cell("reviewers", "carol", true, &PrincipalQuery::default())
            .await
            .unwrap();

        let carol = rows.iter().find(|p| p.id == "carol").unwrap();
        assert!(carol.is_member_of("reviewers"));
        assert!(coordinator.in_flight().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_releases_claim() {
        let directory = Arc::new(InMemoryDirectory::seeded());
        let coordinator = coordinator(directory);

        let err = coordinator
            .toggle_cell("missing", "carol", true, &PrincipalQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MatrixError::NotFound { .. }));
        assert!(coordinator.in_flight().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_column_writes_every_listed_principal() {
        let directory = Arc::new(InMemoryDirectory::seeded());
        let coordinator = coordinator(directory.clone());
        let ids = vec!["alice".to_string(), "bob".to_string()];

        coordinator
            .toggle_column("editors", &ids, false, &PrincipalQuery::default())
            .await
            .unwrap();

        assert!(!directory.principal("alice").unwrap().is_member_of("editors"));
        assert!(!directory.principal("bob").unwrap().is_member_of("editors"));
    }
}
