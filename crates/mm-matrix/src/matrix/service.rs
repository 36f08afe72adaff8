//! Matrix Service
//!
//! Stateless entry point shared by the HTTP API and matrix sessions: resolves
//! the acting principal, fetches the gated axes, assembles views and runs
//! authorized membership toggles.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::directory::{Directory, PrincipalQuery};
use crate::group::entity::Group;
use crate::matrix::axis::{AxisVisibility, MatrixFilter};
use crate::matrix::columns::build_columns;
use crate::matrix::rows::{sort_rows, RowPager, DEFAULT_PAGE_SIZE};
use crate::matrix::view::MatrixView;
use crate::membership::MembershipCoordinator;
use crate::principal::entity::Principal;
use crate::shared::authorization::MembershipPolicy;
use crate::shared::debounce::DEFAULT_DEBOUNCE;
use crate::shared::error::{MatrixError, Result};
use crate::shared::notification::Notifier;
use crate::shared::session::SessionVerifier;

/// Default cap on rows fetched, in pages
pub const DEFAULT_MAX_PAGES: usize = 20;

/// The administrator operating the matrix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// Empty when the session token could not be read
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    pub is_manager: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixSettings {
    /// Row page increment
    pub page_size: usize,
    /// Quiet period before a search-triggered fetch
    pub debounce: Duration,
    /// Upper bound on the row limit, in pages
    pub max_pages: usize,
}

impl MatrixSettings {
    /// Row limit for a requested value: one page by default, at most
    /// `max_pages` pages.
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        let max = self.page_size.saturating_mul(self.max_pages.max(1));
        requested
            .filter(|limit| *limit > 0)
            .unwrap_or(self.page_size)
            .min(max)
    }
}

impl Default for MatrixSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce: DEFAULT_DEBOUNCE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

#[derive(Clone)]
pub struct MatrixService {
    directory: Arc<dyn Directory>,
    policy: Arc<dyn MembershipPolicy>,
    coordinator: Arc<MembershipCoordinator>,
    sessions: SessionVerifier,
    settings: MatrixSettings,
}

impl MatrixService {
    pub fn new(
        directory: Arc<dyn Directory>,
        policy: Arc<dyn MembershipPolicy>,
        notifier: Arc<dyn Notifier>,
        settings: MatrixSettings,
    ) -> Self {
        let coordinator = Arc::new(MembershipCoordinator::new(directory.clone(), notifier));
        Self {
            directory,
            policy,
            coordinator,
            sessions: SessionVerifier::disabled(),
            settings,
        }
    }

    /// Accept session tokens verified by `sessions`
    pub fn with_session_verifier(mut self, sessions: SessionVerifier) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn settings(&self) -> MatrixSettings {
        self.settings
    }

    pub fn coordinator(&self) -> &MembershipCoordinator {
        &self.coordinator
    }

    pub fn pager(&self) -> RowPager {
        RowPager::new(self.settings.page_size)
    }

    /// Identify the caller from a session token.
    ///
    /// Never fails: an unverifiable token or unknown principal yields an
    /// actor that is not a manager.
    pub async fn resolve_actor(&self, token: Option<&str>) -> Actor {
        let id = self.sessions.actor_id(token);
        let principal = if id.is_empty() {
            None
        } else {
            match self.directory.fetch_principal(&id).await {
                Ok(principal) => Some(principal),
                Err(e) => {
                    warn!(actor_id = %id, error = %e, "Could not load acting principal");
                    None
                }
            }
        };

        let is_manager = self.policy.is_manager(principal.as_ref());
        Actor {
            id,
            principal,
            is_manager,
        }
    }

    /// User search matching the filter
    pub fn row_query(&self, filter: &MatrixFilter, limit: usize) -> PrincipalQuery {
        PrincipalQuery {
            search: filter.query_user.clone(),
            groups_filter: filter.group_filter_ids(),
            limit,
        }
    }

    /// Sorted rows for the filter, or none when the row axis is hidden.
    pub async fn try_fetch_rows(&self, filter: &MatrixFilter, limit: usize) -> Result<Vec<Principal>> {
        if !AxisVisibility::resolve(filter).show_rows {
            return Ok(Vec::new());
        }

        let mut rows = self.directory.list_principals(&self.row_query(filter, limit)).await?;
        sort_rows(&mut rows);
        Ok(rows)
    }

    /// Group listing for the filter, or none when the column axis is hidden.
    pub async fn try_fetch_groups(&self, filter: &MatrixFilter) -> Result<Vec<Group>> {
        if !AxisVisibility::resolve(filter).show_columns {
            return Ok(Vec::new());
        }
        self.directory.list_groups(&filter.query_group).await
    }

    /// Like [`try_fetch_rows`](Self::try_fetch_rows), showing no rows when the
    /// listing fails.
    pub async fn fetch_rows(&self, filter: &MatrixFilter, limit: usize) -> Vec<Principal> {
        match self.try_fetch_rows(filter, limit).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, search = %filter.query_user, "User listing failed, showing no rows");
                Vec::new()
            }
        }
    }

    pub async fn fetch_groups(&self, filter: &MatrixFilter) -> Vec<Group> {
        match self.try_fetch_groups(filter).await {
            Ok(groups) => groups,
            Err(e) => {
                warn!(error = %e, search = %filter.query_group, "Group listing failed, showing no groups");
                Vec::new()
            }
        }
    }

    pub fn assemble(
        &self,
        filter: &MatrixFilter,
        groups: &[Group],
        rows: &[Principal],
        actor: &Actor,
    ) -> MatrixView {
        MatrixView::assemble(filter, groups, rows, &self.pager(), |column| {
            self.policy.can_assign_group(actor.is_manager, column)
        })
    }

    /// Fetch both axes concurrently and assemble the grid.
    pub async fn snapshot(&self, filter: &MatrixFilter, limit: usize, actor: &Actor) -> MatrixView {
        let (rows, groups) = tokio::join!(self.fetch_rows(filter, limit), self.fetch_groups(filter));
        self.assemble(filter, &groups, &rows, actor)
    }

    /// Check that the actor is identified and `group_id` is a current column
    /// they may edit.
    pub fn authorize(
        &self,
        actor: &Actor,
        filter: &MatrixFilter,
        groups: &[Group],
        rows: &[Principal],
        group_id: &str,
    ) -> Result<()> {
        if actor.id.is_empty() {
            return Err(MatrixError::forbidden(
                "Changing memberships requires a valid session",
            ));
        }

        let rows: &[Principal] = if AxisVisibility::resolve(filter).show_rows {
            rows
        } else {
            &[]
        };
        let columns = build_columns(filter, groups, rows);
        let column = columns
            .iter()
            .find(|column| column.value == group_id)
            .ok_or_else(|| {
                MatrixError::validation(format!("Group {} is not a column of this matrix", group_id))
            })?;

        if !self.policy.can_assign_group(actor.is_manager, column) {
            debug!(actor_id = %actor.id, group_id, "Column is not assignable by actor");
            return Err(MatrixError::forbidden(format!(
                "Not allowed to change membership of {}",
                group_id
            )));
        }

        Ok(())
    }

    /// Toggle one cell and return the refreshed grid.
    pub async fn toggle_cell(
        &self,
        actor: &Actor,
        filter: &MatrixFilter,
        limit: usize,
        group_id: &str,
        principal_id: &str,
        checked: bool,
    ) -> Result<MatrixView> {
        let (rows, groups) = tokio::try_join!(
            self.try_fetch_rows(filter, limit),
            self.try_fetch_groups(filter)
        )?;
        self.authorize(actor, filter, &groups, &rows, group_id)?;

        let rows = self
            .coordinator
            .toggle_cell(group_id, principal_id, checked, &self.row_query(filter, limit))
            .await?;
        Ok(self.assemble(filter, &groups, &rows, actor))
    }

    /// Toggle a whole column and return the refreshed grid.
    ///
    /// Without explicit ids, every row currently visible for the filter is
    /// toggled.
    pub async fn toggle_column(
        &self,
        actor: &Actor,
        filter: &MatrixFilter,
        limit: usize,
        group_id: &str,
        principal_ids: Option<&[String]>,
        checked: bool,
    ) -> Result<MatrixView> {
        let (rows, groups) = tokio::try_join!(
            self.try_fetch_rows(filter, limit),
            self.try_fetch_groups(filter)
        )?;
        self.authorize(actor, filter, &groups, &rows, group_id)?;

        let ids: Vec<String> = match principal_ids {
            Some(ids) => ids.to_vec(),
            None => rows.iter().map(|row| row.id.clone()).collect(),
        };

        let rows = self
            .coordinator
            .toggle_column(group_id, &ids, checked, &self.row_query(filter, limit))
            .await?;
        Ok(self.assemble(filter, &groups, &rows, actor))
    }
}
