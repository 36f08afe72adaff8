//! Matrix Session
//!
//! One administrator's live matrix. Holds the filter, the paging limit and
//! the last applied rows and groups. Search-triggered fetches are debounced
//! per axis, and a response is applied only if no newer request was issued
//! on that axis in the meantime.

use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;

use crate::group::entity::Group;
use crate::matrix::axis::{AxisVisibility, MatrixFilter};
use crate::matrix::rows::RowPager;
use crate::matrix::service::{Actor, MatrixService};
use crate::matrix::view::MatrixView;
use crate::principal::entity::Principal;
use crate::shared::debounce::Debouncer;
use crate::shared::error::Result;
use crate::shared::sequence::{RequestSequencer, RequestTicket};

/// What happened to one refresh request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The axis is gated off; its cache was cleared without fetching.
    Hidden,
    /// A later refresh arrived within the debounce window.
    Superseded,
    /// A newer request was issued while this one was in flight.
    Stale,
    /// The response was applied; holds the number of entries.
    Applied(usize),
}

/// Debouncer and request sequence for one axis
#[derive(Debug)]
struct AxisFetcher {
    debouncer: Debouncer,
    sequencer: RequestSequencer,
}

impl AxisFetcher {
    fn new(window: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(window),
            sequencer: RequestSequencer::new(),
        }
    }
}

#[derive(Debug)]
struct SessionState {
    filter: MatrixFilter,
    pager: RowPager,
    rows: Vec<Principal>,
    groups: Vec<Group>,
}

pub struct MatrixSession {
    service: MatrixService,
    actor: Actor,
    state: RwLock<SessionState>,
    rows: AxisFetcher,
    groups: AxisFetcher,
}

impl MatrixSession {
    pub fn new(service: MatrixService, actor: Actor, filter: MatrixFilter) -> Self {
        let settings = service.settings();
        Self {
            state: RwLock::new(SessionState {
                filter,
                pager: service.pager(),
                rows: Vec::new(),
                groups: Vec::new(),
            }),
            rows: AxisFetcher::new(settings.debounce),
            groups: AxisFetcher::new(settings.debounce),
            service,
            actor,
        }
    }

    /// Start a session for the holder of `token`.
    pub async fn open(service: MatrixService, token: Option<&str>, filter: MatrixFilter) -> Self {
        let actor = service.resolve_actor(token).await;
        Self::new(service, actor, filter)
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn filter(&self) -> MatrixFilter {
        self.state.read().filter.clone()
    }

    pub fn limit(&self) -> usize {
        self.state.read().pager.limit()
    }

    /// Replace the filter. Call the refresh operations to fetch.
    pub fn set_filter(&self, filter: MatrixFilter) {
        self.state.write().filter = filter;
    }

    /// Re-fetch the user axis.
    pub async fn refresh_rows(&self) -> FetchOutcome {
        if !AxisVisibility::resolve(&self.filter()).show_rows {
            self.rows.sequencer.issue();
            self.state.write().rows.clear();
            return FetchOutcome::Hidden;
        }

        if !self.rows.debouncer.settle().await {
            debug!("User fetch superseded during debounce");
            return FetchOutcome::Superseded;
        }

        let (filter, limit) = {
            let state = self.state.read();
            (state.filter.clone(), state.pager.limit())
        };
        let ticket = self.rows.sequencer.issue();
        let rows = self.service.fetch_rows(&filter, limit).await;

        self.apply_rows(ticket, rows)
    }

    /// Re-fetch the group axis.
    pub async fn refresh_groups(&self) -> FetchOutcome {
        if !AxisVisibility::resolve(&self.filter()).show_columns {
            self.groups.sequencer.issue();
            self.state.write().groups.clear();
            return FetchOutcome::Hidden;
        }

        if !self.groups.debouncer.settle().await {
            debug!("Group fetch superseded during debounce");
            return FetchOutcome::Superseded;
        }

        let filter = self.filter();
        let ticket = self.groups.sequencer.issue();
        let groups = self.service.fetch_groups(&filter).await;

        let mut state = self.state.write();
        if !self.groups.sequencer.is_current(ticket) {
            debug!(ticket = ticket.number(), "Discarding stale group response");
            return FetchOutcome::Stale;
        }
        let count = groups.len();
        state.groups = groups;
        FetchOutcome::Applied(count)
    }

    /// Re-fetch both axes concurrently.
    pub async fn refresh(&self) -> (FetchOutcome, FetchOutcome) {
        tokio::join!(self.refresh_rows(), self.refresh_groups())
    }

    /// Grow the row limit by one page and re-fetch the users.
    pub async fn load_more(&self) -> FetchOutcome {
        let limit = self.state.write().pager.load_more();
        debug!(limit, "Loading more users");
        self.refresh_rows().await
    }

    /// The grid for the current cached state
    pub fn view(&self) -> MatrixView {
        let state = self.state.read();
        self.service
            .assemble(&state.filter, &state.groups, &state.rows, &self.actor)
    }

    pub async fn toggle_cell(&self, group_id: &str, principal_id: &str, checked: bool) -> Result<MatrixView> {
        let (filter, limit) = self.authorize(group_id)?;
        let ticket = self.rows.sequencer.issue();

        let rows = self
            .service
            .coordinator()
            .toggle_cell(group_id, principal_id, checked, &self.service.row_query(&filter, limit))
            .await?;

        self.apply_rows(ticket, rows);
        Ok(self.view())
    }

    /// Toggle `group_id` for every row currently shown.
    pub async fn toggle_column(&self, group_id: &str, checked: bool) -> Result<MatrixView> {
        let (filter, limit) = self.authorize(group_id)?;
        let ids: Vec<String> = self.view().row_ids();
        let ticket = self.rows.sequencer.issue();

        let rows = self
            .service
            .coordinator()
            .toggle_column(group_id, &ids, checked, &self.service.row_query(&filter, limit))
            .await?;

        self.apply_rows(ticket, rows);
        Ok(self.view())
    }

    fn authorize(&self, group_id: &str) -> Result<(MatrixFilter, usize)> {
        let state = self.state.read();
        self.service
            .authorize(&self.actor, &state.filter, &state.groups, &state.rows, group_id)?;
        Ok((state.filter.clone(), state.pager.limit()))
    }

    fn apply_rows(&self, ticket: RequestTicket, rows: Vec<Principal>) -> FetchOutcome {
        let mut state = self.state.write();
        if !self.rows.sequencer.is_current(ticket) {
            debug!(ticket = ticket.number(), "Discarding stale user response");
            return FetchOutcome::Stale;
        }
        let count = rows.len();
        state.rows = rows;
        FetchOutcome::Applied(count)
    }
}
