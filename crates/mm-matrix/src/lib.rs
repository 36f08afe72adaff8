//! Membership Matrix
//!
//! Users as rows, groups as columns, one membership flag per cell:
//! - Axis gating for large directories (no unfiltered listings)
//! - Column assembly from group listings, pinned groups and joined groups
//! - Single-cell and whole-column membership toggles with refresh and
//!   notification
//! - Debounced, sequence-checked fetches for live sessions
//!
//! ## Module Organization (Aggregate-based)
//!
//! - `principal`, `group` - Domain entities
//! - `directory` - Directory service contract and adapters
//! - `matrix` - Axis resolver, column builder, view, service and API
//! - `membership` - Mutation coordinator

// Core aggregates
pub mod principal;
pub mod group;

// Directory access
pub mod directory;

// Matrix and mutations
pub mod matrix;
pub mod membership;

// Shared infrastructure
pub mod shared;

pub use principal::{GroupRef, Principal, PrincipalGroups};
pub use group::{ColumnOption, Group, PinnedGroup, AUTHENTICATED_USERS};
pub use directory::{Directory, InMemoryDirectory, MembershipPatch, PrincipalQuery, RestDirectory};
pub use matrix::{
    build_columns, health_router, matrix_router, sort_rows, Actor, AxisVisibility, FetchOutcome,
    MatrixFilter, MatrixService, MatrixSession, MatrixSettings, MatrixState, MatrixView, RowPager,
};
pub use membership::{InFlightCells, MembershipCoordinator};
pub use shared::{
    MatrixError, MembershipPolicy, NoOpNotifier, Notifier, Result, RolePolicy, SessionVerifier,
    TracingNotifier,
};
