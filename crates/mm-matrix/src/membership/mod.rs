//! Membership Mutations
//!
//! Single-cell and whole-column toggles, each followed by a row refresh and a
//! success notification.

pub mod coordinator;
pub mod in_flight;

pub use coordinator::MembershipCoordinator;
pub use in_flight::{CellClaim, InFlightCells};
