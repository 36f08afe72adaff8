//! Principal Aggregate
//!
//! User identities shown as matrix rows.

pub mod entity;

pub use entity::{GroupRef, Principal, PrincipalGroups};
