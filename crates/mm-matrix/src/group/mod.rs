//! Group Aggregate
//!
//! Groups and the column shapes derived from them.

pub mod entity;

pub use entity::{ColumnOption, Group, PinnedGroup, AUTHENTICATED_USERS};
