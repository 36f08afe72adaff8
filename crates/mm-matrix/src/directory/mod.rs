//! Directory Service
//!
//! The remote store of users and groups. The matrix reads rows and columns
//! from it and writes membership changes through it; it never caches beyond
//! the last applied response.

pub mod memory;
pub mod rest;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::group::entity::Group;
use crate::principal::entity::Principal;
use crate::shared::error::Result;

pub use memory::InMemoryDirectory;
pub use rest::RestDirectory;

/// Membership changes for one group: principal id -> member or not
pub type MembershipPatch = BTreeMap<String, bool>;

/// User search parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalQuery {
    pub search: String,
    /// Restrict to members of any of these groups
    pub groups_filter: Vec<String>,
    /// Maximum rows; 0 means unbounded
    pub limit: usize,
}

#[async_trait]
pub trait Directory: Send + Sync {
    async fn fetch_principal(&self, id: &str) -> Result<Principal>;

    async fn list_principals(&self, query: &PrincipalQuery) -> Result<Vec<Principal>>;

    /// Groups matching `search`; an empty search lists every group.
    async fn list_groups(&self, search: &str) -> Result<Vec<Group>>;

    async fn set_group_members(&self, group_id: &str, members: &MembershipPatch) -> Result<()>;
}
