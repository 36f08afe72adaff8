//! Matrix Builder
//!
//! Assembles the column axis from the directory's group listing, the pinned
//! groups and (optionally) the groups the visible users already belong to.
//! The result is recomputed from scratch on every call.

use std::collections::HashSet;

use crate::group::entity::{ColumnOption, Group, PinnedGroup, AUTHENTICATED_USERS};
use crate::matrix::axis::{AxisVisibility, MatrixFilter};
use crate::principal::entity::Principal;

/// Build the matrix columns.
///
/// `groups` is the directory's (possibly query-filtered) group listing and the
/// only source of role metadata; `rows` supplies joined groups when
/// `filter.add_joined_groups` is set.
///
/// Pinned groups are merged first and win deduplication, then everything is
/// sorted by label together, so a pinned column is not guaranteed to lead.
pub fn build_columns(filter: &MatrixFilter, groups: &[Group], rows: &[Principal]) -> Vec<ColumnOption> {
    if !AxisVisibility::resolve(filter).show_columns {
        return Vec::new();
    }

    let mut seed: Vec<Group> = if filter.seeds_from_group_listing() {
        groups.to_vec()
    } else {
        Vec::new()
    };

    if filter.add_joined_groups {
        seed.extend(
            rows.iter()
                .flat_map(|row| row.groups.items.iter().cloned())
                .map(Group::from),
        );
    }

    let mut options: Vec<PinnedGroup> = filter.groups_filter.clone();
    options.extend(seed.iter().map(PinnedGroup::from));

    let mut seen = HashSet::new();
    options.retain(|option| seen.insert(option.value.clone()));
    options.retain(|option| option.value != AUTHENTICATED_USERS);

    // Stable: equal labels keep their merge order.
    options.sort_by_cached_key(|option| option.label.to_uppercase());

    options
        .into_iter()
        .map(|option| ColumnOption {
            roles: roles_of(groups, &option.value),
            value: option.value,
            label: option.label,
        })
        .collect()
}

/// Roles of `group_id` in the directory listing; empty when it is not listed.
fn roles_of(groups: &[Group], group_id: &str) -> Vec<String> {
    groups
        .iter()
        .find(|group| group.id == group_id)
        .map(|group| group.roles.clone())
        .unwrap_or_default()
}
