//! Axis Resolver
//!
//! Decides whether the row axis (users) and the column axis (groups) are
//! populated at all. Large directories are never listed without a query of at
//! least two characters or an explicit pin.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::group::entity::PinnedGroup;

/// Shortest query that triggers a search on a large directory.
pub const MIN_QUERY_CHARS: usize = 2;

/// Whether `query` is long enough to search a large directory with.
pub fn is_searchable(query: &str) -> bool {
    query.chars().count() >= MIN_QUERY_CHARS
}

/// Everything that shapes the matrix axes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct MatrixFilter {
    /// Search over users (rows)
    pub query_user: String,

    /// Search over groups (columns)
    pub query_group: String,

    /// Pinned columns; rows are restricted to their members
    pub groups_filter: Vec<PinnedGroup>,

    /// Also show groups joined by the visible users
    pub add_joined_groups: bool,

    /// The directory has too many users to list unfiltered
    pub many_users: bool,

    /// The directory has too many groups to list unfiltered
    pub many_groups: bool,
}

impl MatrixFilter {
    pub fn has_pins(&self) -> bool {
        !self.groups_filter.is_empty()
    }

    /// Ids of the pinned groups, as sent to the directory's user search
    pub fn group_filter_ids(&self) -> Vec<String> {
        self.groups_filter.iter().map(|g| g.value.clone()).collect()
    }

    /// Whether the directory's group listing seeds the column set.
    ///
    /// False when the directory is large and the group query is too short;
    /// columns then come only from pins and joined groups.
    pub fn seeds_from_group_listing(&self) -> bool {
        !self.many_groups || is_searchable(&self.query_group)
    }
}

/// Which axes are populated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AxisVisibility {
    pub show_rows: bool,
    pub show_columns: bool,
}

impl AxisVisibility {
    pub fn resolve(filter: &MatrixFilter) -> Self {
        let show_rows = !filter.many_users
            || (filter.many_users && is_searchable(&filter.query_user))
            || (filter.many_users && filter.has_pins());

        let show_columns = !filter.many_groups
            || (filter.many_groups && is_searchable(&filter.query_group))
            || filter.has_pins()
            || filter.add_joined_groups;

        tracing::debug!(show_rows, show_columns, "Resolved matrix axes");

        Self {
            show_rows,
            show_columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn large() -> MatrixFilter {
        MatrixFilter {
            many_users: true,
            many_groups: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_small_directory_shows_everything() {
        let axes = AxisVisibility::resolve(&MatrixFilter::default());
        assert!(axes.show_rows);
        assert!(axes.show_columns);
    }

    #[test]
    fn test_short_queries_hide_large_axes() {
        for query in ["", "a", "é"] {
            let filter = MatrixFilter {
                query_user: query.to_string(),
                query_group: query.to_string(),
                ..large()
            };
            let axes = AxisVisibility::resolve(&filter);
            assert!(!axes.show_rows, "rows shown for {:?}", query);
            assert!(!axes.show_columns, "columns shown for {:?}", query);
        }
    }

    #[test]
    fn test_two_characters_unlock_large_axes() {
        let filter = MatrixFilter {
            query_user: "al".to_string(),
            query_group: "ed".to_string(),
            ..large()
        };
        let axes = AxisVisibility::resolve(&filter);
        assert!(axes.show_rows);
        assert!(axes.show_columns);
    }

    #[test]
    fn test_pins_unlock_both_axes() {
        let filter = MatrixFilter {
            groups_filter: vec![PinnedGroup::new("editors", "Editors")],
            ..large()
        };
        let axes = AxisVisibility::resolve(&filter);
        assert!(axes.show_rows);
        assert!(axes.show_columns);
    }

    #[test]
    fn test_joined_groups_unlock_columns_only() {
        let filter = MatrixFilter {
            add_joined_groups: true,
            ..large()
        };
        let axes = AxisVisibility::resolve(&filter);
        assert!(!axes.show_rows);
        assert!(axes.show_columns);
        assert!(!filter.seeds_from_group_listing());
    }

    #[test]
    fn test_multibyte_queries_count_characters() {
        assert!(!is_searchable("ü"));
        assert!(is_searchable("üß"));
    }
}
