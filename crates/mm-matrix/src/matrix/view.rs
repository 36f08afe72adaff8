//! Matrix View
//!
//! The renderable grid: editable columns, labelled rows with one membership
//! flag per column, and the paging / empty-state hints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::group::entity::{ColumnOption, Group};
use crate::matrix::axis::{AxisVisibility, MatrixFilter};
use crate::matrix::columns::build_columns;
use crate::matrix::rows::RowPager;
use crate::principal::entity::Principal;

/// Message shown in place of an empty row set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum EmptyRows {
    /// A user search ran and matched nobody
    NoUserFound,
    /// No search or filter is active yet
    PleaseSearchOrFilterUsers,
}

impl EmptyRows {
    pub fn message(&self) -> &'static str {
        match self {
            EmptyRows::NoUserFound => "No user found",
            EmptyRows::PleaseSearchOrFilterUsers => "Please search or filter users",
        }
    }
}

/// A column with its edit permission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnView {
    pub value: String,
    pub label: String,
    pub roles: Vec<String>,
    /// Whether the actor may toggle memberships in this column
    pub editable: bool,
}

impl ColumnView {
    pub fn new(column: ColumnOption, editable: bool) -> Self {
        Self {
            value: column.value,
            label: column.label,
            roles: column.roles,
            editable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    pub id: String,
    pub label: String,
    /// Hover text
    pub title: String,
    /// Membership per column, in column order
    pub cells: Vec<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatrixView {
    pub columns: Vec<ColumnView>,
    pub rows: Vec<RowView>,
    pub user_count: usize,
    pub show_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<EmptyRows>,
}

impl MatrixView {
    /// Assemble the grid from fetched rows and groups.
    ///
    /// Rows are dropped when the row axis is hidden, so nothing stale renders.
    /// `editable` decides per column whether toggles are allowed.
    pub fn assemble<F>(
        filter: &MatrixFilter,
        groups: &[Group],
        rows: &[Principal],
        pager: &RowPager,
        editable: F,
    ) -> Self
    where
        F: Fn(&ColumnOption) -> bool,
    {
        let visibility = AxisVisibility::resolve(filter);
        let rows: &[Principal] = if visibility.show_rows { rows } else { &[] };

        let columns: Vec<ColumnView> = build_columns(filter, groups, rows)
            .into_iter()
            .map(|column| {
                let editable = editable(&column);
                ColumnView::new(column, editable)
            })
            .collect();

        let row_views: Vec<RowView> = rows
            .iter()
            .map(|principal| RowView {
                id: principal.id.clone(),
                label: principal.display_label(),
                title: principal.hover_title(),
                cells: columns
                    .iter()
                    .map(|column| principal.is_member_of(&column.value))
                    .collect(),
            })
            .collect();

        let empty_message = if !row_views.is_empty() {
            None
        } else if visibility.show_rows && !filter.query_user.is_empty() {
            Some(EmptyRows::NoUserFound)
        } else {
            Some(EmptyRows::PleaseSearchOrFilterUsers)
        };

        Self {
            user_count: row_views.len(),
            show_more: pager.has_more(row_views.len()),
            columns,
            rows: row_views,
            empty_message,
        }
    }

    /// Whether the header (labels and select-all toggles) is rendered
    pub fn has_header(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn column(&self, group_id: &str) -> Option<&ColumnView> {
        self.columns.iter().find(|c| c.value == group_id)
    }

    /// Row ids in display order
    pub fn row_ids(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.id.clone()).collect()
    }
}
