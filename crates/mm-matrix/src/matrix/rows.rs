//! Row ordering and paging

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::principal::entity::Principal;

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Sort rows by reversed full name (surname first) or id; stable and
/// case-sensitive.
pub fn sort_rows(rows: &mut [Principal]) {
    rows.sort_by_cached_key(Principal::sort_label);
}

/// "Load more" state for the row axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RowPager {
    page_size: usize,
    limit: usize,
}

impl RowPager {
    /// A zero page size is treated as one.
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            limit: page_size,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Rows requested from the directory
    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn load_more(&mut self) -> usize {
        self.limit += self.page_size;
        self.limit
    }

    pub fn reset(&mut self) {
        self.limit = self.page_size;
    }

    /// The "load more" control is offered while a fetch returns at least a
    /// full page of rows.
    pub fn has_more(&self, fetched: usize) -> bool {
        fetched >= self.page_size
    }
}

impl Default for RowPager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
