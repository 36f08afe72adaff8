//! In-flight cell tracking
//!
//! A toggle claims every `(group, principal)` cell it writes and holds the
//! claim until its write, refresh and notification are done. Overlapping
//! toggles are rejected instead of queued.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::shared::error::{MatrixError, Result};

type Cell = (String, String);

/// Set of cells with a write in progress
#[derive(Debug, Clone, Default)]
pub struct InFlightCells {
    cells: Arc<Mutex<HashSet<Cell>>>,
}

impl InFlightCells {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim all cells of `group_id` for `principal_ids`, or none of them.
    ///
    /// Fails with `CellBusy` naming the first cell already claimed.
    pub fn claim<'a, I>(&self, group_id: &str, principal_ids: I) -> Result<CellClaim>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let wanted: Vec<Cell> = principal_ids
            .into_iter()
            .map(|principal_id| (group_id.to_string(), principal_id.to_string()))
            .collect();

        let mut cells = self.cells.lock();
        if let Some((group, principal)) = wanted.iter().find(|cell| cells.contains(*cell)) {
            debug!(group_id = %group, principal_id = %principal, "Cell already being updated");
            return Err(MatrixError::cell_busy(group.as_str(), principal.as_str()));
        }
        cells.extend(wanted.iter().cloned());

        Ok(CellClaim {
            owner: Arc::clone(&self.cells),
            cells: wanted,
        })
    }

    pub fn is_claimed(&self, group_id: &str, principal_id: &str) -> bool {
        self.cells
            .lock()
            .contains(&(group_id.to_string(), principal_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.cells.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases its cells when dropped, whether the toggle succeeded or not.
#[derive(Debug)]
pub struct CellClaim {
    owner: Arc<Mutex<HashSet<Cell>>>,
    cells: Vec<Cell>,
}

impl Drop for CellClaim {
    fn drop(&mut self) {
        let mut cells = self.owner.lock();
        for cell in &self.cells {
            cells.remove(cell);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_and_release() {
        let in_flight = InFlightCells::new();
        let claim = in_flight.claim("editors", ["alice"]).unwrap();
        assert!(in_flight.is_claimed("editors", "alice"));
        assert!(!in_flight.is_claimed("reviewers", "alice"));

        drop(claim);
        assert!(in_flight.is_empty());
    }

    #[test]
    fn test_overlapping_claim_is_rejected() {
        let in_flight = InFlightCells::new();
        let _cell = in_flight.claim("editors", ["bob"]).unwrap();

        let err = in_flight.claim("editors", ["alice", "bob"]).unwrap_err();
        match err {
            MatrixError::CellBusy { group_id, principal_id } => {
                assert_eq!(group_id, "editors");
                assert_eq!(principal_id, "bob");
            }
            other => panic!("unexpected error: {other}"),
        }

        // Nothing from the rejected claim leaked in.
        assert!(!in_flight.is_claimed("editors", "alice"));
        assert_eq!(in_flight.len(), 1);
    }

    #[test]
    fn test_disjoint_claims_coexist() {
        let in_flight = InFlightCells::new();
        let _a = in_flight.claim("editors", ["alice"]).unwrap();
        let _b = in_flight.claim("reviewers", ["alice"]).unwrap();
        let _c = in_flight.claim("editors", ["bob"]).unwrap();
        assert_eq!(in_flight.len(), 3);
    }
}
