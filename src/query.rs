use serde::Serialize;

use crate::snapshot::Snapshot;

/// One contiguous chunk of a snapshot's rows, for incremental loading.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Page {
    pub rows: Vec<Vec<String>>,
    pub start: usize,
    pub end: usize,
    pub total: usize,
}

/// Slice `snapshot.rows[start..start+size]`, clamped to the available rows.
/// An out-of-range `start` yields an empty page, never an error; `total` is
/// always the full row count.
pub fn page(snapshot: &Snapshot, start: usize, size: usize) -> Page {
    let total = snapshot.rows.len();
    let end = total.min(start.saturating_add(size));
    let rows = snapshot.rows[start.min(total)..end].to_vec();
    Page {
        rows,
        start,
        end,
        total,
    }
}
