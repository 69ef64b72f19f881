//! Deterministic mapping of workers onto contiguous bands of interior rows.
//!
//! Rows `1..=gridsize` are split as evenly as possible: with
//! `base = gridsize / workers` and `extra = gridsize % workers`, the first
//! `extra` workers get `base + 1` rows and the rest get `base`. Workers beyond
//! `gridsize` receive an empty band (`start_row == end_row + 1`).

use std::ops::RangeInclusive;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowAssignment {
    pub worker_index: usize,
    pub start_row: usize,
    /// Inclusive.
    pub end_row: usize,
}

impl RowAssignment {
    #[inline]
    pub fn rows(&self) -> RangeInclusive<usize> {
        self.start_row..=self.end_row
    }

    #[inline]
    pub fn len(&self) -> usize {
        (self.end_row + 1).saturating_sub(self.start_row)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Assign every interior row of a `gridsize` grid to exactly one of `workers` workers.
pub fn partition_rows(gridsize: usize, workers: usize) -> Vec<RowAssignment> {
    assert!(workers >= 1, "at least one worker is required");
    let base = gridsize / workers;
    let extra = gridsize % workers;
    (0..workers)
        .map(|worker_index| {
            let start_row = 1 + worker_index * base + worker_index.min(extra);
            let len = base + usize::from(worker_index < extra);
            RowAssignment {
                worker_index,
                start_row,
                end_row: start_row + len - 1,
            }
        })
        .collect()
}
