//! Per-generation live/birth/death tallies.

use std::sync::{Mutex, PoisonError};

use super::rules::CellEvent;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationCounts {
    pub live: u64,
    pub births: u64,
    pub deaths: u64,
}

impl GenerationCounts {
    /// Tally one cell's outcome.
    #[inline]
    pub fn record(&mut self, next: u8, event: CellEvent) {
        self.live += u64::from(next);
        match event {
            CellEvent::Birth => self.births += 1,
            CellEvent::Death => self.deaths += 1,
            CellEvent::None => {}
        }
    }

    #[inline]
    pub fn merge(&mut self, other: &GenerationCounts) {
        self.live += other.live;
        self.births += other.births;
        self.deaths += other.deaths;
    }
}

/// Counts published for one completed generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationReport {
    /// 1-based generation index.
    pub generation: u64,
    pub counts: GenerationCounts,
}

/// Totals shared by all workers under the locked aggregation protocol.
///
/// Only touched between the reset and publish barriers (accumulate) and by the
/// publish-barrier leader (drain).
#[derive(Debug, Default)]
pub struct SharedCounters {
    totals: Mutex<GenerationCounts>,
}

impl SharedCounters {
    pub fn accumulate(&self, partial: &GenerationCounts) {
        self.totals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(partial);
    }

    /// Take the totals and leave zero behind.
    pub fn drain(&self) -> GenerationCounts {
        std::mem::take(&mut *self.totals.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
