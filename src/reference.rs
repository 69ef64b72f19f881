//! Independent dense stepper used to cross-check the lockstep engine.
//!
//! Keeps a single bordered buffer, builds the next generation into a fresh
//! one row-parallel on its own rayon pool, and swaps.

use rayon::prelude::*;

use crate::error::LifeError;
use crate::lockstep::{GenerationCounts, GenerationReport, transition};
use crate::seed::InitialState;

/// Lockstep and reference counts for one generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationCheck {
    pub generation: u64,
    pub lockstep: GenerationCounts,
    pub reference: GenerationCounts,
}

impl GenerationCheck {
    pub fn matches(&self) -> bool {
        self.lockstep == self.reference
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckOutcome {
    pub generations: Vec<GenerationCheck>,
    pub grid_matches: bool,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        self.grid_matches && self.generations.iter().all(GenerationCheck::matches)
    }
}

pub struct ReferenceLife {
    size: usize,
    stride: usize,
    cells: Vec<u8>,
    generation: u64,
    pool: rayon::ThreadPool,
}

fn physical_threads() -> usize {
    num_cpus::get_physical().max(1)
}

impl ReferenceLife {
    /// Build from a dense row-major `size * size` interior (any non-zero value is alive).
    pub fn from_interior(size: usize, interior: &[u8]) -> Result<Self, LifeError> {
        Self::with_threads(size, interior, physical_threads())
    }

    pub fn with_threads(size: usize, interior: &[u8], threads: usize) -> Result<Self, LifeError> {
        assert_eq!(interior.len(), size * size, "interior must be size * size cells");
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("life-reference-{i}"))
            .build()?;
        let stride = size + 2;
        let mut cells = vec![0u8; stride * stride];
        for (row, src) in interior.chunks_exact(size.max(1)).enumerate() {
            let dst = &mut cells[(row + 1) * stride + 1..(row + 1) * stride + 1 + size];
            for (d, &s) in dst.iter_mut().zip(src) {
                *d = u8::from(s != 0);
            }
        }
        Ok(Self {
            size,
            stride,
            cells,
            generation: 0,
            pool,
        })
    }

    /// Seed from an initial-state provider, visiting cells in row-major order.
    pub fn from_initial<S>(size: usize, initial: &mut S) -> Result<Self, LifeError>
    where
        S: InitialState + ?Sized,
    {
        let mut interior = Vec::with_capacity(size * size);
        for row in 1..=size {
            for col in 1..=size {
                interior.push(u8::from(initial.is_alive(row, col)));
            }
        }
        Self::from_interior(size, &interior)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn population(&self) -> u64 {
        self.cells.iter().map(|&c| u64::from(c)).sum()
    }

    /// Advance one generation and return its counts.
    pub fn step(&mut self) -> GenerationCounts {
        let size = self.size;
        let stride = self.stride;
        let prev = &self.cells;
        let mut next = vec![0u8; stride * stride];

        let counts = self.pool.install(|| {
            next.par_chunks_mut(stride)
                .enumerate()
                .skip(1)
                .take(size)
                .map(|(row, out)| {
                    let mut counts = GenerationCounts::default();
                    for col in 1..=size {
                        let center = row * stride + col;
                        let mut neighbors = 0u8;
                        for dr in [center - stride, center, center + stride] {
                            neighbors += prev[dr - 1] + prev[dr] + prev[dr + 1];
                        }
                        let current = prev[center];
                        let step = transition(neighbors - current, current);
                        out[col] = step.next;
                        counts.record(step.next, step.event);
                    }
                    counts
                })
                .reduce(GenerationCounts::default, |mut a, b| {
                    a.merge(&b);
                    a
                })
        });

        self.cells = next;
        self.generation += 1;
        counts
    }

    pub fn step_n(&mut self, n: u64) -> Vec<GenerationCounts> {
        (0..n).map(|_| self.step()).collect()
    }

    /// Step once per report, comparing counts, then compare the final interior
    /// against `final_grid`.
    pub fn check(&mut self, reports: &[GenerationReport], final_grid: &[u8]) -> CheckOutcome {
        let generations = reports
            .iter()
            .map(|report| GenerationCheck {
                generation: report.generation,
                lockstep: report.counts,
                reference: self.step(),
            })
            .collect();
        CheckOutcome {
            generations,
            grid_matches: self.snapshot() == final_grid,
        }
    }

    /// Dense row-major copy of the interior.
    pub fn snapshot(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size * self.size);
        for row in 1..=self.size {
            let start = row * self.stride + 1;
            out.extend_from_slice(&self.cells[start..start + self.size]);
        }
        out
    }
}
