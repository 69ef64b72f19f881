//! Initial-state providers that populate the interior before generation 1.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulationConfig;

/// Decides which interior cells start alive.
///
/// `is_alive` is called exactly once per interior cell, in row-major order,
/// with 1-based coordinates.
pub trait InitialState {
    fn is_alive(&mut self, row: usize, col: usize) -> bool;
}

impl<F> InitialState for F
where
    F: FnMut(usize, usize) -> bool,
{
    fn is_alive(&mut self, row: usize, col: usize) -> bool {
        self(row, col)
    }
}

/// Each cell independently alive with probability `init_pct`.
pub struct RandomFill {
    rng: StdRng,
    init_pct: f64,
}

impl RandomFill {
    pub fn new(seed: u64, init_pct: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            init_pct,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.seed, config.init_pct)
    }
}

impl InitialState for RandomFill {
    fn is_alive(&mut self, _row: usize, _col: usize) -> bool {
        self.rng.random::<f64>() < self.init_pct
    }
}

/// An explicit set of live `(row, col)` cells.
#[derive(Clone, Debug, Default)]
pub struct LiveCells(HashSet<(usize, usize)>);

impl LiveCells {
    pub fn new<I: IntoIterator<Item = (usize, usize)>>(cells: I) -> Self {
        Self(cells.into_iter().collect())
    }
}

impl InitialState for LiveCells {
    fn is_alive(&mut self, row: usize, col: usize) -> bool {
        self.0.contains(&(row, col))
    }
}

/// Every cell starts dead.
#[derive(Clone, Copy, Debug, Default)]
pub struct Empty;

impl InitialState for Empty {
    fn is_alive(&mut self, _row: usize, _col: usize) -> bool {
        false
    }
}
