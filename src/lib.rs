//! Conway's Game of Life (B3/S23) on a bounded grid with a dead border,
//! stepped in lockstep by a fixed pool of row-partitioned workers.

pub mod config;
pub mod error;
pub mod lockstep;
pub mod reference;
pub mod report;
pub mod seed;

pub use config::{Aggregation, SimulationConfig};
pub use error::{ConfigError, LifeError};
pub use lockstep::{GenerationCounts, GenerationReport, RunSummary, Simulation};
pub use reference::{CheckOutcome, GenerationCheck, ReferenceLife};
pub use report::{ConsoleReporter, NullReporter, Recording, Reporter};
pub use seed::{Empty, InitialState, LiveCells, RandomFill};
