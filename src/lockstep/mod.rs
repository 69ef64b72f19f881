//! Lockstep engine: row-partitioned workers advancing a double-buffered grid
//! one barrier-synchronised generation at a time.

mod coordinator;
mod counters;
pub mod grid;
pub mod partition;
pub mod rules;

pub use coordinator::{RunSummary, Simulation};
pub use counters::{GenerationCounts, GenerationReport, SharedCounters};
pub use grid::{BufferRole, Grid, GridView, Parity};
pub use partition::{RowAssignment, partition_rows};
pub use rules::{CellEvent, Transition, transition};
