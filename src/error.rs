//! Error types for configuration and for running a simulation.

use std::io;

use thiserror::Error;

/// Problems with the parameters of a run, detected before anything is allocated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("expected 4 positional arguments (num_threads gridsize init_pct num_iters), got {0}")]
    ArgumentCount(usize),
    #[error("{name} must be {expected}, got {value:?}")]
    Unparseable {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("{flag} requires a value")]
    MissingValue { flag: &'static str },
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
    #[error("num_threads must be at least 1")]
    NoWorkers,
    #[error("gridsize must be at least 1")]
    EmptyGrid,
    #[error("gridsize {0} is too large to allocate")]
    GridTooLarge(usize),
    #[error("init_pct must lie in [0, 1], got {0}")]
    InitPct(f64),
}

/// Fatal failures of a run. Nothing is retried.
#[derive(Debug, Error)]
pub enum LifeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not create worker {worker}")]
    WorkerSpawn {
        worker: usize,
        #[source]
        source: io::Error,
    },
    #[error("cannot run {requested} more generations past generation {generation}")]
    GenerationOverflow { generation: u64, requested: u64 },
    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },
    #[error("could not build the reference thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
