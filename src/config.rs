//! Simulation parameters and command-line parsing.

use crate::error::ConfigError;

pub const USAGE: &str = "usage: lockstep-life num_threads gridsize init_pct num_iters \
[--seed N] [--aggregation channel|locked] [--check] [--quiet]";

/// How workers combine their per-generation partial counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Aggregation {
    /// Workers send partial counts to the coordinating thread, which sums
    /// them. One barrier per generation, no shared counters.
    #[default]
    Channel,
    /// Reset barrier, mutex-guarded accumulation into shared counters, then a
    /// publish barrier whose leader drains the totals.
    Locked,
}

impl Aggregation {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "channel" => Ok(Self::Channel),
            "locked" | "mutex" => Ok(Self::Locked),
            _ => Err(ConfigError::Unparseable {
                name: "--aggregation",
                expected: "channel or locked",
                value: value.to_string(),
            }),
        }
    }
}

/// Parameters of one simulation, immutable for the lifetime of the run.
///
/// Start from `SimulationConfig::default()` and override knobs with the
/// builder methods, or parse them from command-line arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Number of worker threads, each owning a contiguous band of rows.
    pub worker_count: usize,
    /// Side length of the square interior.
    pub gridsize: usize,
    /// Probability that an interior cell starts alive under random seeding.
    pub init_pct: f64,
    /// Number of generations to simulate.
    pub num_iters: u64,
    /// Seed for the random initial state.
    pub seed: u64,
    pub aggregation: Aggregation,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            gridsize: 64,
            init_pct: 0.5,
            num_iters: 10,
            seed: 0,
            aggregation: Aggregation::default(),
        }
    }
}

impl SimulationConfig {
    pub fn worker_count(mut self, n: usize) -> Self {
        self.worker_count = n;
        self
    }

    pub fn gridsize(mut self, n: usize) -> Self {
        self.gridsize = n;
        self
    }

    pub fn init_pct(mut self, pct: f64) -> Self {
        self.init_pct = pct;
        self
    }

    pub fn num_iters(mut self, n: u64) -> Self {
        self.num_iters = n;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Number of interior cells.
    pub fn interior_cells(&self) -> u64 {
        (self.gridsize as u64) * (self.gridsize as u64)
    }

    /// Reject parameters that cannot describe a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.gridsize == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        let cells = self
            .gridsize
            .checked_add(2)
            .and_then(|stride| stride.checked_mul(stride));
        if cells.is_none_or(|cells| cells > isize::MAX as usize / 2) {
            return Err(ConfigError::GridTooLarge(self.gridsize));
        }
        if !(0.0..=1.0).contains(&self.init_pct) {
            return Err(ConfigError::InitPct(self.init_pct));
        }
        Ok(())
    }
}

/// Everything the binary reads from its command line.
#[derive(Clone, Debug, PartialEq)]
pub struct CliArgs {
    pub config: SimulationConfig,
    /// Cross-check every generation against the reference stepper.
    pub check: bool,
    /// Suppress the per-generation report lines.
    pub quiet: bool,
}

impl CliArgs {
    /// Parse the arguments that follow the program name.
    ///
    /// Four positional values are required; flags may appear anywhere.
    pub fn parse<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let mut positional = Vec::with_capacity(4);
        let mut seed = 0u64;
        let mut aggregation = Aggregation::default();
        let mut check = false;
        let mut quiet = false;

        let next_arg = |i: usize, flag: &'static str| -> Result<&str, ConfigError> {
            args.get(i)
                .map(String::as_str)
                .ok_or(ConfigError::MissingValue { flag })
        };

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--seed" => {
                    i += 1;
                    seed = parse_value(next_arg(i, "--seed")?, "--seed", "a non-negative integer")?;
                }
                "--aggregation" => {
                    i += 1;
                    aggregation = Aggregation::parse(next_arg(i, "--aggregation")?)?;
                }
                "--check" => check = true,
                "--quiet" => quiet = true,
                flag if flag.starts_with("--") => {
                    return Err(ConfigError::UnknownArgument(flag.to_string()));
                }
                value => positional.push(value),
            }
            i += 1;
        }

        let [threads, gridsize, init_pct, num_iters] = positional[..] else {
            return Err(ConfigError::ArgumentCount(positional.len()));
        };
        let config = SimulationConfig {
            worker_count: parse_value(threads, "num_threads", "a positive integer")?,
            gridsize: parse_value(gridsize, "gridsize", "a positive integer")?,
            init_pct: parse_value(init_pct, "init_pct", "a number in [0, 1]")?,
            num_iters: parse_value(num_iters, "num_iters", "a non-negative integer")?,
            seed,
            aggregation,
        };
        config.validate()?;

        Ok(Self {
            config,
            check,
            quiet,
        })
    }
}

fn parse_value<T: std::str::FromStr>(
    raw: &str,
    name: &'static str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Unparseable {
        name,
        expected,
        value: raw.to_string(),
    })
}
