#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::process::ExitCode;
use std::time::Instant;

use lockstep_life::config::{CliArgs, USAGE};
use lockstep_life::{
    ConsoleReporter, LifeError, RandomFill, Recording, ReferenceLife, Simulation, SimulationConfig,
};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "LOCKSTEP_LIFE_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .init();
}

fn run(config: SimulationConfig, check: bool, quiet: bool) -> Result<bool, LifeError> {
    let mut sim = Simulation::new(config.clone(), &mut RandomFill::from_config(&config))?;
    let reference = if check {
        Some(ReferenceLife::from_interior(config.gridsize, &sim.snapshot())?)
    } else {
        None
    };

    let mut console = ConsoleReporter::stdout().quiet(quiet);
    let start = Instant::now();
    let (summary, reports) = if check {
        let mut recording = Recording::new(&mut console);
        let summary = sim.run(&mut recording)?;
        (summary, recording.into_reports())
    } else {
        (sim.run(&mut console)?, Vec::new())
    };
    let elapsed = start.elapsed();
    if let Err(err) = console.finish() {
        tracing::error!(%err, "failed to write report");
    }
    tracing::info!(
        generations = summary.generations_run,
        live = summary.final_counts.live,
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "finished"
    );

    let Some(mut reference) = reference else {
        return Ok(true);
    };
    let outcome = reference.check(&reports, &sim.snapshot());
    for check in &outcome.generations {
        let (got, expected) = (check.lockstep, check.reference);
        println!(
            "Check {}: lockstep live {} born {} died {} | reference live {} born {} died {} [{}]",
            check.generation,
            got.live,
            got.births,
            got.deaths,
            expected.live,
            expected.births,
            expected.deaths,
            if check.matches() { "MATCH" } else { "MISMATCH" },
        );
    }
    println!(
        "Final grid: {}",
        if outcome.grid_matches { "MATCH" } else { "MISMATCH" }
    );
    Ok(outcome.passed())
}

fn main() -> ExitCode {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("error: {err}\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };
    init_logging();

    match run(args.config, args.check, args.quiet) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
