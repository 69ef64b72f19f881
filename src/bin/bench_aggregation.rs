//! Channel vs locked aggregation on the same seeded boards.
//!
//! Small grids with many workers stress the per-generation synchronisation
//! rather than the cell kernel.

use std::time::Instant;

use lockstep_life::{Aggregation, NullReporter, Simulation, SimulationConfig};

struct Scenario {
    name: &'static str,
    size: usize,
    workers: usize,
    iters: u64,
}

fn run_scenario(s: &Scenario, aggregation: Aggregation) -> (f64, u64) {
    let config = SimulationConfig::default()
        .gridsize(s.size)
        .worker_count(s.workers)
        .init_pct(0.35)
        .num_iters(s.iters)
        .seed(0xA1)
        .aggregation(aggregation);
    let mut sim = match Simulation::from_config(config) {
        Ok(sim) => sim,
        Err(err) => panic!("{}: setup failed: {err}", s.name),
    };
    let start = Instant::now();
    let summary = match sim.run(&mut NullReporter) {
        Ok(summary) => summary,
        Err(err) => panic!("{}: run failed: {err}", s.name),
    };
    (start.elapsed().as_secs_f64() * 1000.0, summary.final_counts.live)
}

fn main() {
    let threads = num_cpus::get().max(2);
    let scenarios = [
        Scenario {
            name: "tiny-sync-bound",
            size: 32,
            workers: threads,
            iters: 5_000,
        },
        Scenario {
            name: "small",
            size: 256,
            workers: threads,
            iters: 500,
        },
        Scenario {
            name: "large",
            size: 2048,
            workers: threads,
            iters: 20,
        },
    ];

    println!(
        "{:<18} {:>8} {:>14} {:>14} {:>10}",
        "Scenario", "Workers", "Channel(ms)", "Locked(ms)", "Live"
    );
    println!("{}", "-".repeat(68));
    for s in &scenarios {
        let (channel_ms, channel_live) = run_scenario(s, Aggregation::Channel);
        let (locked_ms, locked_live) = run_scenario(s, Aggregation::Locked);
        let live = if channel_live == locked_live {
            channel_live.to_string()
        } else {
            format!("{channel_live}!={locked_live}")
        };
        println!(
            "{:<18} {:>8} {:>14.1} {:>14.1} {:>10}",
            s.name, s.workers, channel_ms, locked_ms, live
        );
    }
}
