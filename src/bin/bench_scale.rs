//! Lockstep throughput across grid sizes and worker counts.
//!
//! Use with `--release` for meaningful results.

use std::time::Instant;

use lockstep_life::{NullReporter, Simulation, SimulationConfig};

fn bench_lockstep(size: usize, workers: usize, iterations: u64) -> (f64, u64) {
    let config = SimulationConfig::default()
        .gridsize(size)
        .worker_count(workers)
        .init_pct(0.42)
        .num_iters(iterations)
        .seed(0x5EED_1234_ABCD_EF01);
    let mut sim = match Simulation::from_config(config) {
        Ok(sim) => sim,
        Err(err) => panic!("bench setup failed: {err}"),
    };

    let start = Instant::now();
    let summary = match sim.run(&mut NullReporter) {
        Ok(summary) => summary,
        Err(err) => panic!("bench run failed: {err}"),
    };
    let duration = start.elapsed();

    (duration.as_secs_f64() * 1000.0, summary.final_counts.live)
}

fn main() {
    let scales: &[(usize, u64)] = &[(256, 200), (512, 100), (1024, 50), (2048, 20)];
    let max_workers = num_cpus::get_physical().max(1);
    let mut worker_counts = vec![1usize];
    while *worker_counts.last().unwrap_or(&1) * 2 <= max_workers {
        let next = worker_counts[worker_counts.len() - 1] * 2;
        worker_counts.push(next);
    }

    println!(
        "{:<12} {:>8} {:>8} {:>12} {:>10} {:>10}",
        "Grid", "Workers", "Iters", "Total(ms)", "Avg(ms)", "Live"
    );
    println!("{}", "-".repeat(66));

    for &(size, iters) in scales {
        for &workers in &worker_counts {
            let (total_ms, live) = bench_lockstep(size, workers, iters);
            let avg_ms = total_ms / iters as f64;
            println!(
                "{:<12} {:>8} {:>8} {:>12.1} {:>10.4} {:>10}",
                format!("{}x{}", size, size),
                workers,
                iters,
                total_ms,
                avg_ms,
                live
            );
        }
    }
}
