use lockstep_life::{
    Aggregation, GenerationReport, RandomFill, ReferenceLife, Simulation, SimulationConfig,
};

fn run_parity_case(size: usize, density: f64, steps: u64, seed: u64, workers: usize) {
    for aggregation in [Aggregation::Channel, Aggregation::Locked] {
        let config = SimulationConfig::default()
            .gridsize(size)
            .init_pct(density)
            .num_iters(steps)
            .seed(seed)
            .worker_count(workers)
            .aggregation(aggregation);

        let mut reference =
            ReferenceLife::from_initial(size, &mut RandomFill::from_config(&config)).unwrap();
        let mut sim = Simulation::from_config(config).unwrap();
        assert_eq!(sim.snapshot(), reference.snapshot(), "seed mismatch for seed {seed}");

        let mut reports: Vec<GenerationReport> = Vec::new();
        sim.run(&mut reports).unwrap();
        let expected = reference.step_n(steps);

        let got: Vec<_> = reports.iter().map(|r| r.counts).collect();
        assert_eq!(
            got, expected,
            "count mismatch for density {density} seed {seed} workers {workers}"
        );
        assert_eq!(
            sim.snapshot(),
            reference.snapshot(),
            "grid mismatch for density {density} seed {seed} workers {workers}"
        );
        assert_eq!(sim.population(), reference.population());
    }
}

#[test]
fn parity_sparse_mid_dense() {
    run_parity_case(96, 0.10, 6, 0xA1, 4);
    run_parity_case(96, 0.42, 6, 0xB2, 3);
    run_parity_case(96, 0.83, 4, 0xC3, 7);
}

#[test]
fn parity_multiple_seeds() {
    for seed in [11u64, 22, 33, 44] {
        run_parity_case(72, 0.35, 7, seed, 5);
    }
}

#[test]
fn parity_more_workers_than_rows() {
    run_parity_case(6, 0.5, 10, 0xE5, 9);
}
