//! Generation coordinator.
//!
//! A fixed set of scoped worker threads, one per [`RowAssignment`], is spawned
//! per run and joined at its end. Per generation each worker:
//!
//! 1. computes its rows of the `Current` buffer from the `Previous` buffer,
//!    tallying live/birth/death counts locally;
//! 2. combines those counts with everyone else's, either
//!    - `Channel`: sends them to the coordinating thread and waits at the
//!      generation barrier, or
//!    - `Locked`: waits at the reset barrier, adds them to the shared counters
//!      under their mutex, then waits at the publish barrier, whose leader
//!      drains the totals and forwards them to the coordinating thread;
//! 3. moves on with the parity of the next generation.
//!
//! The coordinating thread sums partials, reports completed generations in
//! order, and joins the workers.

use std::collections::BTreeMap;
use std::sync::Barrier;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

use tracing::{Dispatch, debug, debug_span, error, info, warn};

use super::counters::{GenerationCounts, GenerationReport, SharedCounters};
use super::grid::{ALIVE, BufferRole, Grid, Parity};
use super::partition::{RowAssignment, partition_rows};
use super::rules::transition;
use crate::config::{Aggregation, SimulationConfig};
use crate::error::LifeError;
use crate::report::Reporter;
use crate::seed::{InitialState, RandomFill};

/// Outcome of one call to [`Simulation::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub initial_live: u64,
    /// Counts of the last generation computed, or the current population with
    /// no births or deaths if no generation ran.
    pub final_counts: GenerationCounts,
    pub generations_run: u64,
}

/// Everything a run shares between its workers.
pub struct Simulation {
    config: SimulationConfig,
    grid: Grid,
    assignments: Vec<RowAssignment>,
    counters: SharedCounters,
    initial_live: u64,
}

enum WorkerMessage {
    /// One worker's counts for a generation (`Channel`).
    Partial {
        generation: u64,
        counts: GenerationCounts,
    },
    /// Fully aggregated totals from the publish-barrier leader (`Locked`).
    Published(GenerationReport),
}

struct WorkerContext<'a> {
    grid: &'a Grid,
    barrier: &'a Barrier,
    counters: &'a SharedCounters,
    aggregation: Aggregation,
    first: u64,
    last: u64,
}

impl Simulation {
    /// Validate `config`, allocate the grid and seed generation 0 from `initial`.
    pub fn new<S>(config: SimulationConfig, initial: &mut S) -> Result<Self, LifeError>
    where
        S: InitialState + ?Sized,
    {
        config.validate()?;

        let grid = Grid::new(config.gridsize);
        let mut initial_live = 0u64;
        for row in 1..=config.gridsize {
            for col in 1..=config.gridsize {
                if initial.is_alive(row, col) {
                    grid.set(BufferRole::Current, row, col, ALIVE);
                    initial_live += 1;
                }
            }
        }

        let assignments = partition_rows(config.gridsize, config.worker_count);
        if config.worker_count > config.gridsize {
            warn!(
                workers = config.worker_count,
                rows = config.gridsize,
                "more workers than rows; {} workers will idle",
                config.worker_count - config.gridsize
            );
        }
        info!(
            gridsize = config.gridsize,
            workers = config.worker_count,
            initial_live,
            "simulation seeded"
        );

        Ok(Self {
            config,
            grid,
            assignments,
            counters: SharedCounters::default(),
            initial_live,
        })
    }

    /// Seed randomly from `config.seed` and `config.init_pct`.
    pub fn from_config(config: SimulationConfig) -> Result<Self, LifeError> {
        let mut fill = RandomFill::from_config(&config);
        Self::new(config, &mut fill)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn assignments(&self) -> &[RowAssignment] {
        &self.assignments
    }

    pub fn initial_live(&self) -> u64 {
        self.initial_live
    }

    /// Generations computed so far.
    pub fn generation(&self) -> u64 {
        self.grid.generation()
    }

    pub fn population(&self) -> u64 {
        self.grid.population()
    }

    /// Dense row-major copy of the current interior.
    pub fn snapshot(&self) -> Vec<u8> {
        self.grid.snapshot()
    }

    /// Run the configured `num_iters` generations.
    pub fn run<R>(&mut self, reporter: &mut R) -> Result<RunSummary, LifeError>
    where
        R: Reporter + ?Sized,
    {
        self.run_for(self.config.num_iters, reporter)
    }

    /// Run `generations` more generations, continuing from the current one.
    pub fn run_for<R>(&mut self, generations: u64, reporter: &mut R) -> Result<RunSummary, LifeError>
    where
        R: Reporter + ?Sized,
    {
        let Some(last) = self.grid.generation().checked_add(generations) else {
            return Err(LifeError::GenerationOverflow {
                generation: self.grid.generation(),
                requested: generations,
            });
        };
        if self.grid.generation() == 0 {
            reporter.initial(self.initial_live, self.config.interior_cells());
        }

        let idle = GenerationCounts {
            live: self.grid.population(),
            ..GenerationCounts::default()
        };
        if generations == 0 {
            return Ok(self.summary(idle, 0));
        }

        let first = self.grid.generation() + 1;
        let barrier = Barrier::new(self.assignments.len());
        let ctx = WorkerContext {
            grid: &self.grid,
            barrier: &barrier,
            counters: &self.counters,
            aggregation: self.config.aggregation,
            first,
            last,
        };
        info!(
            first,
            last,
            workers = self.assignments.len(),
            aggregation = ?self.config.aggregation,
            "starting run"
        );

        let assignments = &self.assignments;
        let bound = report_bound(self.config.aggregation, assignments.len());
        let dispatch = tracing::dispatcher::get_default(Dispatch::clone);
        let final_counts = thread::scope(|scope| {
            let (report_tx, report_rx) = mpsc::sync_channel(bound);
            let mut handles = Vec::with_capacity(assignments.len());
            let mut gates = Vec::with_capacity(assignments.len());

            for &assignment in assignments {
                let worker = assignment.worker_index;
                let (gate_tx, gate_rx) = mpsc::channel::<()>();
                let tx = report_tx.clone();
                let ctx = &ctx;
                let dispatch = dispatch.clone();
                let spawned = thread::Builder::new()
                    .name(format!("life-worker-{worker}"))
                    .spawn_scoped(scope, move || {
                        // A closed gate means startup was aborted.
                        if gate_rx.recv().is_ok() {
                            tracing::dispatcher::with_default(&dispatch, || {
                                ctx.run_worker(assignment, &tx);
                            });
                        }
                    });
                match spawned {
                    Ok(handle) => {
                        handles.push(handle);
                        gates.push(gate_tx);
                    }
                    Err(source) => {
                        error!(worker, %source, "could not create worker");
                        return Err(LifeError::WorkerSpawn { worker, source });
                    }
                }
            }
            drop(report_tx);

            for gate in gates {
                // Each receiver is held by a live worker until it is opened.
                let _ = gate.send(());
            }

            let last_counts = collect_reports(report_rx, &mut *reporter, assignments.len(), first);

            for (worker, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() {
                    error!(worker, "worker panicked");
                    return Err(LifeError::WorkerPanicked { worker });
                }
            }
            Ok(last_counts.unwrap_or(idle))
        })?;

        self.grid.advance_roles(generations);
        info!(
            generation = self.grid.generation(),
            live = final_counts.live,
            "run complete"
        );
        Ok(self.summary(final_counts, generations))
    }

    fn summary(&self, final_counts: GenerationCounts, generations_run: u64) -> RunSummary {
        RunSummary {
            initial_live: self.initial_live,
            final_counts,
            generations_run,
        }
    }
}

impl WorkerContext<'_> {
    fn run_worker(&self, assignment: RowAssignment, tx: &SyncSender<WorkerMessage>) {
        let span = debug_span!(
            "worker",
            index = assignment.worker_index,
            start_row = assignment.start_row,
            end_row = assignment.end_row
        );
        let _enter = span.enter();
        debug!("worker started");

        for generation in self.first..=self.last {
            let counts = self.compute_rows(assignment, Parity::of_generation(generation));

            match self.aggregation {
                Aggregation::Channel => {
                    // Sent before the barrier, so every partial of a generation
                    // is queued before any partial of the next one. Blocks
                    // while the collector lags.
                    let _ = tx.send(WorkerMessage::Partial { generation, counts });
                    self.barrier.wait();
                }
                Aggregation::Locked => {
                    // Reset: the previous publish leader drained the totals
                    // before it could arrive here.
                    self.barrier.wait();
                    self.counters.accumulate(&counts);
                    // Publish: every worker has contributed.
                    if self.barrier.wait().is_leader() {
                        let counts = self.counters.drain();
                        let _ = tx.send(WorkerMessage::Published(GenerationReport {
                            generation,
                            counts,
                        }));
                    }
                }
            }
        }

        debug!("worker finished");
    }

    /// Advance this worker's rows by one generation. Touches no shared state
    /// other than its own rows of the `Current` buffer.
    fn compute_rows(&self, assignment: RowAssignment, parity: Parity) -> GenerationCounts {
        let view = self.grid.view(parity);
        let size = self.grid.size();
        let mut counts = GenerationCounts::default();
        for row in assignment.rows() {
            for col in 1..=size {
                let current = view.get(BufferRole::Previous, row, col);
                let neighbors = view.neighbor_count(BufferRole::Previous, row, col);
                let step = transition(neighbors, current);
                view.set(BufferRole::Current, row, col, step.next);
                counts.record(step.next, step.event);
            }
        }
        counts
    }
}

/// Capacity of the report channel: one generation's worth of messages, so
/// workers stall on `send` instead of queueing unboundedly ahead of a slow
/// reporter.
fn report_bound(aggregation: Aggregation, workers: usize) -> usize {
    match aggregation {
        Aggregation::Channel => workers,
        Aggregation::Locked => 1,
    }
}

/// Sum worker messages into per-generation totals and report each generation,
/// in order, once it is complete. Returns the last reported counts.
fn collect_reports<R>(
    rx: Receiver<WorkerMessage>,
    reporter: &mut R,
    workers: usize,
    first: u64,
) -> Option<GenerationCounts>
where
    R: Reporter + ?Sized,
{
    let mut pending: BTreeMap<u64, (usize, GenerationCounts)> = BTreeMap::new();
    let mut next = first;
    let mut last = None;

    for message in rx {
        match message {
            WorkerMessage::Partial { generation, counts } => {
                let entry = pending.entry(generation).or_default();
                entry.0 += 1;
                entry.1.merge(&counts);
            }
            WorkerMessage::Published(report) => {
                pending.insert(report.generation, (workers, report.counts));
            }
        }

        while let Some(&(arrived, counts)) = pending.get(&next) {
            if arrived < workers {
                break;
            }
            pending.remove(&next);
            debug!(
                generation = next,
                live = counts.live,
                births = counts.births,
                deaths = counts.deaths,
                "generation complete"
            );
            reporter.generation(&GenerationReport {
                generation: next,
                counts,
            });
            last = Some(counts);
            next += 1;
        }
    }

    last
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::{Simulation, report_bound};
    use crate::config::{Aggregation, SimulationConfig};
    use crate::error::LifeError;
    use crate::lockstep::{GenerationCounts, GenerationReport};
    use crate::report::{NullReporter, Reporter};
    use crate::seed::{LiveCells, RandomFill};

    /// Counts "worker finished" events from any thread of a run.
    struct FinishedWorkers(Arc<AtomicUsize>);

    struct MessageIs {
        expected: &'static str,
        matched: bool,
    }

    impl Visit for MessageIs {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" && format!("{value:?}") == self.expected {
                self.matched = true;
            }
        }
    }

    impl<S: Subscriber> Layer<S> for FinishedWorkers {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = MessageIs {
                expected: "worker finished",
                matched: false,
            };
            event.record(&mut visitor);
            if visitor.matched {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Sleeps on the first generation and notes how many workers had already
    /// finished the whole run by then.
    struct SlowReporter {
        finished: Arc<AtomicUsize>,
        finished_at_first: Option<usize>,
        reports: usize,
    }

    impl Reporter for SlowReporter {
        fn generation(&mut self, report: &GenerationReport) {
            if report.generation == 1 {
                std::thread::sleep(Duration::from_millis(300));
                self.finished_at_first = Some(self.finished.load(Ordering::SeqCst));
            }
            self.reports += 1;
        }
    }

    fn blinker(workers: usize, aggregation: Aggregation) -> Simulation {
        let config = SimulationConfig::default()
            .gridsize(3)
            .worker_count(workers)
            .num_iters(2)
            .aggregation(aggregation);
        Simulation::new(config, &mut LiveCells::new([(2, 1), (2, 2), (2, 3)])).unwrap()
    }

    fn run_counts(config: SimulationConfig) -> Vec<GenerationReport> {
        let mut sim = Simulation::new(config.clone(), &mut RandomFill::from_config(&config)).unwrap();
        let mut reports: Vec<GenerationReport> = Vec::new();
        sim.run(&mut reports).unwrap();
        reports
    }

    #[test]
    fn blinker_rotates_and_returns() {
        for aggregation in [Aggregation::Channel, Aggregation::Locked] {
            let mut sim = blinker(1, aggregation);
            let mut reports: Vec<GenerationReport> = Vec::new();
            let summary = sim.run(&mut reports).unwrap();

            let expected = GenerationCounts {
                live: 3,
                births: 2,
                deaths: 2,
            };
            assert_eq!(
                reports,
                vec![
                    GenerationReport {
                        generation: 1,
                        counts: expected
                    },
                    GenerationReport {
                        generation: 2,
                        counts: expected
                    },
                ]
            );
            assert_eq!(summary.initial_live, 3);
            assert_eq!(summary.generations_run, 2);
            assert_eq!(summary.final_counts, expected);
            assert_eq!(sim.snapshot(), vec![0, 0, 0, 1, 1, 1, 0, 0, 0]);
        }
    }

    #[test]
    fn blinker_vertical_after_one_generation() {
        let mut sim = blinker(2, Aggregation::Locked);
        let mut reports: Vec<GenerationReport> = Vec::new();
        sim.run_for(1, &mut reports).unwrap();
        assert_eq!(sim.generation(), 1);
        assert_eq!(sim.snapshot(), vec![0, 1, 0, 0, 1, 0, 0, 1, 0]);
    }

    #[test]
    fn runs_continue_from_the_current_generation() {
        let mut sim = blinker(3, Aggregation::Channel);
        let mut first: Vec<GenerationReport> = Vec::new();
        sim.run_for(1, &mut first).unwrap();
        let mut second: Vec<GenerationReport> = Vec::new();
        sim.run_for(3, &mut second).unwrap();
        assert_eq!(first[0].generation, 1);
        let generations: Vec<u64> = second.iter().map(|r| r.generation).collect();
        assert_eq!(generations, vec![2, 3, 4]);
        assert_eq!(sim.generation(), 4);
        assert_eq!(sim.snapshot(), vec![0, 0, 0, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn zero_generations_reports_nothing() {
        let mut sim = blinker(2, Aggregation::Channel);
        let mut reports: Vec<GenerationReport> = Vec::new();
        let summary = sim.run_for(0, &mut reports).unwrap();
        assert!(reports.is_empty());
        assert_eq!(summary.generations_run, 0);
        assert_eq!(summary.final_counts.live, 3);
        assert_eq!(sim.generation(), 0);
    }

    #[test]
    fn aggregation_strategies_agree() {
        let base = SimulationConfig::default()
            .gridsize(40)
            .init_pct(0.35)
            .num_iters(12)
            .seed(0xB2);
        let channel = run_counts(base.clone().worker_count(5));
        let locked = run_counts(base.worker_count(5).aggregation(Aggregation::Locked));
        assert_eq!(channel, locked);
        assert_eq!(channel.len(), 12);
    }

    #[test]
    fn idle_workers_still_synchronise() {
        let config = SimulationConfig::default()
            .gridsize(3)
            .worker_count(8)
            .num_iters(4)
            .init_pct(0.6)
            .seed(5);
        let serial = run_counts(config.clone().worker_count(1));
        assert_eq!(run_counts(config.clone()), serial);
        assert_eq!(run_counts(config.aggregation(Aggregation::Locked)), serial);
    }

    #[test]
    fn invalid_config_is_rejected_before_allocation() {
        let config = SimulationConfig::default().worker_count(0);
        assert!(Simulation::from_config(config).is_err());
    }

    #[test]
    fn slow_reporter_throttles_workers() {
        for aggregation in [Aggregation::Channel, Aggregation::Locked] {
            let finished = Arc::new(AtomicUsize::new(0));
            let subscriber =
                tracing_subscriber::registry().with(FinishedWorkers(Arc::clone(&finished)));
            let config = SimulationConfig::default()
                .gridsize(3)
                .worker_count(4)
                .num_iters(20_000)
                .init_pct(0.5)
                .aggregation(aggregation);
            let mut reporter = SlowReporter {
                finished: Arc::clone(&finished),
                finished_at_first: None,
                reports: 0,
            };

            tracing::subscriber::with_default(subscriber, || {
                let mut sim = Simulation::from_config(config).unwrap();
                sim.run(&mut reporter).unwrap();
            });

            assert_eq!(reporter.finished_at_first, Some(0), "{aggregation:?}");
            assert_eq!(reporter.reports, 20_000);
            assert_eq!(finished.load(Ordering::SeqCst), 4);
        }
    }

    #[test]
    fn report_channel_holds_one_generation() {
        assert_eq!(report_bound(Aggregation::Channel, 6), 6);
        assert_eq!(report_bound(Aggregation::Locked, 6), 1);
    }

    #[test]
    fn generation_overflow_is_an_error() {
        let mut sim = blinker(2, Aggregation::Channel);
        sim.run_for(1, &mut NullReporter).unwrap();
        let snapshot = sim.snapshot();
        let err = sim.run_for(u64::MAX, &mut NullReporter).unwrap_err();
        assert!(matches!(
            err,
            LifeError::GenerationOverflow {
                generation: 1,
                requested: u64::MAX
            }
        ));
        assert_eq!(sim.generation(), 1);
        assert_eq!(sim.snapshot(), snapshot);
    }
}
