//! Sinks for per-generation statistics.

use std::io::{self, Write};

use crate::lockstep::GenerationReport;

/// Receives the aggregated counts of a run, always on the coordinating thread.
pub trait Reporter {
    /// Called once, before generation 1, with the seeded population.
    fn initial(&mut self, _live: u64, _total: u64) {}

    /// Called once per generation, in order, after every worker has contributed.
    fn generation(&mut self, report: &GenerationReport);
}

impl Reporter for Vec<GenerationReport> {
    fn generation(&mut self, report: &GenerationReport) {
        self.push(*report);
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn initial(&mut self, live: u64, total: u64) {
        (**self).initial(live, total);
    }

    fn generation(&mut self, report: &GenerationReport) {
        (**self).generation(report);
    }
}

/// Forwards to another reporter while keeping every generation report.
pub struct Recording<R: Reporter> {
    inner: R,
    reports: Vec<GenerationReport>,
}

impl<R: Reporter> Recording<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            reports: Vec::new(),
        }
    }

    pub fn reports(&self) -> &[GenerationReport] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<GenerationReport> {
        self.reports
    }
}

impl<R: Reporter> Reporter for Recording<R> {
    fn initial(&mut self, live: u64, total: u64) {
        self.inner.initial(live, total);
    }

    fn generation(&mut self, report: &GenerationReport) {
        self.reports.push(*report);
        self.inner.generation(report);
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn generation(&mut self, _report: &GenerationReport) {}
}

/// Plain-text progress lines.
///
/// The first write error is kept and stops further output; retrieve it with
/// [`ConsoleReporter::finish`].
pub struct ConsoleReporter<W: Write> {
    out: W,
    quiet: bool,
    error: Option<io::Error>,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            quiet: false,
            error: None,
        }
    }

    /// Only print the initial population.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn emit(&mut self, args: std::fmt::Arguments<'_>) {
        if self.error.is_none() {
            if let Err(err) = self.out.write_fmt(args) {
                self.error = Some(err);
            }
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn initial(&mut self, live: u64, total: u64) {
        self.emit(format_args!(
            "Initial grid has {live} live cells out of {total}\n"
        ));
    }

    fn generation(&mut self, report: &GenerationReport) {
        if self.quiet {
            return;
        }
        let GenerationReport { generation, counts } = report;
        self.emit(format_args!(
            "Iteration {generation}...\n  Counters- living: {}, died: {}, born: {}\n",
            counts.live, counts.deaths, counts.births
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::{ConsoleReporter, Recording, Reporter};
    use crate::lockstep::{GenerationCounts, GenerationReport};

    #[test]
    fn console_output_format() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter.initial(7, 25);
        reporter.generation(&GenerationReport {
            generation: 1,
            counts: GenerationCounts {
                live: 6,
                births: 2,
                deaths: 3,
            },
        });
        let text = String::from_utf8(reporter.finish().unwrap()).unwrap();
        assert_eq!(
            text,
            "Initial grid has 7 live cells out of 25\n\
             Iteration 1...\n  Counters- living: 6, died: 3, born: 2\n"
        );
    }

    #[test]
    fn quiet_console_skips_generations() {
        let mut reporter = ConsoleReporter::new(Vec::new()).quiet(true);
        reporter.initial(1, 4);
        reporter.generation(&GenerationReport {
            generation: 1,
            counts: GenerationCounts::default(),
        });
        let text = String::from_utf8(reporter.finish().unwrap()).unwrap();
        assert_eq!(text, "Initial grid has 1 live cells out of 4\n");
    }

    #[test]
    fn recording_forwards_and_keeps_reports() {
        let mut console = ConsoleReporter::new(Vec::new());
        let mut recording = Recording::new(&mut console);
        recording.initial(2, 9);
        for generation in 1..=3 {
            recording.generation(&GenerationReport {
                generation,
                counts: GenerationCounts {
                    live: generation,
                    ..GenerationCounts::default()
                },
            });
        }
        let generations: Vec<u64> = recording.reports().iter().map(|r| r.generation).collect();
        assert_eq!(generations, vec![1, 2, 3]);
        assert_eq!(recording.into_reports().len(), 3);

        let text = String::from_utf8(console.finish().unwrap()).unwrap();
        assert!(text.starts_with("Initial grid has 2 live cells out of 9\n"));
        assert!(text.contains("Iteration 3...\n  Counters- living: 3, died: 0, born: 0\n"));
    }
}
