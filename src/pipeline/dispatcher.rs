use ignore::{Walk, WalkBuilder};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use super::processor::FileProcessor;
use super::sink::OutcomeSink;
use super::task::{Outcome, Task, relative_to};
use super::transform::{ImageCrate, Imaging};
use super::{RunError, RunReport};
use crate::config::ResizeConfig;
use crate::parallel::{AdmissionGate, CompletionTracker};

/// Walks the source tree and fans each regular file out to a worker thread,
/// never admitting more than `max_workers` files at once.
///
/// # Flow
///
/// ```text
/// for entry in walk(source_root):        (depth-first, siblings sorted by name)
///     directory?        → descend, no task
///     not a file?       → skip
///     cancelled?        → stop discovery
///     gate.acquire()    → blocks the walk while all slots are taken
///     spawn worker      → Permit + Ticket dropped when the worker exits
/// tracker.wait()                         (every spawned worker finished)
/// ```
///
/// A walk error stops discovery; workers already spawned still finish and the
/// error is returned afterwards together with their tallies.
pub struct Dispatcher<I: Imaging = ImageCrate> {
    config: ResizeConfig,
    imaging: I,
    cancel: Option<Arc<AtomicBool>>,
}

impl Dispatcher<ImageCrate> {
    /// Dispatcher using the `image` crate with the configured filter
    pub fn new(config: ResizeConfig) -> Result<Self, RunError> {
        let imaging = ImageCrate::new(config.filter);
        Self::with_imaging(config, imaging)
    }
}

impl<I: Imaging> Dispatcher<I> {
    /// Dispatcher with a custom imaging backend. The configuration is
    /// validated here, before any concurrency starts.
    pub fn with_imaging(config: ResizeConfig, imaging: I) -> Result<Self, RunError> {
        config.validate()?;
        Ok(Self {
            config,
            imaging,
            cancel: None,
        })
    }

    /// Stop discovering new files once `flag` is set. Files already admitted
    /// are still processed.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &ResizeConfig {
        &self.config
    }

    pub fn run(&self, sink: &dyn OutcomeSink) -> Result<RunReport, RunError> {
        let started = Instant::now();
        let source_root = &self.config.source_root;

        if source_root.exists() && !source_root.is_dir() {
            return Err(RunError::NotADirectory(source_root.clone()));
        }

        tracing::info!(
            "Processing {} -> {} ({} workers, max width {})",
            source_root.display(),
            self.config.dest_root.display(),
            self.config.max_workers,
            self.config.max_width
        );

        let gate = AdmissionGate::new(self.config.max_workers);
        let tracker = CompletionTracker::new();
        let tally = Tally::default();
        let processor = FileProcessor::new(&self.imaging, sink);

        let mut discovered = 0;
        let mut cancelled = false;
        let mut walk_error = None;

        let scoped = crossbeam::thread::scope(|s| {
            for entry in self.walker() {
                if self.is_cancelled() {
                    tracing::info!("Cancelled, no further files will be dispatched");
                    cancelled = true;
                    break;
                }

                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        tracing::warn!("Walk error: {}", err);
                        walk_error = Some(err);
                        break;
                    }
                };

                if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                    continue;
                }
                let Some(relative) = relative_to(source_root, entry.path()) else {
                    continue;
                };

                let task = Task::new(&self.config, relative);
                let permit = gate.acquire();
                let ticket = tracker.register();
                discovered += 1;

                let processor = &processor;
                let tally = &tally;
                s.spawn(move |_| {
                    let _permit = permit;
                    let _ticket = ticket;
                    tally.record(&processor.process(&task));
                });
            }

            tracker.wait();
        });

        if scoped.is_err() {
            return Err(RunError::WorkerPanicked);
        }

        let report = RunReport {
            discovered,
            resized: tally.resized.load(Ordering::SeqCst),
            unchanged: tally.unchanged.load(Ordering::SeqCst),
            failed: tally.failed.load(Ordering::SeqCst),
            peak_admitted: gate.peak(),
            cancelled,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            "Finished in {:.2}s: {} resized, {} unchanged, {} failed (peak {} workers)",
            report.elapsed.as_secs_f64(),
            report.resized,
            report.unchanged,
            report.failed,
            report.peak_admitted
        );

        match walk_error {
            Some(source) => Err(RunError::Walk {
                source,
                report: Box::new(report),
            }),
            None => Ok(report),
        }
    }

    fn walker(&self) -> Walk {
        let mut builder = WalkBuilder::new(&self.config.source_root);
        builder
            // Every regular file counts, hidden or ignored alike
            .standard_filters(false)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name(|a, b| a.cmp(b));

        // Never feed our own output back in when dest is nested in source
        if let Some(excluded) = self.config.nested_dest() {
            tracing::debug!("Skipping destination subtree {}", excluded.display());
            builder.filter_entry(move |entry| !entry.path().starts_with(&excluded));
        }

        builder.build()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Default)]
struct Tally {
    resized: AtomicUsize,
    unchanged: AtomicUsize,
    failed: AtomicUsize,
}

impl Tally {
    fn record(&self, outcome: &Outcome) {
        let counter = match outcome {
            Outcome::Resized => &self.resized,
            Outcome::Unchanged => &self.unchanged,
            Outcome::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }
}
