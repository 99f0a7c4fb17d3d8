//! Console output for downsize
//!
//! Per-file lines go to stdout (successes) and stderr (failures). Everything
//! else (summaries, config echo) is styled and only shown when asked for.

use console::style;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::pipeline::{Outcome, OutcomeSink, RunReport};

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
    // Serializes per-file lines coming from worker threads
    lock: Mutex<()>,
}

impl Output {
    /// Create a new output handler
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            lock: Mutex::new(()),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("⚠").yellow().for_stderr(), message);
        }
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    /// Get verbose mode status
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Print a section header with enhanced styling
    pub fn section_header(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", style(title).bold().cyan());
        }
    }

    /// Print summary statistics with enhanced styling
    pub fn summary_stats(&self, label: &str, value: usize) {
        if !self.quiet {
            println!("  {:<12} {}", style(label).dim(), style(value.to_string()).bold());
        }
    }

    /// Print the end-of-run summary (verbose mode only)
    pub fn run_summary(&self, report: &RunReport) {
        if !self.verbose {
            return;
        }

        self.section_header("Summary");
        self.summary_stats("Files", report.discovered);
        self.summary_stats("Resized", report.resized);
        self.summary_stats("Unchanged", report.unchanged);
        self.summary_stats("Failed", report.failed);
        self.summary_stats("Peak workers", report.peak_admitted);

        if report.cancelled {
            self.warning("Run was cancelled before the whole tree was walked");
        }
        if report.has_failures() {
            self.warning(&format!("{} file(s) could not be processed", report.failed));
        } else {
            self.success(&format!("Done in {:.2}s", report.elapsed.as_secs_f64()));
        }
    }
}

impl OutcomeSink for Output {
    fn report(&self, path: &Path, outcome: &Outcome) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        match outcome {
            Outcome::Failed(err) => {
                eprintln!(
                    "{} {}: {}",
                    style("error:").red().bold().for_stderr(),
                    path.display(),
                    err
                );
            }
            Outcome::Resized if !self.quiet => {
                println!("{} {}", style("resized:").green(), path.display());
            }
            Outcome::Unchanged if !self.quiet => {
                println!("{} {}", style("not resized:").dim(), path.display());
            }
            _ => {}
        }
    }
}
