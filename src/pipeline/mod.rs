//! Tree-walk-and-transform pipeline
//!
//! ```text
//! Dispatcher (walk) ──acquire──▶ AdmissionGate ──spawn──▶ FileProcessor
//!                                                         │ decode
//!                                                         │ create_dir_all
//!                                                         │ transform
//!                                                         │ encode
//!                                                         ▼
//!                                                     OutcomeSink
//! ```
//!
//! Per-file failures are turned into [`Outcome::Failed`] and reported; only
//! structural problems with the walk itself surface as a [`RunError`].

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub mod dispatcher;
pub mod processor;
pub mod sink;
pub mod task;
pub mod transform;

pub use dispatcher::Dispatcher;
pub use processor::FileProcessor;
pub use sink::{CollectingSink, OutcomeSink, Record};
pub use task::{Outcome, Task};
pub use transform::{EncodeOptions, ImageCrate, Imaging, transform};

/// Why a single file could not be processed
#[derive(Debug, Error)]
pub enum FileError {
    #[error("open/decode error: {0}")]
    Decode(#[source] image::ImageError),

    #[error("directory creation error: {0}")]
    CreateDir(#[source] std::io::Error),

    #[error("save error: {0}")]
    Save(#[source] image::ImageError),

    #[error("worker panicked: {0}")]
    Panicked(String),
}

/// Errors that fail a whole run
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("source is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The walk aborted. Tasks spawned before the error still ran; their
    /// tallies are kept in `report`.
    #[error("walk error: {source}")]
    Walk {
        #[source]
        source: ignore::Error,
        report: Box<RunReport>,
    },

    #[error("a worker thread panicked outside of task processing")]
    WorkerPanicked,
}

/// Aggregate results of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Regular files that were dispatched
    pub discovered: usize,
    pub resized: usize,
    pub unchanged: usize,
    pub failed: usize,
    /// Highest number of tasks admitted at once
    pub peak_admitted: usize,
    /// Discovery stopped early because of cancellation
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl RunReport {
    /// Files that reached an outcome
    pub fn processed(&self) -> usize {
        self.resized + self.unchanged + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
