//! # downsize - bounded-concurrency batch image downsizer
//!
//! Walks a source directory tree and writes every file to the mirrored path
//! under a destination tree. Images wider than a configured maximum are
//! resized (aspect ratio preserved); everything else is re-encoded unchanged.
//!
//! ## Features
//!
//! - **Bounded concurrency**: at most `max_workers` files are in flight, so peak
//!   memory stays proportional to the worker count, not the tree size
//! - **Failure isolation**: a corrupt file is reported and skipped, the rest of
//!   the tree is still processed
//! - **Layered configuration**: defaults, `downsize.toml`, `DOWNSIZE_*`
//!   environment variables and CLI flags
//!
//! ## Quick Start
//!
//! ```bash
//! downsize --source ./photos --dest ./web --width 1600 --quality 85
//! ```
//!
//! ## Library use
//!
//! ```rust,no_run
//! use downsize::config::ResizeConfig;
//! use downsize::pipeline::{CollectingSink, Dispatcher};
//!
//! let config = ResizeConfig::new("photos", "web").with_max_width(1600);
//! let sink = CollectingSink::new();
//! let report = Dispatcher::new(config)?.run(&sink)?;
//! println!("{} resized, {} failed", report.resized, report.failed);
//! # Ok::<(), downsize::pipeline::RunError>(())
//! ```

pub mod cli;
pub mod config;
pub mod parallel;
pub mod pipeline;

pub use cli::{Cli, Output};
pub use config::{DownsizeConfig, ResizeConfig};

/// Result type alias for downsize operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
