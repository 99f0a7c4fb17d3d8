//! Command-line interface for downsize
//!
//! Parses flags with clap, merges them over the file/env configuration layers
//! and drives a single [`Dispatcher`] run.

use anyhow::{Result, bail};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

mod output;

pub use output::Output;

use crate::config::{DownsizeConfig, ResampleFilter};
use crate::pipeline::{Dispatcher, RunError};

/// downsize - shrink every oversized image in a directory tree
#[derive(Parser, Debug)]
#[command(
    name = "downsize",
    version,
    about = "Downsize wide images from a source tree into a mirrored destination tree",
    long_about = "Walks SOURCE recursively and writes every file to the same relative path \
                  under DEST. Images wider than --width are resized (aspect ratio kept), \
                  everything else is re-encoded as-is. Files are processed concurrently, \
                  at most --threads at a time."
)]
pub struct Cli {
    /// Path to source folder
    #[arg(short, long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Path to destination folder
    #[arg(short, long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Maximum number of images processed concurrently [default: logical CPUs]
    #[arg(short, long, value_name = "N")]
    pub threads: Option<usize>,

    /// Result image width will be not more than this value [default: 1920]
    #[arg(short, long, value_name = "PX")]
    pub width: Option<u32>,

    /// Output quality from 0 to 100, only applied to JPEG images [default: 100]
    #[arg(long, value_name = "Q", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub quality: Option<u8>,

    /// Resampling filter used for downsizing [default: lanczos3]
    #[arg(long, value_enum)]
    pub filter: Option<ResampleFilter>,

    /// Follow symbolic links while walking the source tree
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Exit with a failure status if any file could not be processed
    #[arg(long)]
    pub fail_on_error: bool,

    /// Use custom configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress per-file success lines and logs
    #[arg(short, long)]
    pub quiet: bool,
}

/// Flags that were given explicitly, in config-key form
#[derive(Debug, Serialize)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dest: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<ResampleFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    follow_symlinks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fail_on_error: Option<bool>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            source: self.source.clone(),
            dest: self.dest.clone(),
            max_workers: self.threads,
            max_width: self.width,
            quality: self.quality,
            filter: self.filter,
            // Unset boolean flags must not override file/env values
            follow_symlinks: self.follow_symlinks.then_some(true),
            fail_on_error: self.fail_on_error.then_some(true),
        }
    }

    /// Execute one run
    pub fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);
        let output = Output::new(self.verbose > 0, self.quiet);

        let config =
            DownsizeConfig::load_with(self.config.as_deref(), Some(self.overrides()))?.resolve()?;

        if output.is_verbose() {
            output.verbose(&format!("Source:      {}", config.source_root.display()));
            output.verbose(&format!("Destination: {}", config.dest_root.display()));
            output.verbose(&format!(
                "Workers: {}, max width: {}px, quality: {}, filter: {:?}",
                config.max_workers,
                config.max_width,
                config
                    .quality
                    .map_or_else(|| "default".to_string(), |q| q.to_string()),
                config.filter
            ));
        }

        let fail_on_error = config.fail_on_error;
        let dispatcher = Dispatcher::new(config)?;

        let report = match dispatcher.run(&output) {
            Ok(report) => report,
            Err(err) => {
                if let RunError::Walk { report, .. } = &err {
                    output.run_summary(report);
                }
                return Err(err.into());
            }
        };

        output.run_summary(&report);

        if fail_on_error && report.has_failures() {
            bail!("{} of {} files failed", report.failed, report.discovered);
        }
        Ok(())
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,ignore=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,ignore=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // Logs share stderr with failure lines; stdout carries per-file results
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
