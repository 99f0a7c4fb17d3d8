//! Configuration management for downsize
//!
//! Settings are merged from several layers (see [`core::DownsizeConfig`]) and
//! then validated into an immutable [`ResizeConfig`] that is handed to the
//! pipeline. Nothing is read from process-wide state after validation.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

pub mod core;

pub use core::DownsizeConfig;

/// Default maximum output width in pixels
pub const DEFAULT_MAX_WIDTH: u32 = 1920;

/// Default JPEG quality
pub const DEFAULT_QUALITY: u8 = 100;

/// Resampling filter used when an image is downsized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    /// Nearest neighbour (fastest, blocky)
    Nearest,
    /// Linear filter
    Triangle,
    /// Cubic filter
    CatmullRom,
    /// Gaussian filter
    Gaussian,
    /// Lanczos with window 3 (sharpest downscale)
    #[default]
    Lanczos3,
}

/// Raw, merged settings before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Source directory to walk
    pub source: Option<PathBuf>,

    /// Destination directory that mirrors the source tree
    pub dest: Option<PathBuf>,

    /// Maximum concurrently processed files (unset = logical CPU count)
    pub max_workers: Option<usize>,

    /// Images wider than this are downsized
    pub max_width: u32,

    /// JPEG quality (0-100)
    pub quality: u8,

    /// Resampling filter
    pub filter: ResampleFilter,

    /// Follow symbolic links during the walk
    pub follow_symlinks: bool,

    /// Treat any per-file failure as a failed run
    pub fail_on_error: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: None,
            dest: None,
            max_workers: None,
            max_width: DEFAULT_MAX_WIDTH,
            quality: DEFAULT_QUALITY,
            filter: ResampleFilter::default(),
            follow_symlinks: false,
            fail_on_error: false,
        }
    }
}

/// Errors that make a configuration unusable. All of them are reported
/// before any file is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("source path must be specified")]
    MissingSource,

    #[error("destination path must be specified")]
    MissingDestination,

    #[error("max workers must be a positive integer (got {0})")]
    InvalidWorkers(usize),

    #[error("max width must be a positive integer (got {0})")]
    InvalidWidth(u32),

    #[error("quality must be between 0 and 100 (got {0})")]
    InvalidQuality(u8),

    #[error("destination must differ from source: {}", .0.display())]
    SameDirectory(PathBuf),

    #[error("config file not found: {}", .0.display())]
    MissingConfigFile(PathBuf),

    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),
}

/// Validated, immutable run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeConfig {
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub max_workers: usize,
    pub max_width: u32,
    /// JPEG quality; `None` keeps the encoder's own default
    pub quality: Option<u8>,
    pub filter: ResampleFilter,
    pub follow_symlinks: bool,
    pub fail_on_error: bool,
}

impl ResizeConfig {
    /// Build a configuration with defaults for everything but the two roots.
    pub fn new(source_root: impl Into<PathBuf>, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            dest_root: dest_root.into(),
            max_workers: crate::parallel::default_workers(),
            max_width: DEFAULT_MAX_WIDTH,
            quality: Some(DEFAULT_QUALITY),
            filter: ResampleFilter::default(),
            follow_symlinks: false,
            fail_on_error: false,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = max_width;
        self
    }

    pub fn with_quality(mut self, quality: Option<u8>) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_root.as_os_str().is_empty() {
            return Err(ConfigError::MissingSource);
        }
        if self.dest_root.as_os_str().is_empty() {
            return Err(ConfigError::MissingDestination);
        }
        if self.max_workers == 0 {
            return Err(ConfigError::InvalidWorkers(self.max_workers));
        }
        if self.max_width == 0 {
            return Err(ConfigError::InvalidWidth(self.max_width));
        }
        if let Some(quality) = self.quality {
            if quality > 100 {
                return Err(ConfigError::InvalidQuality(quality));
            }
        }
        if same_directory(&self.source_root, &self.dest_root) {
            return Err(ConfigError::SameDirectory(self.dest_root.clone()));
        }
        Ok(())
    }

    /// Where the destination sits inside the source tree, spelled relative to
    /// `source_root` so it can be matched against walked entry paths.
    ///
    /// Both roots are resolved before comparing, so `x/../in/out` is still
    /// seen as nested in `in`.
    pub fn nested_dest(&self) -> Option<PathBuf> {
        let source = resolve(&self.source_root);
        let dest = resolve(&self.dest_root);
        let inner = dest.strip_prefix(&source).ok()?;
        Some(self.source_root.join(inner))
    }
}

impl TryFrom<Settings> for ResizeConfig {
    type Error = ConfigError;

    fn try_from(settings: Settings) -> Result<Self, Self::Error> {
        let source_root = settings.source.ok_or(ConfigError::MissingSource)?;
        let dest_root = settings.dest.ok_or(ConfigError::MissingDestination)?;

        let config = ResizeConfig {
            source_root,
            dest_root,
            max_workers: settings
                .max_workers
                .unwrap_or_else(crate::parallel::default_workers),
            max_width: settings.max_width,
            quality: Some(settings.quality),
            filter: settings.filter,
            follow_symlinks: settings.follow_symlinks,
            fail_on_error: settings.fail_on_error,
        };
        config.validate()?;
        Ok(config)
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    a == b || resolve(a) == resolve(b)
}

/// Absolute path with `.` and `..` removed and the deepest existing ancestor
/// canonicalized. Works for destinations that do not exist yet.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }

    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let normalized = normalize(&absolute);

    let mut existing = normalized.as_path();
    let mut missing = Vec::new();
    while let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) {
        missing.push(name);
        existing = parent;
        if let Ok(canonical) = std::fs::canonicalize(existing) {
            return missing.iter().rev().fold(canonical, |acc, name| acc.join(name));
        }
    }
    normalized
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
