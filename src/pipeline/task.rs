use std::fmt;
use std::path::{Path, PathBuf};

use super::FileError;
use crate::config::ResizeConfig;

/// One discovered file's unit of work. Built by the dispatcher and consumed
/// whole by a single processor invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub relative_path: PathBuf,
    pub max_width: u32,
    pub quality: Option<u8>,
}

impl Task {
    pub fn new(config: &ResizeConfig, relative_path: impl Into<PathBuf>) -> Self {
        Self {
            source_root: config.source_root.clone(),
            dest_root: config.dest_root.clone(),
            relative_path: relative_path.into(),
            max_width: config.max_width,
            quality: config.quality,
        }
    }

    /// Absolute path of the file to read
    pub fn source_path(&self) -> PathBuf {
        self.source_root.join(&self.relative_path)
    }

    /// Mirrored path of the file to write
    pub fn dest_path(&self) -> PathBuf {
        self.dest_root.join(&self.relative_path)
    }

    /// Directory that has to exist before the destination can be written.
    /// Falls back to the destination root for a bare file name.
    pub fn dest_dir(&self) -> PathBuf {
        let dest = self.dest_path();
        match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => self.dest_root.clone(),
        }
    }
}

/// Result of processing one file
#[derive(Debug)]
pub enum Outcome {
    Resized,
    Unchanged,
    Failed(FileError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }

    /// Status label used in per-file output lines
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Resized => "resized",
            Outcome::Unchanged => "not resized",
            Outcome::Failed(_) => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Failed(err) => write!(f, "{}: {}", self.label(), err),
            _ => f.write_str(self.label()),
        }
    }
}

/// Relative path of `path` below `root`, if it lives there
pub fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    path.strip_prefix(root).ok().map(Path::to_path_buf)
}
