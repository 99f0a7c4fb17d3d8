use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};

use super::sink::OutcomeSink;
use super::transform::{EncodeOptions, Imaging, transform};
use super::{FileError, Outcome, Task};

/// Turns one [`Task`] into an [`Outcome`].
///
/// Nothing escapes `process`: errors and panics become `Outcome::Failed`,
/// and every outcome is reported to the sink exactly once.
pub struct FileProcessor<'a, I: Imaging + ?Sized> {
    imaging: &'a I,
    sink: &'a dyn OutcomeSink,
}

impl<'a, I: Imaging + ?Sized> FileProcessor<'a, I> {
    pub fn new(imaging: &'a I, sink: &'a dyn OutcomeSink) -> Self {
        Self { imaging, sink }
    }

    pub fn process(&self, task: &Task) -> Outcome {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.execute(task)))
            .unwrap_or_else(|payload| Err(FileError::Panicked(panic_message(payload.as_ref()))))
            .unwrap_or_else(Outcome::Failed);

        if let Outcome::Failed(err) = &outcome {
            tracing::debug!("{}: {}", task.relative_path.display(), err);
        }
        self.sink.report(&task.relative_path, &outcome);
        outcome
    }

    fn execute(&self, task: &Task) -> Result<Outcome, FileError> {
        let image = self
            .imaging
            .decode(&task.source_path())
            .map_err(FileError::Decode)?;

        fs::create_dir_all(task.dest_dir()).map_err(FileError::CreateDir)?;

        let (width, height) = (image.width(), image.height());
        let (output, resized) = transform(self.imaging, image, task.max_width);

        let dest = task.dest_path();
        self.imaging
            .encode(&output, &dest, &EncodeOptions { quality: task.quality })
            .map_err(FileError::Save)?;

        tracing::debug!(
            "{}: {}x{} -> {}x{}",
            task.relative_path.display(),
            width,
            height,
            output.width(),
            output.height()
        );

        Ok(if resized {
            Outcome::Resized
        } else {
            Outcome::Unchanged
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
