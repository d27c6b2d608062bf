//! Timestamp-named frame files.

use chrono::{Local, NaiveDateTime};
use rover_common::camera::{CaptureError, Frame};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name timestamp format (second granularity).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// One captured frame and the local time it was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    /// Local wall-clock time of the capture.
    pub timestamp: NaiveDateTime,
    /// The frame itself.
    pub frame: Frame,
}

impl CaptureRecord {
    /// Stamp `frame` with the current local time.
    pub fn now(frame: Frame) -> Self {
        Self {
            timestamp: Local::now().naive_local(),
            frame,
        }
    }
}

/// `YYYYMMDD_HHMMSS` label for `timestamp`.
pub fn timestamp_label(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Writes frames as `<prefix>_<label>.<ext>` under one directory.
///
/// Two frames within the same second map to the same name; the later one
/// replaces the earlier.
#[derive(Debug, Clone)]
pub struct FrameStore {
    dir: PathBuf,
    prefix: String,
}

impl FrameStore {
    /// Store rooted at `dir` using `prefix` for file names.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory if needed. An existing directory is fine.
    pub fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    /// File name for `record`.
    pub fn file_name(&self, record: &CaptureRecord) -> String {
        format!(
            "{}_{}.{}",
            self.prefix,
            timestamp_label(&record.timestamp),
            record.frame.format.extension()
        )
    }

    /// Write `record` and return the path written.
    ///
    /// # Errors
    /// Returns `CaptureError::WriteFailed` if the file cannot be written.
    pub fn write(&self, record: &CaptureRecord) -> Result<PathBuf, CaptureError> {
        let path = self.dir.join(self.file_name(record));
        fs::write(&path, &record.frame.data)
            .map_err(|e| CaptureError::WriteFailed(format!("{}: {}", path.display(), e)))?;
        Ok(path)
    }
}
