//! Flat CSV outcome file
//!
//! The file is opened in append mode for every record, so rows written by
//! earlier sessions are never touched. A header row is written first when
//! the file is missing or empty.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{COLUMNS, OutcomeRecord, OutcomeSink, RecorderError};

/// Appends one CSV row per outcome record
#[derive(Debug, Clone)]
pub struct CsvRecorder {
    path: PathBuf,
}

impl CsvRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn needs_header(&self) -> bool {
        fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true)
    }

    fn io_error(&self, source: std::io::Error) -> RecorderError {
        RecorderError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl OutcomeSink for CsvRecorder {
    fn append(&mut self, record: &OutcomeRecord) -> Result<(), RecorderError> {
        let mut out = String::new();
        if self.needs_header() {
            out.push_str(&header());
            out.push('\n');
        }
        out.push_str(&row(record));
        out.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(out.as_bytes()).map_err(|e| self.io_error(e))?;

        log::debug!(
            "Appended trial {} for {} to {}",
            record.trial_index,
            record.participant_id,
            self.path.display()
        );
        Ok(())
    }
}

/// Header line, without the trailing newline
pub fn header() -> String {
    COLUMNS.join(",")
}

/// Record rendered in column order, without the trailing newline
pub fn row(record: &OutcomeRecord) -> String {
    [
        field(&record.participant_id),
        record.trial_index.to_string(),
        field(&record.condition_name),
        // Debug keeps the decimal point on whole numbers ("8.0")
        format!("{:?}", record.jump_power),
        record.pipe_distance.to_string(),
        record.hole_size.to_string(),
        record.survival_time_ms.to_string(),
    ]
    .join(",")
}

/// Quote a free-text field when it would break the row
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
