//! Append-only JSON-lines progress log.

use crate::progress::events::{ProgressEvent, ProgressEventType};
use crate::types::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of the progress log inside the session output directory
pub const PROGRESS_FILE: &str = "progress.json";

/// Session-wide progress log shared by every concurrently running task.
///
/// Each event is serialized to one line and written with a single
/// append-mode `write_all` followed by a flush. Nothing is buffered in
/// memory between events, so concurrent writers never interleave partial
/// lines and previously written lines are never touched.
///
/// Writes are synchronous `std::fs` calls on the calling task: an event is on
/// disk when the emitter returns, and a slow output filesystem delays every
/// task of the session.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    path: PathBuf,
}

impl ProgressSink {
    /// Create a sink writing to `{output_dir}/progress.json`, creating the directory if needed
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;

        Ok(Self {
            path: output_dir.join(PROGRESS_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event to the log.
    pub fn record(&self, event: &ProgressEvent) -> Result<()> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        file.flush()?;

        tracing::debug!(
            event_type = %event.event_type,
            task = event.task.as_deref().unwrap_or("-"),
            progress = ?event.progress,
            "{}",
            event.details
        );
        Ok(())
    }

    /// Append an event, logging instead of failing when the write does not succeed.
    pub fn emit(&self, event: ProgressEvent) {
        if let Err(e) = self.record(&event) {
            tracing::warn!(
                path = %self.path.display(),
                event_type = %event.event_type,
                "Failed to write progress event: {}",
                e
            );
        }
    }

    pub fn phase_start(&self, phase: &str, details: &str) {
        self.emit(ProgressEvent::new(
            ProgressEventType::PhaseStart,
            phase,
            None,
            details,
            None,
        ));
    }

    pub fn phase_complete(&self, phase: &str, details: &str) {
        self.emit(ProgressEvent::new(
            ProgressEventType::PhaseComplete,
            phase,
            None,
            details,
            Some(100),
        ));
    }

    pub fn task_start(&self, phase: &str, task: &str, details: &str) {
        self.emit(ProgressEvent::new(
            ProgressEventType::TaskStart,
            phase,
            Some(task.to_string()),
            details,
            None,
        ));
    }

    pub fn task_complete(&self, phase: &str, task: &str, details: &str, progress: Option<u8>) {
        self.emit(ProgressEvent::new(
            ProgressEventType::TaskComplete,
            phase,
            Some(task.to_string()),
            details,
            progress,
        ));
    }

    pub fn update(&self, phase: &str, task: Option<&str>, details: &str, percent: u8) {
        self.emit(ProgressEvent::new(
            ProgressEventType::ProgressUpdate,
            phase,
            task.map(str::to_string),
            details,
            Some(percent),
        ));
    }

    /// Read the most recent `last_n` events back from the log.
    ///
    /// A missing log yields no events; lines that do not parse are skipped.
    pub fn recent_events(&self, last_n: usize) -> Result<Vec<ProgressEvent>> {
        read_events(&self.path, last_n)
    }
}

/// Read the last `last_n` events from a progress log file.
pub fn read_events(path: &Path, last_n: usize) -> Result<Vec<ProgressEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)?;
    let events: Vec<ProgressEvent> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();

    let skip = events.len().saturating_sub(last_n);
    Ok(events.into_iter().skip(skip).collect())
}
