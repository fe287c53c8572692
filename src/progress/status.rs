//! Session status file.
//!
//! A single `status.json` per output directory answers "what state is this
//! research session in?" for operators and monitoring tools. It is replaced
//! atomically on every update (temp file + rename), unlike the progress log
//! which only ever grows.

use crate::types::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File name of the status file inside the session output directory
pub const STATUS_FILE: &str = "status.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No research started
    New,
    /// Session created, providers being built
    Initializing,
    /// Research in progress
    Running,
    /// Research paused (can resume)
    Paused,
    /// Research failed
    Error,
    /// Research finished
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::New => "new",
            SessionStatus::Initializing => "initializing",
            SessionStatus::Running => "running",
            SessionStatus::Paused => "paused",
            SessionStatus::Error => "error",
            SessionStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Contents of `status.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub session_id: Option<Uuid>,
    pub status: SessionStatus,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reads and writes the status file of one session.
#[derive(Debug, Clone)]
pub struct StatusManager {
    path: PathBuf,
    session_id: Uuid,
}

impl StatusManager {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            path: output_dir.as_ref().join(STATUS_FILE),
            session_id: Uuid::new_v4(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Replace the status file with `status`.
    pub fn update_status(&self, status: SessionStatus, error: Option<&str>) -> Result<()> {
        let record = StatusRecord {
            session_id: Some(self.session_id),
            status,
            last_updated: Utc::now(),
            error: error.map(str::to_string),
        };

        let data = serde_json::to_vec_pretty(&record)?;
        atomic_write(&self.path, &data)?;

        tracing::info!(session_id = %self.session_id, status = %status, "Session status updated");
        Ok(())
    }

    /// Current status; a missing file means the session has not started.
    pub fn get_status(&self) -> Result<StatusRecord> {
        read_status(&self.path)
    }
}

/// Read a status file, reporting `new` when it does not exist.
pub fn read_status(path: &Path) -> Result<StatusRecord> {
    if !path.exists() {
        return Ok(StatusRecord {
            session_id: None,
            status: SessionStatus::New,
            last_updated: Utc::now(),
            error: None,
        });
    }

    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Write to a `.tmp` sibling, then rename over the target.
fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reports_new() {
        let temp_dir = TempDir::new().unwrap();
        let manager = StatusManager::new(temp_dir.path());

        let record = manager.get_status().unwrap();
        assert_eq!(record.status, SessionStatus::New);
        assert!(record.session_id.is_none());
    }

    #[test]
    fn test_update_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let manager = StatusManager::new(temp_dir.path());

        manager.update_status(SessionStatus::Running, None).unwrap();
        let record = manager.get_status().unwrap();

        assert_eq!(record.status, SessionStatus::Running);
        assert_eq!(record.session_id, Some(manager.session_id()));
        assert!(record.error.is_none());
        assert!(!temp_dir.path().join("status.tmp").exists());
    }

    #[test]
    fn test_error_status_keeps_message() {
        let temp_dir = TempDir::new().unwrap();
        let manager = StatusManager::new(temp_dir.path());

        manager
            .update_status(SessionStatus::Error, Some("Unknown research backend: bing"))
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(manager.path()).unwrap()).unwrap();
        assert_eq!(raw["status"], "error");
        assert_eq!(raw["error"], "Unknown research backend: bing");
    }

    #[test]
    fn test_update_replaces_previous_status() {
        let temp_dir = TempDir::new().unwrap();
        let manager = StatusManager::new(temp_dir.path());

        manager.update_status(SessionStatus::Initializing, None).unwrap();
        manager.update_status(SessionStatus::Completed, None).unwrap();

        assert_eq!(manager.get_status().unwrap().status, SessionStatus::Completed);
    }
}
