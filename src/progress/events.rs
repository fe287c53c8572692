//! Progress event schema.
//!
//! One event is one line of the progress log. Field names and the
//! `SCREAMING_SNAKE_CASE` event types are read by external monitors, so
//! they are part of the on-disk contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressEventType {
    /// Starting a major phase
    PhaseStart,
    /// Finished a major phase
    PhaseComplete,
    /// Starting a task within a phase
    TaskStart,
    /// A task reached a terminal state (success, error or timeout)
    TaskComplete,
    /// Percentage or status update
    ProgressUpdate,
}

impl fmt::Display for ProgressEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProgressEventType::PhaseStart => "PHASE_START",
            ProgressEventType::PhaseComplete => "PHASE_COMPLETE",
            ProgressEventType::TaskStart => "TASK_START",
            ProgressEventType::TaskComplete => "TASK_COMPLETE",
            ProgressEventType::ProgressUpdate => "PROGRESS_UPDATE",
        };
        f.write_str(s)
    }
}

/// A single progress event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: ProgressEventType,
    /// e.g. "literature_review"
    pub phase: String,
    /// e.g. "subtopic_1"
    pub task: Option<String>,
    /// Human-readable description
    pub details: String,
    /// 0-100 if applicable
    pub progress: Option<u8>,
}

impl ProgressEvent {
    pub fn new(
        event_type: ProgressEventType,
        phase: impl Into<String>,
        task: Option<String>,
        details: impl Into<String>,
        progress: Option<u8>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            phase: phase.into(),
            task,
            details: details.into(),
            progress: progress.map(|p| p.min(100)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_wire_names() {
        let event = ProgressEvent::new(
            ProgressEventType::TaskComplete,
            "literature_review",
            Some("subtopic_2".to_string()),
            "Complete",
            Some(50),
        );

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event_type"], "TASK_COMPLETE");
        assert_eq!(value["phase"], "literature_review");
        assert_eq!(value["task"], "subtopic_2");
        assert_eq!(value["progress"], 50);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_absent_task_and_progress_serialize_as_null() {
        let event = ProgressEvent::new(
            ProgressEventType::PhaseStart,
            "literature_review",
            None,
            "Researching 3 subtopics",
            None,
        );

        let value = serde_json::to_value(&event).unwrap();
        assert!(value["task"].is_null());
        assert!(value["progress"].is_null());
    }

    #[test]
    fn test_progress_is_capped_at_100() {
        let event = ProgressEvent::new(ProgressEventType::ProgressUpdate, "p", None, "", Some(140));
        assert_eq!(event.progress, Some(100));
    }

    #[test]
    fn test_display_matches_wire_name() {
        assert_eq!(ProgressEventType::PhaseComplete.to_string(), "PHASE_COMPLETE");
    }
}
