//! Per-provider bookkeeping of in-flight research tasks.
//!
//! Each provider instance owns one [`TaskRegistry`]. A task enters the registry
//! on submission and leaves it on its single terminal transition (completed,
//! failed or timed out). Later lookups of the same id behave as unknown.

use crate::types::{AppError, ProgressState, Result, TaskProgress};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Submitted,
    Polling,
    Completed,
    Failed,
    TimedOut,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::TimedOut
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Submitted => "submitted",
            TaskState::Polling => "polling",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}

/// Sub-action counts observed on the last poll of a background job.
///
/// A sub-action is the backend's unit of work, e.g. one web search or page fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSnapshot {
    pub total_actions: usize,
    pub completed_actions: usize,
    /// Human-readable description of the latest sub-action
    pub current_action: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResearchTask {
    pub task_id: String,
    pub query: String,
    pub backend_job_ref: Option<String>,
    pub state: TaskState,
    pub started_at: DateTime<Utc>,
    pub result: Option<String>,
    pub error: Option<String>,
    pub snapshot: Option<JobSnapshot>,
    started: Instant,
    last_percent: u8,
}

impl ResearchTask {
    fn new(task_id: &str, query: &str, backend_job_ref: Option<String>) -> Self {
        Self {
            task_id: task_id.to_string(),
            query: query.to_string(),
            backend_job_ref,
            state: TaskState::Submitted,
            started_at: Utc::now(),
            result: None,
            error: None,
            snapshot: None,
            started: Instant::now(),
            last_percent: 0,
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Progress estimate from the latest snapshot.
    ///
    /// 5% while no sub-actions are recorded, then `5 + 90 * completed / total`,
    /// so a running task stays within 5..=95. The value never drops below what
    /// was last reported for this task.
    pub fn progress(&mut self) -> TaskProgress {
        let (status, details, percent) = match &self.snapshot {
            Some(snap) if snap.total_actions > 0 => {
                let completed = snap.completed_actions.min(snap.total_actions);
                let percent = 5 + (90 * completed) / snap.total_actions;
                let details = snap.current_action.clone().unwrap_or_else(|| {
                    format!("{}/{} searches complete", completed, snap.total_actions)
                });
                (ProgressState::Researching, details, percent as u8)
            }
            _ => (
                ProgressState::Initializing,
                format!("Initializing... ({}s elapsed)", self.elapsed_secs()),
                5,
            ),
        };

        let percent = percent.max(self.last_percent);
        self.last_percent = percent;

        TaskProgress {
            status,
            details,
            percent,
        }
    }
}

/// Registry of active tasks, keyed by task id.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<String, ResearchTask>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task in the `Submitted` state.
    pub fn register(&self, task_id: &str, query: &str, job_ref: Option<String>) -> Result<()> {
        let mut tasks = self.tasks.lock();
        if tasks.contains_key(task_id) {
            return Err(AppError::InvalidInput(format!(
                "Task '{}' is already active",
                task_id
            )));
        }
        tasks.insert(
            task_id.to_string(),
            ResearchTask::new(task_id, query, job_ref),
        );
        Ok(())
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.tasks.lock().contains_key(task_id)
    }

    pub fn state(&self, task_id: &str) -> Option<TaskState> {
        self.tasks.lock().get(task_id).map(|t| t.state)
    }

    pub fn job_ref(&self, task_id: &str) -> Option<String> {
        self.tasks
            .lock()
            .get(task_id)
            .and_then(|t| t.backend_job_ref.clone())
    }

    /// Move a submitted task to `Polling`.
    pub fn mark_polling(&self, task_id: &str) {
        if let Some(task) = self.tasks.lock().get_mut(task_id) {
            if task.state == TaskState::Submitted {
                task.state = TaskState::Polling;
            }
        }
    }

    pub fn record_snapshot(&self, task_id: &str, snapshot: JobSnapshot) {
        if let Some(task) = self.tasks.lock().get_mut(task_id) {
            task.snapshot = Some(snapshot);
        }
    }

    /// Progress of an active task, `None` if the task is not registered.
    pub fn progress(&self, task_id: &str) -> Option<TaskProgress> {
        self.tasks.lock().get_mut(task_id).map(ResearchTask::progress)
    }

    pub fn complete(&self, task_id: &str, text: &str) -> Option<ResearchTask> {
        self.finish(task_id, TaskState::Completed, |task| {
            task.result = Some(text.to_string())
        })
    }

    pub fn fail(&self, task_id: &str, error: &str) -> Option<ResearchTask> {
        self.finish(task_id, TaskState::Failed, |task| {
            task.error = Some(error.to_string())
        })
    }

    pub fn time_out(&self, task_id: &str) -> Option<ResearchTask> {
        self.finish(task_id, TaskState::TimedOut, |_| {})
    }

    /// Apply the terminal transition and drop the task.
    ///
    /// Returns the final record, or `None` if the task already left the
    /// registry, which makes repeated terminal transitions no-ops.
    fn finish(
        &self,
        task_id: &str,
        state: TaskState,
        fill: impl FnOnce(&mut ResearchTask),
    ) -> Option<ResearchTask> {
        let mut task = self.tasks.lock().remove(task_id)?;
        task.state = state;
        fill(&mut task);
        Some(task)
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    pub fn task_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tasks.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}
