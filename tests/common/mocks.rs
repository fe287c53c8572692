//! Mock research providers for testing.
//!
//! These providers stand in for real backends so dispatcher behavior can be
//! tested without network access. Both keep a real [`TaskRegistry`], so tests
//! can assert that registries end empty.

#![allow(dead_code)]

use async_trait::async_trait;
use litscout::research::{JobSnapshot, ResearchProvider, Submission, TaskRegistry};
use litscout::types::{AppError, ResearchReport, Result, TaskProgress};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Scripted outcome of one task
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Return this report text
    Text(String),
    /// Return `Err(AppError::Provider)` from the research call
    Fail(String),
    /// Panic inside the research call
    Panic,
}

/// Mock blocking provider with per-task outcomes and delays.
///
/// # Examples
///
/// ```ignore
/// let provider = MockBlockingProvider::new()
///     .with_outcome("subtopic_2", MockOutcome::Fail("quota exceeded".into()))
///     .with_delay("subtopic_1", Duration::from_millis(50));
/// ```
#[derive(Default)]
pub struct MockBlockingProvider {
    outcomes: HashMap<String, MockOutcome>,
    delays: HashMap<String, Duration>,
    registry: TaskRegistry,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockBlockingProvider {
    /// Every task succeeds with `Report for {task_id}`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, task_id: &str, text: &str) -> Self {
        self.with_outcome(task_id, MockOutcome::Text(text.to_string()))
    }

    pub fn with_outcome(mut self, task_id: &str, outcome: MockOutcome) -> Self {
        self.outcomes.insert(task_id.to_string(), outcome);
        self
    }

    pub fn with_delay(mut self, task_id: &str, delay: Duration) -> Self {
        self.delays.insert(task_id.to_string(), delay);
        self
    }

    /// `(task_id, query)` of every research call, in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ResearchProvider for MockBlockingProvider {
    async fn conduct_research(&self, query: &str, task_id: &str) -> Result<Submission> {
        self.calls
            .lock()
            .push((task_id.to_string(), query.to_string()));
        self.registry.register(task_id, query, None)?;

        // Zero delays must not yield, so that task interleaving stays deterministic
        if let Some(delay) = self.delays.get(task_id) {
            tokio::time::sleep(*delay).await;
        }

        let outcome = self
            .outcomes
            .get(task_id)
            .cloned()
            .unwrap_or_else(|| MockOutcome::Text(format!("Report for {}", task_id)));

        match outcome {
            MockOutcome::Text(text) => {
                self.registry.complete(task_id, &text);
                Ok(Submission::Report(ResearchReport::complete(text)))
            }
            MockOutcome::Fail(message) => {
                self.registry.fail(task_id, &message);
                Err(AppError::Provider(message))
            }
            MockOutcome::Panic => {
                self.registry.fail(task_id, "panic");
                panic!("mock provider panic for {}", task_id)
            }
        }
    }

    async fn get_result(&self, _task_id: &str) -> Result<Option<ResearchReport>> {
        Err(AppError::Unsupported("mock blocking provider".into()))
    }

    fn supports_background_mode(&self) -> bool {
        false
    }

    fn get_progress(&self, _task_id: &str) -> TaskProgress {
        TaskProgress::not_applicable()
    }

    fn abandon(&self, task_id: &str) -> bool {
        self.registry.time_out(task_id).is_some()
    }

    fn active_tasks(&self) -> usize {
        self.registry.len()
    }

    fn name(&self) -> &'static str {
        "mock_blocking"
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// Mock background provider whose jobs complete after a number of polls.
///
/// Each non-final poll records one more completed sub-action, so progress
/// climbs from 5% towards 95% before the job completes.
pub struct MockBackgroundProvider {
    polls_to_complete: usize,
    failing_polls: HashMap<String, String>,
    registry: TaskRegistry,
    polls: Mutex<HashMap<String, usize>>,
}

impl MockBackgroundProvider {
    pub fn new(polls_to_complete: usize) -> Self {
        Self {
            polls_to_complete,
            failing_polls: HashMap::new(),
            registry: TaskRegistry::new(),
            polls: Mutex::new(HashMap::new()),
        }
    }

    /// Polls of `task_id` fail with a transport error.
    pub fn with_failing_poll(mut self, task_id: &str, message: &str) -> Self {
        self.failing_polls
            .insert(task_id.to_string(), message.to_string());
        self
    }

    pub fn poll_count(&self, task_id: &str) -> usize {
        self.polls.lock().get(task_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ResearchProvider for MockBackgroundProvider {
    async fn conduct_research(&self, query: &str, task_id: &str) -> Result<Submission> {
        let job_ref = format!("job_{}", task_id);
        self.registry.register(task_id, query, Some(job_ref.clone()))?;
        self.registry.mark_polling(task_id);
        Ok(Submission::Job(job_ref))
    }

    async fn get_result(&self, task_id: &str) -> Result<Option<ResearchReport>> {
        if !self.registry.contains(task_id) {
            return Ok(None);
        }

        if let Some(message) = self.failing_polls.get(task_id) {
            self.registry.fail(task_id, message);
            return Err(AppError::Provider(message.clone()));
        }

        let count = {
            let mut polls = self.polls.lock();
            let count = polls.entry(task_id.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        if count >= self.polls_to_complete {
            let text = format!("Background report for {}", task_id);
            return Ok(self
                .registry
                .complete(task_id, &text)
                .map(|_| ResearchReport::complete(text)));
        }

        self.registry.record_snapshot(
            task_id,
            JobSnapshot {
                total_actions: self.polls_to_complete,
                completed_actions: count,
                current_action: Some(format!("Searching: step {}...", count)),
            },
        );
        Ok(None)
    }

    fn supports_background_mode(&self) -> bool {
        true
    }

    fn get_progress(&self, task_id: &str) -> TaskProgress {
        self.registry
            .progress(task_id)
            .unwrap_or_else(TaskProgress::unknown)
    }

    fn abandon(&self, task_id: &str) -> bool {
        self.registry.time_out(task_id).is_some()
    }

    fn active_tasks(&self) -> usize {
        self.registry.len()
    }

    fn name(&self) -> &'static str {
        "mock_background"
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
