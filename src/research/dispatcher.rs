//! Parallel subtopic research
//!
//! Fans a list of subtopics out to one provider, then collects the reports
//! back into input order. Two deadlines apply:
//!
//! - **task timeout** bounds one subtopic, from its `TASK_START` onwards
//! - **batch timeout** bounds the whole fan-out
//!
//! Whichever fires first turns the task into a timeout report. Failures of one
//! subtopic never cancel its siblings and never escape `dispatch`.
//!
//! All subtopic futures are polled from the task that calls `dispatch`, so they
//! interleave at `.await` points only, whatever runtime flavor is in use. A
//! provider call that never yields runs to completion before the next subtopic
//! starts.

use crate::progress::ProgressSink;
use crate::research::provider::{ResearchProvider, Submission};
use crate::types::{ProgressState, ReportStatus, ResearchReport};
use crate::utils::toml_config::ResearchSection;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Timing and labelling of one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Phase name stamped on progress events
    pub phase: String,
    pub polling_interval: Duration,
    pub task_timeout: Duration,
    pub batch_timeout: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self::from_section(&ResearchSection::default())
    }
}

impl DispatchOptions {
    pub fn from_section(section: &ResearchSection) -> Self {
        Self {
            phase: section.phase.clone(),
            polling_interval: section.polling_interval(),
            task_timeout: section.task_timeout(),
            batch_timeout: section.batch_timeout(),
        }
    }
}

/// Task id of the subtopic at `index` (zero-based).
pub fn task_id(index: usize) -> String {
    format!("subtopic_{}", index + 1)
}

/// Query sent to the backend for one subtopic.
pub fn research_query(subtopic: &str, goal: &str) -> String {
    format!("Research: {}\n\nContext: {}", subtopic, goal)
}

/// State shared by every task of one dispatch.
struct TaskContext {
    provider: Arc<dyn ResearchProvider>,
    sink: ProgressSink,
    phase: String,
    background: bool,
    polling_interval: Duration,
    task_timeout: Duration,
    total: usize,
    completed: AtomicUsize,
    slots: Mutex<Vec<Option<ResearchReport>>>,
}

impl TaskContext {
    /// Record the final report of a task and emit its `TASK_COMPLETE`.
    ///
    /// Synchronous, so a cancelled future can never stop between the slot
    /// write and the event. The slot lock is held while emitting, so completion
    /// percentages appear in the log in increasing order. Returns false if the
    /// slot was already filled.
    fn finish(&self, index: usize, report: ResearchReport) -> bool {
        let mut slots = self.slots.lock();
        if slots[index].is_some() {
            return false;
        }

        let details = match report.status {
            ReportStatus::Complete => "Complete",
            ReportStatus::Error => "Failed",
            ReportStatus::Timeout => "Timed out",
        };
        slots[index] = Some(report);

        // Batch-level percent: share of all subtopics finished, not this task's own progress
        let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        let percent = (done * 100 / self.total.max(1)) as u8;
        self.sink
            .task_complete(&self.phase, &task_id(index), details, Some(percent));
        true
    }

    /// Indices whose report is still missing.
    fn unfinished(&self) -> Vec<usize> {
        self.slots
            .lock()
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    async fn run(&self, index: usize, subtopic: &str, query: String) {
        let task_id = task_id(index);
        self.sink.task_start(&self.phase, &task_id, subtopic);
        tracing::info!(task_id = %task_id, subtopic = %subtopic, "Starting subtopic research");

        let report = match tokio::time::timeout(
            self.task_timeout,
            self.research(&task_id, subtopic, &query),
        )
        .await
        {
            Ok(report) => report,
            Err(_) => {
                self.provider.abandon(&task_id);
                tracing::warn!(
                    task_id = %task_id,
                    timeout_secs = self.task_timeout.as_secs_f64(),
                    "Subtopic research exceeded task timeout"
                );
                ResearchReport::timeout(format!(
                    "Timeout: research on subtopic '{}' did not finish within {:?}",
                    subtopic, self.task_timeout
                ))
            }
        };

        if report.is_error() {
            tracing::warn!(task_id = %task_id, status = ?report.status, "Subtopic research did not complete");
        } else {
            tracing::info!(task_id = %task_id, chars = report.text.len(), "Subtopic research complete");
        }

        self.finish(index, report);
    }

    async fn research(&self, task_id: &str, subtopic: &str, query: &str) -> ResearchReport {
        match self.provider.conduct_research(query, task_id).await {
            Ok(Submission::Report(report)) => report,
            Ok(Submission::Job(job_ref)) if self.background => {
                tracing::debug!(task_id, job_ref = %job_ref, "Polling background job");
                self.poll(task_id, subtopic).await
            }
            Ok(Submission::Job(job_ref)) => {
                self.provider.abandon(task_id);
                ResearchReport::error(format!(
                    "Error researching subtopic '{}': blocking provider returned job reference '{}'",
                    subtopic, job_ref
                ))
            }
            Err(e) => {
                tracing::error!(task_id, "Research call failed: {}", e);
                ResearchReport::error(format!("Error researching subtopic '{}': {}", subtopic, e))
            }
        }
    }

    async fn poll(&self, task_id: &str, subtopic: &str) -> ResearchReport {
        loop {
            match self.provider.get_result(task_id).await {
                Ok(Some(report)) => return report,
                Ok(None) => {
                    let progress = self.provider.get_progress(task_id);
                    if progress.status == ProgressState::Unknown {
                        return ResearchReport::error(format!(
                            "Error researching subtopic '{}': task '{}' is no longer tracked by {}",
                            subtopic,
                            task_id,
                            self.provider.name()
                        ));
                    }
                    self.sink
                        .update(&self.phase, Some(task_id), &progress.details, progress.percent);
                }
                Err(e) => {
                    tracing::error!(task_id, "Polling failed: {}", e);
                    return ResearchReport::error(format!(
                        "Error researching subtopic '{}': {}",
                        subtopic, e
                    ));
                }
            }

            tokio::time::sleep(self.polling_interval).await;
        }
    }
}

/// Runs all subtopics of a phase concurrently against one provider.
pub struct ParallelDispatcher {
    provider: Arc<dyn ResearchProvider>,
    sink: ProgressSink,
    options: DispatchOptions,
}

impl ParallelDispatcher {
    pub fn new(
        provider: Arc<dyn ResearchProvider>,
        sink: ProgressSink,
        options: DispatchOptions,
    ) -> Self {
        Self {
            provider,
            sink,
            options,
        }
    }

    pub fn provider(&self) -> &Arc<dyn ResearchProvider> {
        &self.provider
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Research every subtopic and return one report per subtopic, in input order.
    ///
    /// Never fails: errors, panics and timeouts of individual tasks become
    /// error or timeout reports at the matching index.
    pub async fn dispatch(&self, goal: &str, subtopics: &[String]) -> Vec<ResearchReport> {
        let total = subtopics.len();
        let phase = self.options.phase.as_str();
        let background = self.provider.supports_background_mode();
        let deadline = tokio::time::Instant::now() + self.options.batch_timeout;

        tracing::info!(
            phase,
            subtopics = total,
            backend = self.provider.name(),
            background,
            "Dispatching parallel research"
        );
        self.sink
            .phase_start(phase, &format!("Researching {} subtopics", total));

        let ctx = TaskContext {
            provider: Arc::clone(&self.provider),
            sink: self.sink.clone(),
            phase: phase.to_string(),
            background,
            polling_interval: self.options.polling_interval,
            task_timeout: self.options.task_timeout,
            total,
            completed: AtomicUsize::new(0),
            slots: Mutex::new(vec![None; total]),
        };

        let mut tasks = FuturesUnordered::new();
        for (index, subtopic) in subtopics.iter().enumerate() {
            let query = research_query(subtopic, goal);
            let run = AssertUnwindSafe(ctx.run(index, subtopic, query)).catch_unwind();
            tasks.push(run.map(move |outcome| (index, outcome)));
        }

        loop {
            let next = tokio::time::timeout_at(deadline, tasks.next()).await;
            match next {
                Ok(Some((_, Ok(())))) => {}
                Ok(Some((index, Err(panic)))) => {
                    tracing::error!(
                        phase,
                        task_id = %task_id(index),
                        "Research task panicked: {}",
                        panic_message(&*panic)
                    );
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        phase,
                        timeout_secs = self.options.batch_timeout.as_secs_f64(),
                        remaining = tasks.len(),
                        "Batch deadline exceeded"
                    );
                    // Dropping the futures cancels their in-flight requests
                    drop(tasks);
                    self.expire_unfinished(&ctx, subtopics);
                    break;
                }
            }
        }

        // Only tasks that panicked can still be without a report here
        for index in ctx.unfinished() {
            ctx.finish(
                index,
                ResearchReport::error(format!(
                    "Error researching subtopic '{}': task aborted unexpectedly",
                    subtopics[index]
                )),
            );
        }

        let reports: Vec<ResearchReport> = ctx
            .slots
            .lock()
            .iter()
            .map(|slot| slot.clone().unwrap_or_else(|| ResearchReport::error("No result recorded")))
            .collect();

        let completed = reports.iter().filter(|r| !r.is_error()).count();
        self.sink.phase_complete(
            phase,
            &format!("Completed {}/{} subtopics", completed, total),
        );
        tracing::info!(phase, completed, total, "Parallel research finished");

        reports
    }

    /// [`dispatch`](Self::dispatch) rendered as markdown strings, error and
    /// timeout reports carrying their heading.
    pub async fn dispatch_markdown(&self, goal: &str, subtopics: &[String]) -> Vec<String> {
        self.dispatch(goal, subtopics)
            .await
            .iter()
            .map(ResearchReport::to_markdown)
            .collect()
    }

    /// Fill every empty slot with a timeout report after the batch deadline.
    fn expire_unfinished(&self, ctx: &TaskContext, subtopics: &[String]) {
        for index in ctx.unfinished() {
            self.provider.abandon(&task_id(index));
            ctx.finish(
                index,
                ResearchReport::timeout(format!(
                    "Timeout: batch deadline of {:?} elapsed before subtopic '{}' finished",
                    self.options.batch_timeout, subtopics[index]
                )),
            );
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
