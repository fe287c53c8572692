//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod mocks;

use litscout::progress::{ProgressEvent, ProgressEventType, ProgressSink};
use litscout::research::DispatchOptions;
use std::time::Duration;

/// Dispatch options with millisecond-scale timings.
pub fn fast_options(task_timeout: Duration, batch_timeout: Duration) -> DispatchOptions {
    DispatchOptions {
        phase: "literature_review".to_string(),
        polling_interval: Duration::from_millis(5),
        task_timeout,
        batch_timeout,
    }
}

pub fn subtopics(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Every event written to the sink so far.
pub fn all_events(sink: &ProgressSink) -> Vec<ProgressEvent> {
    sink.recent_events(usize::MAX).unwrap()
}

/// `(event type, task, progress)` triples, without progress updates.
pub fn event_outline(events: &[ProgressEvent]) -> Vec<(ProgressEventType, Option<String>, Option<u8>)> {
    events
        .iter()
        .filter(|e| e.event_type != ProgressEventType::ProgressUpdate)
        .map(|e| (e.event_type, e.task.clone(), e.progress))
        .collect()
}
