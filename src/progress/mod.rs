//! User-facing progress reporting
//!
//! Two files in the session output directory tell operators where a research
//! run stands:
//!
//! - `progress.json` - append-only JSON-lines event log ([`ProgressSink`]).
//!   External monitors tail it; lines are never rewritten.
//! - `status.json` - the current session status ([`StatusManager`]).
//!
//! These are not debug logs. Diagnostics go through `tracing`.
//!
//! # Example
//!
//! ```rust,ignore
//! use litscout::progress::ProgressSink;
//!
//! let sink = ProgressSink::new("./output")?;
//! sink.phase_start("literature_review", "Researching 3 subtopics");
//! sink.task_start("literature_review", "subtopic_1", "Protein folding kinetics");
//! sink.task_complete("literature_review", "subtopic_1", "Complete", Some(33));
//! ```

/// Progress event schema.
pub mod events;
/// JSON-lines progress log writer and reader.
pub mod sink;
/// Session status file.
pub mod status;

pub use events::{ProgressEvent, ProgressEventType};
pub use sink::{read_events, ProgressSink, PROGRESS_FILE};
pub use status::{read_status, SessionStatus, StatusManager, StatusRecord, STATUS_FILE};
