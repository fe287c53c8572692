//! # LitScout - parallel literature research
//!
//! Fans the subtopics of a research goal out to a deep-research backend,
//! tracks every in-flight task, and returns one markdown report per subtopic
//! in the order the subtopics were given.
//!
//! ## Overview
//!
//! LitScout can be used in two ways:
//!
//! 1. **As a CLI** - Run the `litscout` binary against a `litscout.toml`
//! 2. **As a library** - Embed the dispatcher in a larger research pipeline
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use litscout::{LitScoutConfig, ResearchSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LitScoutConfig::load("litscout.toml")?;
//!     let session = ResearchSession::new(config)?;
//!
//!     let subtopics = vec![
//!         "CRISPR base editing off-target effects".to_string(),
//!         "Delivery vectors for in vivo editing".to_string(),
//!     ];
//!     let reports = session.run("State of in vivo gene editing", &subtopics).await?;
//!     session.write_reports(&reports)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Custom Providers
//!
//! ```rust,ignore
//! use litscout::{DispatchOptions, ParallelDispatcher, ProgressSink};
//! use std::sync::Arc;
//!
//! let dispatcher = ParallelDispatcher::new(
//!     Arc::new(MyProvider::new()),
//!     ProgressSink::new("./output")?,
//!     DispatchOptions::default(),
//! );
//! let markdown = dispatcher.dispatch_markdown(goal, &subtopics).await;
//! ```
//!
//! ## Modules
//!
//! - [`research`] - Providers, selection and the parallel dispatcher
//! - [`progress`] - Progress event log and session status file
//! - [`cli`] - Command-line interface
//! - [`types`] - Reports, progress snapshots and error handling
//! - [`utils`] - TOML configuration
//!
//! ## Reports
//!
//! A subtopic that fails or times out still yields a report. Its status is
//! carried in [`ResearchReport::status`]; [`ResearchReport::to_markdown`]
//! renders it with a leading `# Research Error` or `# Research Timeout`
//! heading for consumers that only handle strings.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// Command-line interface.
pub mod cli;
/// Progress event log and session status file.
pub mod progress;
/// Research providers and parallel dispatch.
pub mod research;
/// Core types (reports, progress, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use progress::{ProgressEvent, ProgressEventType, ProgressSink, SessionStatus, StatusManager};
pub use research::{
    DispatchOptions, ParallelDispatcher, ProviderConfig, ProviderSelector, ResearchBackend,
    ResearchProvider, ResearchSession, Submission, TaskRegistry,
};
pub use types::{AppError, ReportStatus, ResearchReport, Result, TaskProgress};
pub use utils::toml_config::{ConfigError, LitScoutConfig};
