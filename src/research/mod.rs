//! Parallel Subtopic Research
//!
//! This module fans a research goal's subtopics out to a deep-research
//! backend and gathers one report per subtopic, in input order.
//!
//! # Architecture
//!
//! - [`provider::ResearchProvider`] - common contract of all backends
//! - [`selector::ProviderSelector`] - builds the configured backend at session start
//! - [`dispatcher::ParallelDispatcher`] - concurrent fan-out with per-task and batch deadlines
//! - [`session::ResearchSession`] - ties provider, dispatcher and status file together
//!
//! # Usage
//!
//! ```ignore
//! use litscout::research::ResearchSession;
//! use litscout::LitScoutConfig;
//!
//! let config = LitScoutConfig::load("litscout.toml")?;
//! let session = ResearchSession::new(config)?;
//!
//! let subtopics = vec![
//!     "Mechanisms of antibiotic tolerance in biofilms".to_string(),
//!     "Persister cell formation".to_string(),
//! ];
//! let reports = session.run("Why do chronic infections relapse?", &subtopics).await?;
//!
//! for report in &reports {
//!     println!("{}", report.to_markdown());
//! }
//! ```
//!
//! # Backends
//!
//! 1. **OpenAI Deep Research** - background job, submit then poll
//! 2. **Perplexity** - single blocking call
//! 3. **GPT-Researcher** - legacy self-hosted service, blocking and slow

/// OpenAI Deep Research backend.
pub mod deep_research;
/// Fan-out/fan-in of subtopic research.
pub mod dispatcher;
/// GPT-Researcher backend.
pub mod gpt_researcher;
/// Perplexity backend.
pub mod perplexity;
/// Provider trait and backend selection types.
pub mod provider;
/// In-flight task bookkeeping.
pub mod registry;
/// Provider construction from configuration.
pub mod selector;
/// Session-level orchestration.
pub mod session;

pub use dispatcher::{research_query, task_id, DispatchOptions, ParallelDispatcher};
pub use provider::{parse_backend_spec, ProviderConfig, ResearchBackend, ResearchProvider, Submission};
pub use registry::{JobSnapshot, ResearchTask, TaskRegistry, TaskState};
pub use selector::ProviderSelector;
pub use session::ResearchSession;
