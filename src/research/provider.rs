//! Research provider abstraction
//!
//! Backends differ in execution model:
//! - **Background**: `conduct_research` submits a remote job and returns its
//!   reference; the caller polls `get_result` until a report appears.
//! - **Blocking**: `conduct_research` performs the whole round trip and
//!   returns the final report.
//!
//! Callers ask [`ResearchProvider::supports_background_mode`] once and pick
//! submit+poll or call-and-collect accordingly.

use crate::types::{AppError, ResearchReport, Result, TaskProgress};
use crate::utils::toml_config::ResearchSection;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// What `conduct_research` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Opaque reference to a remote background job; poll with `get_result`.
    Job(String),
    /// Terminal report (blocking backends).
    Report(ResearchReport),
}

/// Common contract for all research backends.
///
/// Each implementation exclusively owns its registry of in-flight tasks.
/// Registry entries are removed as soon as a task reaches a terminal state.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Start research for `query` under the session-unique `task_id`.
    ///
    /// Errors only on transport/auth failures of background submission and on
    /// invalid input; blocking backends convert failures into placeholder reports.
    async fn conduct_research(&self, query: &str, task_id: &str) -> Result<Submission>;

    /// Poll a background task.
    ///
    /// `Ok(None)` while the job is pending and for unknown task ids.
    /// Blocking providers return [`AppError::Unsupported`].
    async fn get_result(&self, task_id: &str) -> Result<Option<ResearchReport>>;

    fn supports_background_mode(&self) -> bool;

    /// Best-effort progress estimate. Never performs I/O and never fails.
    fn get_progress(&self, task_id: &str) -> TaskProgress;

    /// Give up on a task whose deadline elapsed.
    ///
    /// Marks the task timed out and removes it from the registry. The remote
    /// job, if any, is not cancelled. Returns false if the task was not active.
    fn abandon(&self, _task_id: &str) -> bool {
        false
    }

    /// Number of tasks currently in the registry
    fn active_tasks(&self) -> usize {
        0
    }

    /// Backend identifier used in logs
    fn name(&self) -> &'static str;

    fn model_name(&self) -> &str;
}

// ============= Backend Selection =============

/// Supported research backends.
///
/// | Backend | Execution | Credential |
/// |---------|-----------|------------|
/// | `openai_deep_research` | background job (or blocking when background is off) | `OPENAI_API_KEY` |
/// | `perplexity` | blocking | `PERPLEXITY_API_KEY` |
/// | `gpt_researcher` | blocking, long-running | none (self-hosted service) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResearchBackend {
    OpenAIDeepResearch,
    Perplexity,
    GptResearcher,
}

impl ResearchBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchBackend::OpenAIDeepResearch => "openai_deep_research",
            ResearchBackend::Perplexity => "perplexity",
            ResearchBackend::GptResearcher => "gpt_researcher",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ResearchBackend::OpenAIDeepResearch => "o3-deep-research",
            ResearchBackend::Perplexity => "sonar-pro",
            ResearchBackend::GptResearcher => "gpt-researcher",
        }
    }
}

impl fmt::Display for ResearchBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResearchBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "openai_deep_research" => Ok(ResearchBackend::OpenAIDeepResearch),
            "perplexity" => Ok(ResearchBackend::Perplexity),
            "gpt_researcher" => Ok(ResearchBackend::GptResearcher),
            other => Err(AppError::Configuration(format!(
                "Unknown research backend: '{}' (expected openai_deep_research, perplexity or gpt_researcher)",
                other
            ))),
        }
    }
}

/// Parse `backend` or `backend:model`.
pub fn parse_backend_spec(spec: &str) -> Result<(ResearchBackend, Option<String>)> {
    let parts: Vec<&str> = spec.split(':').map(str::trim).collect();

    match parts.as_slice() {
        [backend] => Ok((backend.parse()?, None)),
        [backend, model] if !backend.is_empty() && !model.is_empty() => {
            Ok((backend.parse()?, Some(model.to_string())))
        }
        _ => Err(AppError::Configuration(format!(
            "Malformed backend specification '{}': expected 'backend' or 'backend:model'",
            spec
        ))),
    }
}

/// Resolved, immutable provider settings for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub backend: ResearchBackend,
    pub model: String,
    pub polling_interval: Duration,
    pub background: bool,
    pub fallback_enabled: bool,
    pub output_dir: PathBuf,
}

impl ProviderConfig {
    /// Resolve the `[research]` section, rejecting unknown or malformed backends.
    ///
    /// A model given as `backend:model` takes precedence over `model`.
    pub fn from_section(section: &ResearchSection) -> Result<Self> {
        let (backend, spec_model) = parse_backend_spec(&section.backend)?;

        let model = spec_model
            .or_else(|| section.model.clone())
            .unwrap_or_else(|| backend.default_model().to_string());

        Ok(Self {
            backend,
            model,
            polling_interval: section.polling_interval(),
            background: section.background,
            fallback_enabled: section.fallback_enabled,
            output_dir: section.output_dir.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_round_trip_names() {
        for backend in [
            ResearchBackend::OpenAIDeepResearch,
            ResearchBackend::Perplexity,
            ResearchBackend::GptResearcher,
        ] {
            assert_eq!(backend.as_str().parse::<ResearchBackend>().unwrap(), backend);
        }
    }

    #[test]
    fn test_unknown_backend_is_configuration_error() {
        let err = "bing_search".parse::<ResearchBackend>().unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.to_string().contains("bing_search"));
    }

    #[test]
    fn test_parse_backend_spec_with_model() {
        let (backend, model) = parse_backend_spec("perplexity:sonar-reasoning").unwrap();
        assert_eq!(backend, ResearchBackend::Perplexity);
        assert_eq!(model.as_deref(), Some("sonar-reasoning"));
    }

    #[test]
    fn test_parse_backend_spec_malformed() {
        for spec in ["perplexity:", ":sonar-pro", "perplexity:sonar:pro"] {
            let err = parse_backend_spec(spec).unwrap_err();
            assert!(
                err.to_string().contains("Malformed backend specification"),
                "spec {spec:?} gave {err}"
            );
        }
    }

    #[test]
    fn test_provider_config_defaults_model_per_backend() {
        let section = ResearchSection {
            backend: "gpt_researcher".to_string(),
            ..ResearchSection::default()
        };
        let config = ProviderConfig::from_section(&section).unwrap();
        assert_eq!(config.backend, ResearchBackend::GptResearcher);
        assert_eq!(config.model, "gpt-researcher");
    }

    #[test]
    fn test_provider_config_spec_model_wins() {
        let section = ResearchSection {
            backend: "openai_deep_research:o4-mini-deep-research".to_string(),
            model: Some("o3-deep-research".to_string()),
            ..ResearchSection::default()
        };
        let config = ProviderConfig::from_section(&section).unwrap();
        assert_eq!(config.model, "o4-mini-deep-research");
        assert_eq!(config.polling_interval, Duration::from_secs(30));
        assert!(config.background);
    }
}
