//! TOML-based configuration for litscout
//!
//! This module provides declarative configuration for the research backend,
//! per-backend connection settings, deadlines and logging via a TOML file
//! (`litscout.toml`).
//!
//! Credentials never live in the file. Provider sections name the environment
//! variable that holds the credential (`api_key_env`), and the variable is
//! resolved when the provider is constructed.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name looked up by the binary
pub const DEFAULT_CONFIG_FILE: &str = "litscout.toml";

/// Root configuration structure loaded from litscout.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LitScoutConfig {
    #[serde(default)]
    pub research: ResearchSection,

    /// Connection settings for every supported backend
    #[serde(default)]
    pub providers: ProvidersSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============= Research Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSection {
    /// Backend selector, optionally with a model: `perplexity` or `perplexity:sonar-pro`.
    /// Kept as a string so that unknown values are rejected when providers are built.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Model identifier; backend default when absent
    pub model: Option<String>,

    #[serde(default = "default_polling_interval")]
    pub polling_interval_secs: u64,

    /// Use submit-and-poll execution where the backend supports it
    #[serde(default = "default_true")]
    pub background: bool,

    /// Construct the legacy backend as a standby provider
    #[serde(default)]
    pub fallback_enabled: bool,

    /// Directory receiving the progress log, status file and reports
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_task_timeout")]
    pub task_timeout_secs: u64,

    #[serde(default = "default_batch_timeout")]
    pub batch_timeout_secs: u64,

    /// Phase name stamped on progress events
    #[serde(default = "default_phase")]
    pub phase: String,
}

fn default_backend() -> String {
    "openai_deep_research".to_string()
}

fn default_polling_interval() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_task_timeout() -> u64 {
    3600
}

fn default_batch_timeout() -> u64 {
    7200
}

fn default_phase() -> String {
    "literature_review".to_string()
}

impl Default for ResearchSection {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model: None,
            polling_interval_secs: default_polling_interval(),
            background: true,
            fallback_enabled: false,
            output_dir: default_output_dir(),
            task_timeout_secs: default_task_timeout(),
            batch_timeout_secs: default_batch_timeout(),
            phase: default_phase(),
        }
    }
}

impl ResearchSection {
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersSection {
    #[serde(default)]
    pub openai_deep_research: DeepResearchSettings,

    #[serde(default)]
    pub perplexity: PerplexitySettings,

    #[serde(default)]
    pub gpt_researcher: GptResearcherSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepResearchSettings {
    /// Environment variable containing the OpenAI API key
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_openai_base")]
    pub api_base: String,

    /// Per-request budget for submit/poll calls (and for blocking mode)
    #[serde(default = "default_openai_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_request_timeout() -> u64 {
    3600
}

impl Default for DeepResearchSettings {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_key_env(),
            api_base: default_openai_base(),
            request_timeout_secs: default_openai_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerplexitySettings {
    /// Environment variable containing the Perplexity API key
    #[serde(default = "default_perplexity_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_perplexity_base")]
    pub api_base: String,

    #[serde(default = "default_perplexity_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_perplexity_key_env() -> String {
    "PERPLEXITY_API_KEY".to_string()
}

fn default_perplexity_base() -> String {
    "https://api.perplexity.ai".to_string()
}

fn default_perplexity_request_timeout() -> u64 {
    300
}

impl Default for PerplexitySettings {
    fn default() -> Self {
        Self {
            api_key_env: default_perplexity_key_env(),
            api_base: default_perplexity_base(),
            request_timeout_secs: default_perplexity_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GptResearcherSettings {
    /// Base URL of the GPT-Researcher service
    #[serde(default = "default_gpt_researcher_url")]
    pub base_url: String,

    #[serde(default = "default_gpt_research_timeout")]
    pub research_timeout_secs: u64,

    #[serde(default = "default_gpt_report_timeout")]
    pub report_timeout_secs: u64,
}

fn default_gpt_researcher_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_gpt_research_timeout() -> u64 {
    900
}

fn default_gpt_report_timeout() -> u64 {
    60
}

impl Default for GptResearcherSettings {
    fn default() -> Self {
        Self {
            base_url: default_gpt_researcher_url(),
            research_timeout_secs: default_gpt_research_timeout(),
            report_timeout_secs: default_gpt_report_timeout(),
        }
    }
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl LitScoutConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LitScoutConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate numeric settings.
    ///
    /// Backend names are deliberately not checked here; the provider selector
    /// rejects them when it builds providers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let research = &self.research;

        if research.polling_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "research.polling_interval_secs must be greater than 0".into(),
            ));
        }
        if research.task_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "research.task_timeout_secs must be greater than 0".into(),
            ));
        }
        if research.batch_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "research.batch_timeout_secs must be greater than 0".into(),
            ));
        }
        if research.phase.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "research.phase must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.trim().is_empty())
    }

    /// Resolve an env var reference, failing when it is unset or blank
    pub fn require_env(&self, env_name: &str) -> Result<String, ConfigError> {
        self.resolve_env(env_name)
            .ok_or_else(|| ConfigError::MissingEnvVar(env_name.to_string()))
    }
}
