use serde::{Deserialize, Serialize};
use std::fmt;

// ============= Report Types =============

/// Heading that marks a report as a research failure.
pub const ERROR_HEADING: &str = "# Research Error";

/// Heading that marks a report as a timed-out research task.
pub const TIMEOUT_HEADING: &str = "# Research Timeout";

/// Outcome class of a single research report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// The backend produced a report.
    Complete,
    /// The backend call or poll failed; `text` describes the failure.
    Error,
    /// A per-task or batch deadline fired before the task finished.
    Timeout,
}

/// Result of researching one subtopic.
///
/// Failures are carried as data rather than as `Err` so that one failed subtopic
/// never aborts a batch. Use [`ResearchReport::to_markdown`] when a plain string
/// is required downstream: error and timeout reports are rendered with a leading
/// `# Research Error` / `# Research Timeout` heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub text: String,
    pub status: ReportStatus,
}

impl ResearchReport {
    pub fn complete(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: ReportStatus::Complete,
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            text: description.into(),
            status: ReportStatus::Error,
        }
    }

    pub fn timeout(description: impl Into<String>) -> Self {
        Self {
            text: description.into(),
            status: ReportStatus::Timeout,
        }
    }

    /// True for error and timeout placeholders.
    pub fn is_error(&self) -> bool {
        !matches!(self.status, ReportStatus::Complete)
    }

    /// Render the report in the markdown convention used by report consumers.
    pub fn to_markdown(&self) -> String {
        match self.status {
            ReportStatus::Complete => self.text.clone(),
            ReportStatus::Error => format!("{}\n\n{}", ERROR_HEADING, self.text),
            ReportStatus::Timeout => format!("{}\n\n{}", TIMEOUT_HEADING, self.text),
        }
    }
}

impl fmt::Display for ResearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markdown())
    }
}

// ============= Progress Types =============

/// Coarse state reported by [`TaskProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    /// Nothing is known about the task.
    Unknown,
    /// The provider has nothing to poll (blocking backends).
    NotApplicable,
    /// Job submitted, no sub-actions recorded yet.
    Initializing,
    /// Job is executing sub-actions.
    Researching,
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProgressState::Unknown => "unknown",
            ProgressState::NotApplicable => "not_applicable",
            ProgressState::Initializing => "initializing",
            ProgressState::Researching => "researching",
        };
        f.write_str(s)
    }
}

/// Best-effort progress estimate for an in-flight task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub status: ProgressState,
    pub details: String,
    /// 0-100
    pub percent: u8,
}

impl TaskProgress {
    pub fn unknown() -> Self {
        Self {
            status: ProgressState::Unknown,
            details: String::new(),
            percent: 0,
        }
    }

    pub fn not_applicable() -> Self {
        Self {
            status: ProgressState::NotApplicable,
            details: String::new(),
            percent: 0,
        }
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Not supported: {0}")]
    Unsupported(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<crate::utils::toml_config::ConfigError> for AppError {
    fn from(err: crate::utils::toml_config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Provider(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
