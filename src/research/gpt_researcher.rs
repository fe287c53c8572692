//! GPT-Researcher backend (legacy, blocking)
//!
//! Talks to a self-hosted GPT-Researcher service. A single request runs the
//! whole research-then-write pipeline, which routinely takes several minutes,
//! so the call budget is the research timeout plus the report timeout.

use crate::research::deep_research::validate_request;
use crate::research::provider::{ResearchProvider, Submission};
use crate::research::registry::TaskRegistry;
use crate::types::{AppError, ResearchReport, Result, TaskProgress};
use crate::utils::toml_config::GptResearcherSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ReportRequest<'a> {
    task: &'a str,
    report_type: &'a str,
    report_format: &'a str,
    tone: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReportResponse {
    #[serde(default)]
    report: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct GptResearcherProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
    registry: TaskRegistry,
}

impl GptResearcherProvider {
    pub fn new(settings: &GptResearcherSettings, model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let timeout =
            Duration::from_secs(settings.research_timeout_secs + settings.report_timeout_secs);

        tracing::info!(
            backend = "gpt_researcher",
            base_url = %settings.base_url,
            timeout_secs = timeout.as_secs(),
            "Initialized GPT-Researcher provider"
        );

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
            registry: TaskRegistry::new(),
        })
    }

    async fn write_report(&self, query: &str) -> Result<String> {
        let request = ReportRequest {
            task: query,
            report_type: "research_report",
            report_format: "markdown",
            tone: "Objective",
        };

        let response = self
            .client
            .post(format!("{}/report/", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "GPT-Researcher error ({}): {}",
                status, body
            )));
        }

        let parsed: ReportResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Malformed GPT-Researcher response: {}", e)))?;

        match (parsed.report, parsed.error) {
            (Some(report), _) if !report.trim().is_empty() => Ok(report),
            (_, Some(error)) => Err(AppError::Provider(error)),
            _ => Err(AppError::Provider("GPT-Researcher returned an empty report".into())),
        }
    }

    /// Call budget for messages: whole minutes rounded up, seconds below one minute.
    fn timeout_label(&self) -> String {
        let secs = self.timeout.as_secs();
        let (amount, unit) = if secs < 60 {
            (secs, "second")
        } else {
            (secs.div_ceil(60), "minute")
        };
        let plural = if amount == 1 { "" } else { "s" };
        format!("{} {}{}", amount, unit, plural)
    }
}

#[async_trait]
impl ResearchProvider for GptResearcherProvider {
    async fn conduct_research(&self, query: &str, task_id: &str) -> Result<Submission> {
        validate_request(query, task_id)?;
        self.registry.register(task_id, query, None)?;

        tracing::info!(task_id, "Starting GPT-Researcher run");

        let report = match tokio::time::timeout(self.timeout, self.write_report(query)).await {
            Ok(Ok(text)) => {
                self.registry.complete(task_id, &text);
                tracing::info!(task_id, chars = text.len(), "GPT-Researcher report ready");
                ResearchReport::complete(text)
            }
            Ok(Err(e)) => {
                self.registry.fail(task_id, &e.to_string());
                tracing::error!(task_id, "GPT-Researcher failed: {}", e);
                ResearchReport::error(format!("GPT-Researcher failed: {}", e))
            }
            Err(_) => {
                self.registry.time_out(task_id);
                let budget = self.timeout_label();
                tracing::error!(task_id, budget = %budget, "GPT-Researcher timed out");
                ResearchReport::timeout(format!("GPT-Researcher timed out after {}", budget))
            }
        };

        Ok(Submission::Report(report))
    }

    async fn get_result(&self, _task_id: &str) -> Result<Option<ResearchReport>> {
        Err(AppError::Unsupported(
            "GPT-Researcher is a blocking backend; results are returned by conduct_research".into(),
        ))
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
        "gpt_researcher"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
