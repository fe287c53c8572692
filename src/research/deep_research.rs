//! OpenAI Deep Research backend (background job execution)
//!
//! Uses the Responses API. With background mode on, a research job is
//! submitted with `POST /responses` and polled with `GET /responses/{id}`:
//!
//! ```text
//! Submitted -> Polling -> Completed | Failed
//! ```
//!
//! With background mode off the same endpoint is called once and the provider
//! behaves like a blocking backend.

use crate::research::provider::{ResearchProvider, Submission};
use crate::research::registry::{JobSnapshot, TaskRegistry};
use crate::types::{AppError, ResearchReport, Result, TaskProgress};
use crate::utils::toml_config::DeepResearchSettings;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

/// Report used when a completed job carries no extractable text
pub const NO_OUTPUT_REPORT: &str = "# Research Complete\n\nNo output text found.";

const DETAIL_CHARS: usize = 50;

pub struct DeepResearchProvider {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    background: bool,
    request_timeout: Duration,
    registry: TaskRegistry,
}

impl DeepResearchProvider {
    /// Create a new Deep Research provider
    ///
    /// # Arguments
    ///
    /// * `api_key` - OpenAI API key, already resolved from the environment
    /// * `settings` - endpoint and request timeout
    /// * `model` - e.g. "o3-deep-research" or "o4-mini-deep-research"
    /// * `background` - submit-and-poll when true, single blocking call otherwise
    pub fn new(
        api_key: String,
        settings: &DeepResearchSettings,
        model: String,
        background: bool,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Configuration(
                "OpenAI Deep Research requires a non-empty API key".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            backend = "openai_deep_research",
            model = %model,
            background,
            "Initialized OpenAI Deep Research provider"
        );

        Ok(Self {
            client,
            api_key,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            model,
            background,
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            registry: TaskRegistry::new(),
        })
    }

    fn responses_url(&self) -> String {
        format!("{}/responses", self.api_base)
    }

    /// Send a request and decode the JSON body within the request timeout.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let call = async {
            let response = request.bearer_auth(&self.api_key).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::Provider(format!(
                    "OpenAI API error ({}): {}",
                    status, body
                )));
            }
            response
                .json::<Value>()
                .await
                .map_err(|e| AppError::Provider(format!("Malformed OpenAI response: {}", e)))
        };

        tokio::time::timeout(self.request_timeout, call)
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "OpenAI request exceeded {}s",
                    self.request_timeout.as_secs()
                ))
            })?
    }

    async fn create_response(&self, query: &str) -> Result<Value> {
        let body = json!({
            "model": self.model,
            "input": query,
            "background": self.background,
            "tools": [{ "type": "web_search_preview" }],
        });

        self.send(self.client.post(self.responses_url()).json(&body))
            .await
    }

    async fn retrieve_response(&self, response_id: &str) -> Result<Value> {
        let url = format!("{}/{}", self.responses_url(), response_id);
        self.send(self.client.get(url)).await
    }

    /// Single round trip used when background mode is off.
    async fn research_blocking(&self, query: &str, task_id: &str) -> Result<Submission> {
        self.registry.register(task_id, query, None)?;

        let report = match self.create_response(query).await {
            Ok(response) if response_status(&response) == "failed" => {
                let error = extract_error(&response);
                self.registry.fail(task_id, &error);
                tracing::error!(task_id, "Deep research failed: {}", error);
                ResearchReport::error(error)
            }
            Ok(response) => {
                let text = extract_report(&response);
                self.registry.complete(task_id, &text);
                tracing::info!(task_id, chars = text.len(), "Deep research complete");
                ResearchReport::complete(text)
            }
            Err(AppError::Timeout(msg)) => {
                self.registry.time_out(task_id);
                tracing::error!(task_id, "Deep research timed out: {}", msg);
                ResearchReport::timeout(format!("OpenAI Deep Research timed out: {}", msg))
            }
            Err(e) => {
                self.registry.fail(task_id, &e.to_string());
                tracing::error!(task_id, "Deep research failed: {}", e);
                ResearchReport::error(e.to_string())
            }
        };

        Ok(Submission::Report(report))
    }
}

#[async_trait]
impl ResearchProvider for DeepResearchProvider {
    async fn conduct_research(&self, query: &str, task_id: &str) -> Result<Submission> {
        validate_request(query, task_id)?;
        if self.registry.contains(task_id) {
            return Err(AppError::InvalidInput(format!(
                "Task '{}' is already active",
                task_id
            )));
        }

        if !self.background {
            return self.research_blocking(query, task_id).await;
        }

        tracing::info!(task_id, model = %self.model, "Submitting deep research job");
        let response = self.create_response(query).await?;
        let response_id = response
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Provider("OpenAI response is missing 'id'".into()))?
            .to_string();

        self.registry
            .register(task_id, query, Some(response_id.clone()))?;
        self.registry.mark_polling(task_id);

        tracing::info!(task_id, job_id = %response_id, "Background task started");
        Ok(Submission::Job(response_id))
    }

    async fn get_result(&self, task_id: &str) -> Result<Option<ResearchReport>> {
        if !self.background {
            return Err(AppError::Unsupported(
                "OpenAI Deep Research is running in blocking mode; use conduct_research".into(),
            ));
        }

        let Some(response_id) = self.registry.job_ref(task_id) else {
            tracing::warn!(task_id, "Task not found in active tasks");
            return Ok(None);
        };

        let response = match self.retrieve_response(&response_id).await {
            Ok(response) => response,
            Err(e) => {
                self.registry.fail(task_id, &e.to_string());
                tracing::error!(task_id, job_id = %response_id, "Error checking task: {}", e);
                return Err(e);
            }
        };

        match response_status(&response) {
            "completed" => {
                let report = extract_report(&response);
                let Some(task) = self.registry.complete(task_id, &report) else {
                    return Ok(None);
                };
                tracing::info!(
                    task_id,
                    elapsed_secs = task.elapsed_secs(),
                    chars = report.len(),
                    "Task completed"
                );
                Ok(Some(ResearchReport::complete(report)))
            }
            "failed" | "cancelled" => {
                let error = extract_error(&response);
                if self.registry.fail(task_id, &error).is_none() {
                    return Ok(None);
                }
                tracing::error!(task_id, "Task failed: {}", error);
                Ok(Some(ResearchReport::error(error)))
            }
            status => {
                self.registry.mark_polling(task_id);
                self.registry.record_snapshot(task_id, snapshot(&response));
                tracing::debug!(task_id, status, "Task still running");
                Ok(None)
            }
        }
    }

    fn supports_background_mode(&self) -> bool {
        self.background
    }

    fn get_progress(&self, task_id: &str) -> TaskProgress {
        if !self.background {
            return TaskProgress::not_applicable();
        }
        self.registry
            .progress(task_id)
            .unwrap_or_else(TaskProgress::unknown)
    }

    fn abandon(&self, task_id: &str) -> bool {
        match self.registry.time_out(task_id) {
            Some(task) => {
                tracing::warn!(
                    task_id,
                    job_id = task.backend_job_ref.as_deref().unwrap_or("-"),
                    elapsed_secs = task.elapsed_secs(),
                    "Abandoning deep research task; remote job left running"
                );
                true
            }
            None => false,
        }
    }

    fn active_tasks(&self) -> usize {
        self.registry.len()
    }

    fn name(&self) -> &'static str {
        "openai_deep_research"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

pub(crate) fn validate_request(query: &str, task_id: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(AppError::InvalidInput("Research query is empty".into()));
    }
    if task_id.trim().is_empty() {
        return Err(AppError::InvalidInput("Task id is empty".into()));
    }
    Ok(())
}

fn response_status(response: &Value) -> &str {
    response
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
}

/// Final report text: the direct `output_text` field if present, otherwise the
/// first `output_text` part of a `message` output item.
pub fn extract_report(response: &Value) -> String {
    if let Some(text) = response.get("output_text").and_then(Value::as_str) {
        if !text.trim().is_empty() {
            return text.to_string();
        }
    }

    let message_text = output_items(response)
        .filter(|item| item_type(item) == "message")
        .flat_map(|item| {
            item.get("content")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
        })
        .filter(|part| item_type(part) == "output_text")
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .find(|text| !text.trim().is_empty());

    match message_text {
        Some(text) => text.to_string(),
        None => NO_OUTPUT_REPORT.to_string(),
    }
}

/// Remote error description of a failed job.
pub fn extract_error(response: &Value) -> String {
    match response.get("error") {
        Some(Value::Object(error)) => error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string(),
        Some(Value::String(message)) => message.clone(),
        _ if response_status(response) == "cancelled" => "Research job was cancelled".to_string(),
        _ => "Unknown error".to_string(),
    }
}

/// Count `web_search_call` sub-actions and describe the latest one.
pub fn snapshot(response: &Value) -> JobSnapshot {
    let searches: Vec<&Value> = output_items(response)
        .filter(|item| item_type(item) == "web_search_call")
        .collect();

    let completed_actions = searches
        .iter()
        .filter(|item| item.get("status").and_then(Value::as_str) == Some("completed"))
        .count();

    let current_action = searches
        .last()
        .and_then(|item| item.get("action"))
        .and_then(describe_action);

    JobSnapshot {
        total_actions: searches.len(),
        completed_actions,
        current_action,
    }
}

fn describe_action(action: &Value) -> Option<String> {
    let field = |name: &str| {
        action
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .chars()
            .take(DETAIL_CHARS)
            .collect::<String>()
    };

    match action.get("type").and_then(Value::as_str) {
        Some("search") => Some(format!("Searching: {}...", field("query"))),
        Some("open_page") => Some(format!("Reading: {}...", field("url"))),
        _ => None,
    }
}

fn output_items(response: &Value) -> impl Iterator<Item = &Value> {
    response
        .get("output")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn item_type(item: &Value) -> &str {
    item.get("type").and_then(Value::as_str).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_report_prefers_output_text() {
        let response = json!({
            "status": "completed",
            "output_text": "Direct report",
            "output": [{
                "type": "message",
                "content": [{ "type": "output_text", "text": "Nested report" }]
            }]
        });
        assert_eq!(extract_report(&response), "Direct report");
    }

    #[test]
    fn test_extract_report_scans_message_blocks() {
        let response = json!({
            "status": "completed",
            "output": [
                { "type": "web_search_call", "status": "completed" },
                { "type": "reasoning", "summary": [] },
                {
                    "type": "message",
                    "content": [
                        { "type": "refusal", "refusal": "" },
                        { "type": "output_text", "text": "## Findings\n\nNested report", "annotations": [] }
                    ]
                }
            ]
        });
        assert_eq!(extract_report(&response), "## Findings\n\nNested report");
    }

    #[test]
    fn test_extract_report_without_text_gives_placeholder() {
        let response = json!({ "status": "completed", "output": [] });
        assert_eq!(extract_report(&response), NO_OUTPUT_REPORT);
    }

    #[test]
    fn test_extract_error_variants() {
        assert_eq!(
            extract_error(&json!({ "status": "failed", "error": { "code": "server_error", "message": "boom" } })),
            "boom"
        );
        assert_eq!(
            extract_error(&json!({ "status": "failed", "error": "plain" })),
            "plain"
        );
        assert_eq!(extract_error(&json!({ "status": "failed" })), "Unknown error");
        assert_eq!(
            extract_error(&json!({ "status": "cancelled" })),
            "Research job was cancelled"
        );
    }

    #[test]
    fn test_snapshot_counts_searches() {
        let response = json!({
            "status": "in_progress",
            "output": [
                { "type": "web_search_call", "status": "completed", "action": { "type": "search", "query": "mRNA vaccine stability" } },
                { "type": "reasoning" },
                { "type": "web_search_call", "status": "in_progress", "action": { "type": "open_page", "url": "https://pubmed.ncbi.nlm.nih.gov/123" } }
            ]
        });

        let snap = snapshot(&response);
        assert_eq!(snap.total_actions, 2);
        assert_eq!(snap.completed_actions, 1);
        assert_eq!(
            snap.current_action.as_deref(),
            Some("Reading: https://pubmed.ncbi.nlm.nih.gov/123...")
        );
    }

    #[test]
    fn test_snapshot_truncates_long_queries() {
        let long_query = "a".repeat(200);
        let response = json!({
            "output": [{ "type": "web_search_call", "status": "in_progress", "action": { "type": "search", "query": long_query } }]
        });
        let detail = snapshot(&response).current_action.unwrap();
        assert_eq!(detail, format!("Searching: {}...", "a".repeat(50)));
    }

    #[test]
    fn test_snapshot_without_output() {
        assert_eq!(snapshot(&json!({ "status": "queued" })), JobSnapshot::default());
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = DeepResearchProvider::new(
            "  ".into(),
            &DeepResearchSettings::default(),
            "o3-deep-research".into(),
            true,
        );
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_validate_request() {
        assert!(validate_request("", "subtopic_1").is_err());
        assert!(validate_request("query", " ").is_err());
        assert!(validate_request("query", "subtopic_1").is_ok());
    }
}
