//! Perplexity backend (blocking execution)
//!
//! One chat-completions round trip per subtopic. The answer comes back in the
//! same call, so there is nothing to poll.

use crate::research::deep_research::validate_request;
use crate::research::provider::{ResearchProvider, Submission};
use crate::research::registry::TaskRegistry;
use crate::types::{AppError, ResearchReport, Result, TaskProgress};
use crate::utils::toml_config::PerplexitySettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct PerplexityProvider {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    request_timeout: Duration,
    registry: TaskRegistry,
}

impl PerplexityProvider {
    pub fn new(api_key: String, settings: &PerplexitySettings, model: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Configuration(
                "Perplexity requires a non-empty API key".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(backend = "perplexity", model = %model, "Initialized Perplexity provider");

        Ok(Self {
            client,
            api_key,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            model,
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            registry: TaskRegistry::new(),
        })
    }

    async fn chat(&self, query: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: query,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "Perplexity API error ({}): {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Malformed Perplexity response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Provider("Perplexity response contained no choices".into()))
    }
}

#[async_trait]
impl ResearchProvider for PerplexityProvider {
    async fn conduct_research(&self, query: &str, task_id: &str) -> Result<Submission> {
        validate_request(query, task_id)?;
        self.registry.register(task_id, query, None)?;

        tracing::info!(task_id, model = %self.model, "Starting Perplexity research");

        let report = match tokio::time::timeout(self.request_timeout, self.chat(query)).await {
            Ok(Ok(text)) => {
                self.registry.complete(task_id, &text);
                tracing::info!(task_id, chars = text.len(), "Perplexity research complete");
                ResearchReport::complete(text)
            }
            Ok(Err(e)) => {
                self.registry.fail(task_id, &e.to_string());
                tracing::error!(task_id, "Perplexity research failed: {}", e);
                ResearchReport::error(format!("Perplexity research failed: {}", e))
            }
            Err(_) => {
                self.registry.time_out(task_id);
                let secs = self.request_timeout.as_secs();
                tracing::error!(task_id, timeout_secs = secs, "Perplexity research timed out");
                ResearchReport::timeout(format!("Perplexity timed out after {} seconds", secs))
            }
        };

        Ok(Submission::Report(report))
    }

    async fn get_result(&self, _task_id: &str) -> Result<Option<ResearchReport>> {
        Err(AppError::Unsupported(
            "Perplexity is a blocking backend; results are returned by conduct_research".into(),
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
        "perplexity"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
