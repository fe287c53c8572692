//! Provider Integration Tests with Mocked Network Responses
//!
//! These tests use wiremock to stand in for each backend and validate:
//! - the background job state machine of OpenAI Deep Research
//! - report extraction and placeholder reports
//! - blocking-mode error and timeout reports
//! - registry cleanup after every terminal transition

use litscout::research::deep_research::{DeepResearchProvider, NO_OUTPUT_REPORT};
use litscout::research::gpt_researcher::GptResearcherProvider;
use litscout::research::perplexity::PerplexityProvider;
use litscout::research::{ResearchProvider, Submission};
use litscout::types::{AppError, ProgressState, ReportStatus, ResearchReport};
use litscout::utils::toml_config::{DeepResearchSettings, GptResearcherSettings, PerplexitySettings};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============= Helper Functions =============

fn deep_research(server: &MockServer, background: bool) -> DeepResearchProvider {
    let settings = DeepResearchSettings {
        api_base: server.uri(),
        request_timeout_secs: 10,
        ..DeepResearchSettings::default()
    };
    DeepResearchProvider::new(
        "test-key".into(),
        &settings,
        "o3-deep-research".into(),
        background,
    )
    .unwrap()
}

fn perplexity(server: &MockServer, timeout_secs: u64) -> PerplexityProvider {
    let settings = PerplexitySettings {
        api_base: server.uri(),
        request_timeout_secs: timeout_secs,
        ..PerplexitySettings::default()
    };
    PerplexityProvider::new("pplx-key".into(), &settings, "sonar-pro".into()).unwrap()
}

fn gpt_researcher(server: &MockServer) -> GptResearcherProvider {
    let settings = GptResearcherSettings {
        base_url: server.uri(),
        research_timeout_secs: 5,
        report_timeout_secs: 5,
    };
    GptResearcherProvider::new(&settings, "gpt-researcher".into()).unwrap()
}

fn web_search(status: &str, action: serde_json::Value) -> serde_json::Value {
    json!({ "type": "web_search_call", "status": status, "action": action })
}

async fn mount_submission(server: &MockServer, response_id: &str) {
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "o3-deep-research",
            "background": true,
            "tools": [{ "type": "web_search_preview" }]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": response_id, "status": "queued" })),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn submit(provider: &DeepResearchProvider, task_id: &str) -> String {
    match provider
        .conduct_research("Research: enzyme kinetics\n\nContext: goal", task_id)
        .await
        .unwrap()
    {
        Submission::Job(job_ref) => job_ref,
        other => panic!("expected a job reference, got {:?}", other),
    }
}

// ============= OpenAI Deep Research: background =============

#[tokio::test]
async fn test_deep_research_submit_registers_task() {
    let server = MockServer::start().await;
    mount_submission(&server, "resp_abc").await;

    let provider = deep_research(&server, true);
    assert!(provider.supports_background_mode());

    let job_ref = submit(&provider, "subtopic_1").await;
    assert_eq!(job_ref, "resp_abc");
    assert_eq!(provider.active_tasks(), 1);

    let progress = provider.get_progress("subtopic_1");
    assert_eq!(progress.status, ProgressState::Initializing);
    assert_eq!(progress.percent, 5);
}

#[tokio::test]
async fn test_deep_research_poll_until_completed() {
    let server = MockServer::start().await;
    mount_submission(&server, "resp_1").await;

    Mock::given(method("GET"))
        .and(path("/responses/resp_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_1",
            "status": "in_progress",
            "output": [
                web_search("completed", json!({ "type": "search", "query": "lactase persistence" })),
                web_search("in_progress", json!({ "type": "search", "query": "LCT enhancer variants" }))
            ]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/responses/resp_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_1",
            "status": "completed",
            "output": [
                web_search("completed", json!({ "type": "search", "query": "lactase persistence" })),
                {
                    "type": "message",
                    "content": [{ "type": "output_text", "text": "# Lactase persistence\n\nFindings." }]
                }
            ]
        })))
        .mount(&server)
        .await;

    let provider = deep_research(&server, true);
    submit(&provider, "subtopic_1").await;

    assert!(provider.get_result("subtopic_1").await.unwrap().is_none());
    let progress = provider.get_progress("subtopic_1");
    assert_eq!(progress.status, ProgressState::Researching);
    assert_eq!(progress.percent, 50);
    assert_eq!(progress.details, "Searching: LCT enhancer variants...");

    let report = provider.get_result("subtopic_1").await.unwrap().unwrap();
    assert_eq!(
        report,
        ResearchReport::complete("# Lactase persistence\n\nFindings.")
    );
    assert_eq!(provider.active_tasks(), 0);

    // Purged: neither a cached report nor progress remains
    assert!(provider.get_result("subtopic_1").await.unwrap().is_none());
    assert_eq!(provider.get_progress("subtopic_1").status, ProgressState::Unknown);
}

#[tokio::test]
async fn test_deep_research_completed_without_text_gives_placeholder() {
    let server = MockServer::start().await;
    mount_submission(&server, "resp_empty").await;

    Mock::given(method("GET"))
        .and(path("/responses/resp_empty"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "resp_empty", "status": "completed", "output": [] })),
        )
        .mount(&server)
        .await;

    let provider = deep_research(&server, true);
    submit(&provider, "subtopic_1").await;

    let report = provider.get_result("subtopic_1").await.unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Complete);
    assert_eq!(report.text, NO_OUTPUT_REPORT);
}

#[tokio::test]
async fn test_deep_research_remote_failure_is_error_report() {
    let server = MockServer::start().await;
    mount_submission(&server, "resp_fail").await;

    Mock::given(method("GET"))
        .and(path("/responses/resp_fail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_fail",
            "status": "failed",
            "error": { "code": "rate_limit_exceeded", "message": "Rate limit reached" }
        })))
        .mount(&server)
        .await;

    let provider = deep_research(&server, true);
    submit(&provider, "subtopic_1").await;

    let report = provider.get_result("subtopic_1").await.unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Error);
    assert_eq!(report.to_markdown(), "# Research Error\n\nRate limit reached");
    assert_eq!(provider.active_tasks(), 0);
}

#[tokio::test]
async fn test_deep_research_poll_transport_error_fails_task() {
    let server = MockServer::start().await;
    mount_submission(&server, "resp_500").await;

    Mock::given(method("GET"))
        .and(path("/responses/resp_500"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = deep_research(&server, true);
    submit(&provider, "subtopic_1").await;

    let err = provider.get_result("subtopic_1").await.unwrap_err();
    assert!(matches!(err, AppError::Provider(_)));
    assert!(err.to_string().contains("500"));
    assert_eq!(provider.active_tasks(), 0);
}

#[tokio::test]
async fn test_deep_research_submission_auth_failure_raises() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided" }
        })))
        .mount(&server)
        .await;

    let provider = deep_research(&server, true);
    let err = provider
        .conduct_research("Research: x\n\nContext: y", "subtopic_1")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Provider(_)));
    assert!(err.to_string().contains("401"));
    assert_eq!(provider.active_tasks(), 0);
}

#[tokio::test]
async fn test_deep_research_unknown_task_returns_none() {
    let server = MockServer::start().await;
    let provider = deep_research(&server, true);

    assert!(provider.get_result("subtopic_99").await.unwrap().is_none());
    assert!(!provider.abandon("subtopic_99"));
}

#[tokio::test]
async fn test_deep_research_abandon_removes_task() {
    let server = MockServer::start().await;
    mount_submission(&server, "resp_slow").await;

    let provider = deep_research(&server, true);
    submit(&provider, "subtopic_1").await;

    assert!(provider.abandon("subtopic_1"));
    assert_eq!(provider.active_tasks(), 0);
    assert!(!provider.abandon("subtopic_1"));
}

#[tokio::test]
async fn test_deep_research_rejects_empty_query_and_duplicate_ids() {
    let server = MockServer::start().await;
    mount_submission(&server, "resp_dup").await;

    let provider = deep_research(&server, true);
    let err = provider.conduct_research("  ", "subtopic_1").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    submit(&provider, "subtopic_1").await;
    let err = provider
        .conduct_research("Research: again", "subtopic_1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

// ============= OpenAI Deep Research: blocking =============

#[tokio::test]
async fn test_deep_research_blocking_mode_returns_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(body_partial_json(json!({ "background": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_sync",
            "status": "completed",
            "output_text": "Synchronous report"
        })))
        .mount(&server)
        .await;

    let provider = deep_research(&server, false);
    assert!(!provider.supports_background_mode());

    let submission = provider
        .conduct_research("Research: a\n\nContext: b", "subtopic_1")
        .await
        .unwrap();
    assert_eq!(
        submission,
        Submission::Report(ResearchReport::complete("Synchronous report"))
    );
    assert_eq!(provider.active_tasks(), 0);
    assert_eq!(provider.get_progress("subtopic_1").status, ProgressState::NotApplicable);
    assert!(matches!(
        provider.get_result("subtopic_1").await,
        Err(AppError::Unsupported(_))
    ));
}

// ============= Perplexity =============

#[tokio::test]
async fn test_perplexity_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer pplx-key"))
        .and(body_partial_json(json!({
            "model": "sonar-pro",
            "messages": [{ "role": "user", "content": "Research: soil carbon\n\nContext: climate" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chat-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "Soil carbon report" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = perplexity(&server, 10);
    assert!(!provider.supports_background_mode());

    let submission = provider
        .conduct_research("Research: soil carbon\n\nContext: climate", "subtopic_1")
        .await
        .unwrap();
    assert_eq!(
        submission,
        Submission::Report(ResearchReport::complete("Soil carbon report"))
    );
    assert_eq!(provider.active_tasks(), 0);
}

#[tokio::test]
async fn test_perplexity_http_error_is_error_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let provider = perplexity(&server, 10);
    let Submission::Report(report) = provider
        .conduct_research("Research: q", "subtopic_1")
        .await
        .unwrap()
    else {
        panic!("blocking provider returned a job reference");
    };

    assert_eq!(report.status, ReportStatus::Error);
    assert!(report.text.contains("503"));
    assert!(report.to_markdown().starts_with("# Research Error"));
    assert_eq!(provider.active_tasks(), 0);
}

#[tokio::test]
async fn test_perplexity_timeout_is_timeout_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "choices": [] }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let provider = perplexity(&server, 1);
    let Submission::Report(report) = provider
        .conduct_research("Research: q", "subtopic_1")
        .await
        .unwrap()
    else {
        panic!("blocking provider returned a job reference");
    };

    assert_eq!(report.status, ReportStatus::Timeout);
    assert_eq!(report.text, "Perplexity timed out after 1 seconds");
    assert_eq!(provider.active_tasks(), 0);
}

// ============= GPT-Researcher =============

#[tokio::test]
async fn test_gpt_researcher_returns_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/report/"))
        .and(body_partial_json(json!({
            "task": "Research: permafrost\n\nContext: methane",
            "report_type": "research_report",
            "report_format": "markdown",
            "tone": "Objective"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "report": "# Permafrost\n\nThawing." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let provider = gpt_researcher(&server);
    let submission = provider
        .conduct_research("Research: permafrost\n\nContext: methane", "subtopic_1")
        .await
        .unwrap();

    assert_eq!(
        submission,
        Submission::Report(ResearchReport::complete("# Permafrost\n\nThawing."))
    );
    assert_eq!(provider.get_progress("subtopic_1").status, ProgressState::NotApplicable);
}

#[tokio::test]
async fn test_gpt_researcher_service_error_is_error_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/report/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": "No sources found" })),
        )
        .mount(&server)
        .await;

    let provider = gpt_researcher(&server);
    let Submission::Report(report) = provider
        .conduct_research("Research: q", "subtopic_1")
        .await
        .unwrap()
    else {
        panic!("blocking provider returned a job reference");
    };

    assert_eq!(report.status, ReportStatus::Error);
    assert!(report.text.contains("No sources found"));
    assert_eq!(provider.active_tasks(), 0);
}

#[tokio::test]
async fn test_gpt_researcher_timeout_is_timeout_report() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/report/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "report": "too late" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let settings = GptResearcherSettings {
        base_url: server.uri(),
        research_timeout_secs: 1,
        report_timeout_secs: 0,
    };
    let provider = GptResearcherProvider::new(&settings, "gpt-researcher".into()).unwrap();
    let Submission::Report(report) = provider
        .conduct_research("Research: q", "subtopic_1")
        .await
        .unwrap()
    else {
        panic!("blocking provider returned a job reference");
    };

    assert_eq!(report.status, ReportStatus::Timeout);
    assert_eq!(report.text, "GPT-Researcher timed out after 1 second");
    assert_eq!(
        report.to_markdown(),
        "# Research Timeout\n\nGPT-Researcher timed out after 1 second"
    );
    assert_eq!(provider.active_tasks(), 0);
}
