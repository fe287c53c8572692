//! Subcommand handlers

use crate::cli::output::Output;
use crate::progress::{read_events, read_status, PROGRESS_FILE, STATUS_FILE};
use crate::research::{task_id, ProviderConfig, ProviderSelector, ResearchSession};
use crate::types::{AppError, Result};
use crate::utils::toml_config::{LitScoutConfig, DEFAULT_CONFIG_FILE};
use std::fs;
use std::path::{Path, PathBuf};

/// Load the configuration file.
///
/// A missing `litscout.toml` in the working directory falls back to the
/// built-in defaults; an explicitly named file must exist.
pub fn load_config(path: &Path) -> Result<LitScoutConfig> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG_FILE) {
        tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
        return Ok(LitScoutConfig::default());
    }
    Ok(LitScoutConfig::load(path)?)
}

/// Apply `--backend` and `--output-dir` overrides.
pub fn apply_overrides(
    config: &mut LitScoutConfig,
    backend: Option<String>,
    output_dir: Option<PathBuf>,
) {
    if let Some(backend) = backend {
        config.research.backend = backend;
        config.research.model = None;
    }
    if let Some(output_dir) = output_dir {
        config.research.output_dir = output_dir;
    }
}

/// Inline subtopics followed by those read from `file`.
pub fn collect_subtopics(inline: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut subtopics: Vec<String> = inline
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if let Some(path) = file {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::InvalidInput(format!(
                "Cannot read subtopics file {}: {}",
                path.display(),
                e
            ))
        })?;
        subtopics.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }

    if subtopics.is_empty() {
        return Err(AppError::InvalidInput(
            "No subtopics given; use --subtopic or --subtopics-file".into(),
        ));
    }
    Ok(subtopics)
}

/// `litscout run`
pub async fn run(
    config: LitScoutConfig,
    goal: &str,
    subtopics: &[String],
    output: &Output,
) -> Result<()> {
    if goal.trim().is_empty() {
        return Err(AppError::InvalidInput("Research goal is empty".into()));
    }

    let session = ResearchSession::new(config)?;
    output.header("Research");
    output.kv("goal", goal);
    output.kv("subtopics", &subtopics.len().to_string());
    output.kv("output", &session.output_dir().display().to_string());
    output.newline();

    let reports = session.run(goal, subtopics).await?;
    let paths = session.write_reports(&reports)?;

    output.header("Reports");
    for (index, (subtopic, report)) in subtopics.iter().zip(&reports).enumerate() {
        output.report_line(&task_id(index), subtopic, report);
    }
    output.newline();
    for path in &paths {
        output.created(&path.display().to_string());
    }

    let failed = reports.iter().filter(|r| r.is_error()).count();
    if failed == 0 {
        output.success(&format!("All {} subtopics researched", reports.len()));
    } else {
        output.warning(&format!(
            "{} of {} subtopics failed or timed out",
            failed,
            reports.len()
        ));
    }
    Ok(())
}

/// `litscout progress`
pub fn progress(config: &LitScoutConfig, last: usize, output: &Output) -> Result<()> {
    let path = config.research.output_dir.join(PROGRESS_FILE);
    let events = read_events(&path, last)?;

    output.header("Progress");
    if events.is_empty() {
        output.info(&format!("No progress events in {}", path.display()));
        return Ok(());
    }
    for event in &events {
        output.event(event);
    }
    Ok(())
}

/// `litscout status`
pub fn status(config: &LitScoutConfig, output: &Output) -> Result<()> {
    let record = read_status(&config.research.output_dir.join(STATUS_FILE))?;
    output.header("Session");
    output.status(&record);
    Ok(())
}

/// `litscout config`
pub fn show_config(
    config: &LitScoutConfig,
    path: &Path,
    validate: bool,
    output: &Output,
) -> Result<()> {
    let research = &config.research;

    output.header("Configuration");
    output.kv("file", &path.display().to_string());
    output.kv("backend", &research.backend);
    output.kv("model", research.model.as_deref().unwrap_or("(backend default)"));
    output.kv("background", &research.background.to_string());
    output.kv("fallback", &research.fallback_enabled.to_string());
    output.kv("polling interval", &format!("{}s", research.polling_interval_secs));
    output.kv("task timeout", &format!("{}s", research.task_timeout_secs));
    output.kv("batch timeout", &format!("{}s", research.batch_timeout_secs));
    output.kv("output dir", &research.output_dir.display().to_string());

    if validate {
        let resolved = ProviderConfig::from_section(research)?;
        let selector = ProviderSelector::from_config(config)?;
        output.newline();
        output.success(&format!(
            "Backend {} ready (model {}, {} mode)",
            resolved.backend,
            resolved.model,
            if selector.primary().supports_background_mode() {
                "background"
            } else {
                "blocking"
            }
        ));
    } else {
        output.hint("Run with --validate to check the backend and credentials");
    }
    Ok(())
}
