//! One research session: provider construction, dispatch and status tracking
//! against a single output directory.

use crate::progress::{ProgressSink, SessionStatus, StatusManager};
use crate::research::dispatcher::{task_id, DispatchOptions, ParallelDispatcher};
use crate::research::provider::ResearchProvider;
use crate::research::selector::ProviderSelector;
use crate::types::{ResearchReport, Result};
use crate::utils::toml_config::LitScoutConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct ResearchSession {
    config: LitScoutConfig,
    status: StatusManager,
    sink: ProgressSink,
}

impl ResearchSession {
    /// Prepare the output directory; no provider is built yet.
    pub fn new(config: LitScoutConfig) -> Result<Self> {
        let output_dir = config.research.output_dir.clone();
        let sink = ProgressSink::new(&output_dir)?;
        let status = StatusManager::new(&output_dir);

        Ok(Self {
            config,
            status,
            sink,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.research.output_dir
    }

    pub fn status(&self) -> &StatusManager {
        &self.status
    }

    pub fn sink(&self) -> &ProgressSink {
        &self.sink
    }

    /// Build the configured provider and research every subtopic.
    ///
    /// Configuration failures (unknown backend, missing credential) mark the
    /// session as `error` and are returned. Per-subtopic failures are not
    /// errors; they come back as error or timeout reports.
    pub async fn run(&self, goal: &str, subtopics: &[String]) -> Result<Vec<ResearchReport>> {
        self.status.update_status(SessionStatus::Initializing, None)?;

        let selector = match ProviderSelector::from_config(&self.config) {
            Ok(selector) => selector,
            Err(e) => {
                tracing::error!("Failed to initialize research provider: {}", e);
                self.status
                    .update_status(SessionStatus::Error, Some(&e.to_string()))?;
                return Err(e);
            }
        };

        self.run_with_provider(selector.primary(), goal, subtopics)
            .await
    }

    /// Research every subtopic with an already-built provider.
    pub async fn run_with_provider(
        &self,
        provider: Arc<dyn ResearchProvider>,
        goal: &str,
        subtopics: &[String],
    ) -> Result<Vec<ResearchReport>> {
        self.status.update_status(SessionStatus::Running, None)?;

        let dispatcher = ParallelDispatcher::new(
            provider,
            self.sink.clone(),
            DispatchOptions::from_section(&self.config.research),
        );
        let reports = dispatcher.dispatch(goal, subtopics).await;

        self.status.update_status(SessionStatus::Completed, None)?;
        Ok(reports)
    }

    /// Write each report as `subtopic_{n}.md` into the output directory.
    pub fn write_reports(&self, reports: &[ResearchReport]) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(reports.len());
        for (index, report) in reports.iter().enumerate() {
            let path = self.output_dir().join(format!("{}.md", task_id(index)));
            fs::write(&path, report.to_markdown())?;
            paths.push(path);
        }
        tracing::debug!(count = paths.len(), "Reports written");
        Ok(paths)
    }
}
