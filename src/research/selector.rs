//! Provider selection
//!
//! Builds exactly one primary provider per session from `[research].backend`.
//! Unknown backends and missing credentials fail here, before any network call.
//!
//! When `fallback_enabled` is set a GPT-Researcher provider is also built, but
//! the dispatch path never switches to it: a primary failure surfaces as a
//! per-subtopic error report.

use crate::research::deep_research::DeepResearchProvider;
use crate::research::gpt_researcher::GptResearcherProvider;
use crate::research::perplexity::PerplexityProvider;
use crate::research::provider::{ProviderConfig, ResearchBackend, ResearchProvider};
use crate::types::Result;
use crate::utils::toml_config::LitScoutConfig;
use std::sync::Arc;

/// Primary (and optional fallback) provider of one research session
#[derive(Clone)]
pub struct ProviderSelector {
    config: ProviderConfig,
    primary: Arc<dyn ResearchProvider>,
    fallback: Option<Arc<dyn ResearchProvider>>,
}

impl ProviderSelector {
    /// Resolve the configuration and construct the providers it names.
    pub fn from_config(config: &LitScoutConfig) -> Result<Self> {
        let resolved = ProviderConfig::from_section(&config.research)?;

        tracing::info!(
            backend = %resolved.backend,
            model = %resolved.model,
            fallback = resolved.fallback_enabled,
            "Initializing research provider"
        );

        let primary = build_provider(
            resolved.backend,
            &resolved.model,
            resolved.background,
            config,
        )?;

        let fallback = if resolved.fallback_enabled {
            let backend = ResearchBackend::GptResearcher;
            Some(build_provider(
                backend,
                backend.default_model(),
                false,
                config,
            )?)
        } else {
            None
        };

        Ok(Self {
            config: resolved,
            primary,
            fallback,
        })
    }

    /// Wrap already-built providers, e.g. test doubles.
    pub fn with_providers(
        config: ProviderConfig,
        primary: Arc<dyn ResearchProvider>,
        fallback: Option<Arc<dyn ResearchProvider>>,
    ) -> Self {
        Self {
            config,
            primary,
            fallback,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn primary(&self) -> Arc<dyn ResearchProvider> {
        Arc::clone(&self.primary)
    }

    /// The configured fallback. Never consulted automatically.
    pub fn fallback(&self) -> Option<Arc<dyn ResearchProvider>> {
        self.fallback.clone()
    }
}

impl std::fmt::Debug for ProviderSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSelector")
            .field("config", &self.config)
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.as_ref().map(|p| p.name()))
            .finish()
    }
}

/// Construct a provider for `backend`, reading its credential from the
/// environment variable named in `[providers.*]`.
pub fn build_provider(
    backend: ResearchBackend,
    model: &str,
    background: bool,
    config: &LitScoutConfig,
) -> Result<Arc<dyn ResearchProvider>> {
    let providers = &config.providers;

    let provider: Arc<dyn ResearchProvider> = match backend {
        ResearchBackend::OpenAIDeepResearch => {
            let settings = &providers.openai_deep_research;
            let api_key = config.require_env(&settings.api_key_env)?;
            Arc::new(DeepResearchProvider::new(
                api_key,
                settings,
                model.to_string(),
                background,
            )?)
        }
        ResearchBackend::Perplexity => {
            let settings = &providers.perplexity;
            let api_key = config.require_env(&settings.api_key_env)?;
            Arc::new(PerplexityProvider::new(api_key, settings, model.to_string())?)
        }
        ResearchBackend::GptResearcher => Arc::new(GptResearcherProvider::new(
            &providers.gpt_researcher,
            model.to_string(),
        )?),
    };

    Ok(provider)
}
