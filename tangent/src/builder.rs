//! High-level builder API for wiring up the generation engine

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use tangent_engine::{
    EngineSettings, GenerationOrchestrator, ProfileControl, PromptContextProvider, QuietGenerator,
};
use tangent_llm::{BackendKind, StreamTransport};
use tangent_store::{NullPersistence, Thread, ThreadPersistence, ThreadStore};

/// Builder assembling a [`GenerationOrchestrator`] from host callbacks and
/// connection details.
///
/// # Example
///
/// ```rust,no_run
/// use tangent::prelude::*;
/// # use std::sync::Arc;
/// # fn hosts() -> (Arc<dyn PromptContextProvider>, Arc<dyn QuietGenerator>) { unimplemented!() }
///
/// # fn main() -> Result<()> {
/// let (context, quiet) = hosts();
/// let engine = EngineBuilder::new()
///     .context(context)
///     .quiet(quiet)
///     .transport("https://api.openai.com/v1/chat/completions", BackendKind::OpenAi, Some("sk-..."))
///     .model("gpt-4o-mini")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct EngineBuilder {
    context: Option<Arc<dyn PromptContextProvider>>,
    quiet: Option<Arc<dyn QuietGenerator>>,
    profiles: Option<Arc<dyn ProfileControl>>,
    persistence: Arc<dyn ThreadPersistence>,
    transport: Option<(String, BackendKind, Option<String>)>,
    threads: Vec<Thread>,
    settings: EngineSettings,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            context: None,
            quiet: None,
            profiles: None,
            persistence: Arc::new(NullPersistence),
            transport: None,
            threads: Vec::new(),
            settings: EngineSettings::default(),
        }
    }

    /// Set the host prompt-context provider (required)
    pub fn context(mut self, context: Arc<dyn PromptContextProvider>) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the host quiet-generation fallback (required)
    pub fn quiet(mut self, quiet: Arc<dyn QuietGenerator>) -> Self {
        self.quiet = Some(quiet);
        self
    }

    /// Set the host connection-profile control. Without one, per-thread
    /// profile overrides are ignored.
    pub fn profiles(mut self, profiles: Arc<dyn ProfileControl>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Set the persistence sink invoked after each mutation batch
    /// (default: none)
    pub fn persistence(mut self, persistence: Arc<dyn ThreadPersistence>) -> Self {
        self.persistence = persistence;
        self
    }

    /// Enable direct streaming against a completion endpoint
    pub fn transport(
        mut self,
        endpoint: impl Into<String>,
        backend: BackendKind,
        api_key: Option<&str>,
    ) -> Self {
        self.transport = Some((endpoint.into(), backend, api_key.map(str::to_string)));
        self.settings.backend = backend;
        self
    }

    /// Load previously persisted threads; the legacy schema upgrade runs
    /// at this point
    pub fn threads(mut self, threads: Vec<Thread>) -> Self {
        self.threads = threads;
        self
    }

    /// Set the model (default: gpt-4o-mini)
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.settings.sampling.model = model.into();
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.settings.system_prompt = prompt.into();
        self
    }

    /// Replace the full engine settings
    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the engine
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the prompt-context provider or quiet generator is not set
    /// - the transport endpoint or API key is malformed
    pub fn build(self) -> Result<GenerationOrchestrator> {
        let context = self
            .context
            .context("Prompt context provider is required. Call .context(provider)")?;
        let quiet = self
            .quiet
            .context("Quiet generator is required. Call .quiet(generator)")?;
        let profiles = self
            .profiles
            .unwrap_or_else(|| Arc::new(NoopProfiles));

        let store = if self.threads.is_empty() {
            ThreadStore::new()
        } else {
            ThreadStore::from_threads(self.threads)
        };

        let mut engine = GenerationOrchestrator::new(
            store,
            context,
            quiet,
            profiles,
            self.persistence,
            self.settings,
        );

        if let Some((endpoint, backend, api_key)) = self.transport {
            let transport = StreamTransport::new(endpoint, backend, api_key.as_deref())
                .context("Failed to create streaming transport")?;
            engine = engine.with_transport(transport);
        }

        Ok(engine)
    }
}

/// Stands in when the host exposes no profile switching
struct NoopProfiles;

#[async_trait]
impl ProfileControl for NoopProfiles {
    async fn active_profile(&self) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set_active_profile(&self, _name: &str) -> Result<()> {
        Ok(())
    }
}
