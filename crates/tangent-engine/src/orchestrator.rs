//! Single-flight generation lifecycle: prompt built, transport or quiet
//! fallback run, reasoning merged, result written back to the store.
//!
//! Each attempt is tracked by an explicit generation id; starting a new
//! attempt orphans the previous one, whose late deltas and completion are
//! dropped on arrival. Cancellation is a token the caller holds.

use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use tangent_llm::{
    extract_from_result, extract_message_text, merge_candidates, parse_inline_tags, ChatMessage,
    ReasoningCandidate, ReasoningMeta, ReasoningSource, StreamTransport, TokenDelta,
    TransportError,
};
use tangent_store::{
    ContextSettings, Message, MessageRole, MessageStatus, ThreadPersistence, ThreadStore,
};

use crate::host::{ProfileControl, PromptContextProvider, QuietGenerator, QuietReply};
use crate::prompt::{build_prompt, PromptInputs};
use crate::settings::EngineSettings;
use crate::title::{fallback_title, parse_title_marker, TITLE_INSTRUCTION};

pub type TokenSink = Box<dyn Fn(&TokenDelta) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub thread_id: Uuid,
    pub question: String,
}

/// Structured result of one generation attempt. Failures and cancellations
/// are fields, never panics or stray `Err`s past this boundary.
#[derive(Debug, Clone, Default)]
pub struct GenerationOutcome {
    pub success: bool,
    pub response: Option<String>,
    pub thinking: Option<String>,
    pub reasoning_meta: Option<ReasoningMeta>,
    pub cancelled: bool,
    pub error: Option<String>,
}

impl GenerationOutcome {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    fn cancelled_with(partial: Option<String>) -> Self {
        Self {
            cancelled: true,
            response: partial,
            ..Self::default()
        }
    }
}

/// What one model call produced, before normalization
#[derive(Debug, Default)]
struct Attempt {
    text: String,
    stream_reasoning: String,
    stream_signature: Option<String>,
    stream_duration_ms: Option<u64>,
    result_value: Option<serde_json::Value>,
}

pub struct GenerationOrchestrator {
    store: Arc<Mutex<ThreadStore>>,
    transport: Option<Arc<StreamTransport>>,
    context: Arc<dyn PromptContextProvider>,
    quiet: Arc<dyn QuietGenerator>,
    profiles: Arc<dyn ProfileControl>,
    persistence: Arc<dyn ThreadPersistence>,
    settings: EngineSettings,
    active_generation: AtomicU64,
}

impl GenerationOrchestrator {
    pub fn new(
        store: ThreadStore,
        context: Arc<dyn PromptContextProvider>,
        quiet: Arc<dyn QuietGenerator>,
        profiles: Arc<dyn ProfileControl>,
        persistence: Arc<dyn ThreadPersistence>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            transport: None,
            context,
            quiet,
            profiles,
            persistence,
            settings,
            active_generation: AtomicU64::new(0),
        }
    }

    /// Enable direct streaming against a completion endpoint
    pub fn with_transport(mut self, transport: StreamTransport) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn store(&self) -> Arc<Mutex<ThreadStore>> {
        Arc::clone(&self.store)
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn store_lock(&self) -> MutexGuard<'_, ThreadStore> {
        self.store.lock().expect("thread store lock poisoned")
    }

    fn is_current(&self, generation_id: u64) -> bool {
        self.active_generation.load(Ordering::SeqCst) == generation_id
    }

    async fn persist(&self) -> anyhow::Result<()> {
        let snapshot = self.store_lock().snapshot();
        self.persistence.persist(&snapshot).await
    }

    /// Create a thread seeded with the current global context defaults
    pub async fn create_thread(&self, name: impl Into<String>) -> anyhow::Result<Uuid> {
        let id = self
            .store_lock()
            .create_thread(name, Some(self.settings.defaults.clone()));
        self.persist().await?;
        Ok(id)
    }

    /// Run one generation attempt against a thread. The caller holds the
    /// cancellation token; signalling it ends the attempt with a distinct
    /// cancelled outcome rather than a failure.
    pub async fn generate(
        &self,
        request: GenerationRequest,
        cancel: CancellationToken,
        on_token: Option<TokenSink>,
    ) -> GenerationOutcome {
        // Starting a new attempt orphans any previous one
        let generation_id = self.active_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let chat_length = self.context.chat_length();

        // Append the user/pending-assistant pair before any network call so
        // partial failures leave an auditable trace
        let (assistant_id, context_settings, first_turn, prior_turns) = {
            let mut store = self.store_lock();
            let Some(thread) = store.thread(request.thread_id) else {
                return GenerationOutcome::failure(format!(
                    "Thread not found: {}",
                    request.thread_id
                ));
            };
            let context_settings = thread
                .context_settings
                .clone()
                .unwrap_or_else(|| self.settings.defaults.clone());
            let first_turn = !thread.messages.iter().any(Message::is_assistant);
            let prior_turns = thread.messages.clone();

            if let Err(e) = store.add_message(
                request.thread_id,
                MessageRole::User,
                &request.question,
                MessageStatus::Complete,
                None,
                chat_length,
            ) {
                return GenerationOutcome::failure(e.to_string());
            }
            let assistant_id = match store.add_message(
                request.thread_id,
                MessageRole::Assistant,
                "",
                MessageStatus::Pending,
                None,
                chat_length,
            ) {
                Ok(id) => id,
                Err(e) => return GenerationOutcome::failure(e.to_string()),
            };
            (assistant_id, context_settings, first_turn, prior_turns)
        };
        if let Err(e) = self.persist().await {
            return self
                .finish_failed(request.thread_id, assistant_id, e.to_string())
                .await;
        }

        let (system_prompt, prompt) =
            self.build_prompts(&context_settings, &prior_turns, &request.question, first_turn);

        tracing::info!(
            thread = %request.thread_id,
            generation = generation_id,
            streaming = self.transport.is_some() && on_token.is_some(),
            "starting generation"
        );

        // Temporary profile switch, restored on every path
        let previous_profile = match self.switch_profile(&context_settings).await {
            Ok(previous) => previous,
            Err(e) => {
                return self
                    .finish_failed(request.thread_id, assistant_id, e.to_string())
                    .await
            }
        };

        let attempt = self
            .run_attempt(&system_prompt, &prompt, generation_id, &cancel, &on_token)
            .await;

        self.restore_profile(&context_settings, previous_profile)
            .await;

        let attempt = match attempt {
            Ok(attempt) => attempt,
            Err(e) => {
                if cancel.is_cancelled() {
                    return self
                        .finish_cancelled(request.thread_id, assistant_id, String::new(), None)
                        .await;
                }
                return self
                    .finish_failed(request.thread_id, assistant_id, e.to_string())
                    .await;
            }
        };

        // Reconcile the three reasoning signals
        let tag_parse = parse_inline_tags(&attempt.text);
        let stream_candidate = stream_candidate(&attempt);
        let result_candidate = attempt.result_value.as_ref().and_then(extract_from_result);
        let tag_candidate = tag_parse
            .thinking
            .clone()
            .map(|t| ReasoningCandidate::visible(t, ReasoningSource::TagParse));
        let merged = merge_candidates(stream_candidate, result_candidate, tag_candidate);

        let mut response_text = tag_parse.cleaned;

        if cancel.is_cancelled() || !self.is_current(generation_id) {
            let thinking = if merged.text.is_empty() {
                None
            } else {
                Some(merged.text)
            };
            return self
                .finish_cancelled(request.thread_id, assistant_id, response_text, thinking)
                .await;
        }

        // Title handling, first assistant turn only
        if first_turn {
            let title = match parse_title_marker(&response_text) {
                Some((title, remainder)) => {
                    response_text = remainder;
                    title
                }
                None => fallback_title(&request.question),
            };
            if let Err(e) = self.store_lock().rename_thread(request.thread_id, &title) {
                tracing::warn!("failed to rename thread: {}", e);
            }
        }

        let thinking = if merged.text.is_empty() {
            None
        } else {
            Some(merged.text.clone())
        };
        let update = {
            let response_text = response_text.clone();
            let thinking = thinking.clone();
            let meta = merged.meta.clone();
            self.store_lock()
                .update_message(request.thread_id, assistant_id, move |m| {
                    m.content = response_text;
                    m.status = MessageStatus::Complete;
                    m.thinking = thinking;
                    m.reasoning_meta = Some(meta);
                    m.error = None;
                })
        };
        if let Err(e) = update {
            return GenerationOutcome::failure(e.to_string());
        }
        if let Err(e) = self.persist().await {
            return GenerationOutcome::failure(e.to_string());
        }

        tracing::info!(thread = %request.thread_id, generation = generation_id, "generation complete");

        GenerationOutcome {
            success: true,
            response: Some(response_text),
            thinking,
            reasoning_meta: Some(merged.meta),
            cancelled: false,
            error: None,
        }
    }

    /// Retry a failed assistant message: the failed message and the user
    /// question preceding it are removed, then generation runs again, so
    /// retried turns never duplicate history.
    pub async fn retry(
        &self,
        thread_id: Uuid,
        assistant_message_id: Uuid,
        cancel: CancellationToken,
        on_token: Option<TokenSink>,
    ) -> GenerationOutcome {
        let question = {
            let mut store = self.store_lock();
            let Some(thread) = store.thread(thread_id) else {
                return GenerationOutcome::failure(format!("Thread not found: {}", thread_id));
            };
            let Some(position) = thread
                .messages
                .iter()
                .position(|m| m.id == assistant_message_id)
            else {
                return GenerationOutcome::failure(format!(
                    "Message not found: {}",
                    assistant_message_id
                ));
            };
            // Back-scan for the nearest prior user message
            let Some(user_position) = thread.messages[..position]
                .iter()
                .rposition(|m| m.role == MessageRole::User)
            else {
                return GenerationOutcome::failure(
                    "No user question precedes the retried message".to_string(),
                );
            };
            let user_id = thread.messages[user_position].id;
            let question = thread.messages[user_position].content.clone();

            if let Err(e) = store.remove_message(thread_id, assistant_message_id) {
                return GenerationOutcome::failure(e.to_string());
            }
            if let Err(e) = store.remove_message(thread_id, user_id) {
                return GenerationOutcome::failure(e.to_string());
            }
            question
        };
        if let Err(e) = self.persist().await {
            return GenerationOutcome::failure(e.to_string());
        }

        self.generate(
            GenerationRequest {
                thread_id,
                question,
            },
            cancel,
            on_token,
        )
        .await
    }

    fn build_prompts(
        &self,
        context_settings: &ContextSettings,
        prior_turns: &[Message],
        question: &str,
        first_turn: bool,
    ) -> (String, String) {
        let mut system_prompt = if context_settings.include_system_prompt {
            self.settings.system_prompt.clone()
        } else {
            String::new()
        };
        if first_turn {
            if !system_prompt.is_empty() {
                system_prompt.push_str("\n\n");
            }
            system_prompt.push_str(TITLE_INSTRUCTION);
        }

        let prompt = build_prompt(&PromptInputs {
            settings: context_settings,
            character: self.context.character(),
            chat_entries: self.context.chat_entries(),
            persona: self.context.persona(),
            authors_note: self.context.authors_note(),
            prior_turns,
            question,
        });
        (system_prompt, prompt)
    }

    async fn switch_profile(
        &self,
        context_settings: &ContextSettings,
    ) -> anyhow::Result<Option<String>> {
        let Some(ref profile) = context_settings.profile_override else {
            return Ok(None);
        };
        let previous = self.profiles.active_profile().await?;
        self.profiles.set_active_profile(profile).await?;
        tracing::debug!(profile = %profile, "switched connection profile");
        Ok(previous)
    }

    async fn restore_profile(
        &self,
        context_settings: &ContextSettings,
        previous: Option<String>,
    ) {
        if context_settings.profile_override.is_none() {
            return;
        }
        match previous {
            Some(previous) => {
                if let Err(e) = self.profiles.set_active_profile(&previous).await {
                    tracing::warn!("failed to restore connection profile: {}", e);
                }
            }
            None => tracing::debug!("no previous connection profile to restore"),
        }
    }

    async fn run_attempt(
        &self,
        system_prompt: &str,
        prompt: &str,
        generation_id: u64,
        cancel: &CancellationToken,
        on_token: &Option<TokenSink>,
    ) -> anyhow::Result<Attempt> {
        if self.settings.prefer_streaming {
            if let (Some(transport), Some(sink)) = (&self.transport, on_token) {
                return self
                    .run_stream(transport, system_prompt, prompt, generation_id, cancel, sink)
                    .await;
            }
        }
        self.run_quiet(system_prompt, prompt).await
    }

    async fn run_stream(
        &self,
        transport: &StreamTransport,
        system_prompt: &str,
        prompt: &str,
        generation_id: u64,
        cancel: &CancellationToken,
        sink: &TokenSink,
    ) -> anyhow::Result<Attempt> {
        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(prompt),
        ];
        let mut stream = transport
            .stream(&messages, &self.settings.sampling, cancel.clone())
            .await?;

        let mut attempt = Attempt::default();
        let mut reasoning_started: Option<Instant> = None;

        while let Some(item) = stream.next().await {
            let delta = match item {
                Ok(delta) => delta,
                // Partial output survives cancellation; the caller decides
                // whether to keep it
                Err(TransportError::Cancelled) => break,
                Err(e) => return Err(e.into()),
            };
            // Late events from a superseded generation are dropped, never
            // forwarded into the next question's display
            if !self.is_current(generation_id) {
                tracing::debug!(generation = generation_id, "dropping superseded delta");
                break;
            }
            if !delta.reasoning.is_empty() && reasoning_started.is_none() {
                reasoning_started = Some(Instant::now());
            }
            attempt.text.push_str(&delta.text);
            attempt.stream_reasoning.push_str(&delta.reasoning);
            if delta.signature.is_some() {
                attempt.stream_signature = delta.signature.clone();
            }
            sink(&delta);
        }

        attempt.stream_duration_ms = reasoning_started.map(|t| t.elapsed().as_millis() as u64);
        Ok(attempt)
    }

    async fn run_quiet(&self, system_prompt: &str, prompt: &str) -> anyhow::Result<Attempt> {
        let reply = self.quiet.generate(system_prompt, prompt).await?;
        let mut attempt = Attempt::default();
        match reply {
            QuietReply::Text(text) => attempt.text = text,
            QuietReply::Structured(value) => {
                attempt.text = extract_message_text(&value).unwrap_or_default();
                attempt.result_value = Some(value);
            }
        }
        Ok(attempt)
    }

    async fn finish_failed(
        &self,
        thread_id: Uuid,
        assistant_id: Uuid,
        error: String,
    ) -> GenerationOutcome {
        tracing::error!(thread = %thread_id, "generation failed: {}", error);
        let update = {
            let error = error.clone();
            self.store_lock()
                .update_message(thread_id, assistant_id, move |m| {
                    m.status = MessageStatus::Failed;
                    m.error = Some(error);
                })
        };
        if let Err(e) = update {
            tracing::warn!("failed to mark message failed: {}", e);
        }
        if let Err(e) = self.persist().await {
            tracing::warn!("failed to persist failed message: {}", e);
        }
        GenerationOutcome::failure(error)
    }

    /// A cancelled attempt keeps its partial text as a `Cancelled` message;
    /// with no text at all the pending message is removed entirely.
    async fn finish_cancelled(
        &self,
        thread_id: Uuid,
        assistant_id: Uuid,
        partial_text: String,
        thinking: Option<String>,
    ) -> GenerationOutcome {
        tracing::info!(thread = %thread_id, "generation cancelled");
        let result = if partial_text.trim().is_empty() {
            self.store_lock()
                .remove_message(thread_id, assistant_id)
                .map(|_| ())
        } else {
            let partial = partial_text.clone();
            self.store_lock()
                .update_message(thread_id, assistant_id, move |m| {
                    m.status = MessageStatus::Cancelled;
                    m.content = partial;
                    m.thinking = thinking;
                })
        };
        if let Err(e) = result {
            tracing::warn!("failed to record cancellation: {}", e);
        }
        if let Err(e) = self.persist().await {
            tracing::warn!("failed to persist cancellation: {}", e);
        }
        GenerationOutcome::cancelled_with(if partial_text.trim().is_empty() {
            None
        } else {
            Some(partial_text)
        })
    }
}

/// Build the live-stream reasoning candidate: visible text when reasoning
/// deltas arrived, hidden when only a signature did
fn stream_candidate(attempt: &Attempt) -> Option<ReasoningCandidate> {
    if !attempt.stream_reasoning.trim().is_empty() {
        let mut candidate =
            ReasoningCandidate::visible(attempt.stream_reasoning.clone(), ReasoningSource::Stream);
        candidate.duration_ms = attempt.stream_duration_ms;
        candidate.signature = attempt.stream_signature.clone();
        Some(candidate)
    } else if let Some(ref signature) = attempt.stream_signature {
        Some(ReasoningCandidate::hidden(ReasoningSource::Stream).signature(signature.clone()))
    } else {
        None
    }
}
