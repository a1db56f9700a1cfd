use serde::{Deserialize, Serialize};
use tangent_llm::{BackendKind, SamplingParams};
use tangent_store::ContextSettings;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant answering questions about \
an ongoing roleplay chat. Ground your answers in the provided character information and chat \
history. Be concise and direct.";

/// Global engine configuration. The per-thread `ContextSettings` snapshot is
/// taken from `defaults` at thread creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    pub system_prompt: String,
    pub backend: BackendKind,
    pub sampling: SamplingParams,
    /// Streaming is used when a transport and a token sink are available;
    /// otherwise generation falls back to the host's quiet call
    pub prefer_streaming: bool,
    pub defaults: ContextSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            backend: BackendKind::OpenAi,
            sampling: SamplingParams::new("gpt-4o-mini"),
            prefer_streaming: true,
            defaults: ContextSettings::default(),
        }
    }
}
