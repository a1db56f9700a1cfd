//! Boundary traits the host chat application implements. The engine never
//! reaches into the host directly; everything it needs arrives through these.

use async_trait::async_trait;
use serde_json::Value;

/// One entry of the host's visible chat log
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub is_user: bool,
    pub name: Option<String>,
    pub text: String,
}

/// The character record backing the host chat
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterCard {
    pub name: String,
    pub description: String,
    pub personality: String,
    pub scenario: String,
    pub example_dialogue: String,
}

/// Supplies the prompt-building inputs: chat history, character data, and
/// the current chat length used for branch stamping
pub trait PromptContextProvider: Send + Sync {
    fn chat_entries(&self) -> Vec<ChatEntry>;
    fn character(&self) -> Option<CharacterCard>;
    fn chat_length(&self) -> usize;
    /// Description of the user's persona in the host chat
    fn persona(&self) -> Option<String> {
        None
    }
    fn authors_note(&self) -> Option<String> {
        None
    }
}

/// Reply from the host's quiet-generation primitive: either plain text or
/// the provider's structured result object
#[derive(Debug, Clone)]
pub enum QuietReply {
    Text(String),
    Structured(Value),
}

/// Non-interactive completion call that does not append to the host's main
/// chat log. Used when direct streaming is unsupported by the active backend.
#[async_trait]
pub trait QuietGenerator: Send + Sync {
    async fn generate(&self, system_prompt: &str, prompt: &str) -> anyhow::Result<QuietReply>;
}

/// Connection-profile control for temporary profile switching
#[async_trait]
pub trait ProfileControl: Send + Sync {
    async fn active_profile(&self) -> anyhow::Result<Option<String>>;
    async fn set_active_profile(&self, name: &str) -> anyhow::Result<()>;
}
