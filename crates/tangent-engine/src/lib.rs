pub mod host;
pub mod orchestrator;
pub mod prompt;
pub mod settings;
pub mod title;

pub use host::{
    CharacterCard, ChatEntry, ProfileControl, PromptContextProvider, QuietGenerator, QuietReply,
};
pub use orchestrator::{GenerationOrchestrator, GenerationOutcome, GenerationRequest, TokenSink};
pub use prompt::{build_prompt, resolve_range, PromptInputs};
pub use settings::{EngineSettings, DEFAULT_SYSTEM_PROMPT};
pub use title::{fallback_title, parse_title_marker, TITLE_INSTRUCTION};
