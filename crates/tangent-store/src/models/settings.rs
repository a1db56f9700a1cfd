use serde::{Deserialize, Serialize};

/// Which slice of the host chat history enters the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HistoryRange {
    #[default]
    All,
    /// From the beginning up to and including `end`
    StartTo { end: usize },
    /// From `start` through the latest entry
    FromToEnd { start: usize },
    /// Inclusive range; bounds are swapped when start > end and clamped to
    /// the history length
    Between { start: usize, end: usize },
}

/// Per-thread prompt-context settings, overriding the global defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSettings {
    pub history_range: HistoryRange,
    pub include_character: bool,
    pub include_persona: bool,
    pub include_system_prompt: bool,
    pub include_authors_note: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_override: Option<String>,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            history_range: HistoryRange::All,
            include_character: true,
            include_persona: true,
            include_system_prompt: true,
            include_authors_note: true,
            profile_override: None,
        }
    }
}
