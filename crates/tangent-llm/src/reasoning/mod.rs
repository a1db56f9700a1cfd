//! Reconciliation of the three independent reasoning signals a provider can
//! emit: live stream deltas, the final result object, and inline tag markup.
//! Everything here is deterministic and side-effect-free.

mod extract;
mod tags;

pub use extract::{extract_from_result, extract_message_text};
pub use tags::{parse_inline_tags, TagParse};

use serde::{Deserialize, Serialize};

/// Separator between distinct reasoning texts that survived de-duplication
pub const REASONING_SEPARATOR: &str = "\n\n---\n\n";

/// Whether reasoning happened, and whether its text is available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningState {
    /// No reasoning occurred, or nothing usable was recovered
    #[default]
    None,
    /// Reasoning text is present and should be surfaced
    Visible,
    /// The provider reported reasoning occurred but withheld the content
    Hidden,
}

/// Which of the three signals a reasoning value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningSource {
    Stream,
    Result,
    TagParse,
    /// Records written before reasoning metadata existed
    #[default]
    Legacy,
}

/// Canonical reasoning metadata attached to an assistant message
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReasoningMeta {
    pub state: ReasoningState,
    pub source: ReasoningSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl ReasoningMeta {
    /// True when every field still holds its default value
    pub fn is_default(&self) -> bool {
        self.state == ReasoningState::None
            && self.source == ReasoningSource::Legacy
            && self.duration_ms.is_none()
            && self.signature.is_none()
    }
}

/// One reasoning value recovered from a single signal, before merging
#[derive(Debug, Clone, Default)]
pub struct ReasoningCandidate {
    pub text: String,
    pub state: ReasoningState,
    pub source: ReasoningSource,
    pub duration_ms: Option<u64>,
    pub signature: Option<String>,
}

impl ReasoningCandidate {
    pub fn visible(text: impl Into<String>, source: ReasoningSource) -> Self {
        Self {
            text: text.into(),
            state: ReasoningState::Visible,
            source,
            ..Self::default()
        }
    }

    pub fn hidden(source: ReasoningSource) -> Self {
        Self {
            state: ReasoningState::Hidden,
            source,
            ..Self::default()
        }
    }

    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Repair the state so it agrees with the text: empty text can only be
    /// `None` or an explicitly supplied `Hidden`; non-empty text is `Visible`.
    fn normalized(mut self) -> Self {
        if self.text.trim().is_empty() {
            self.text = String::new();
            if self.state == ReasoningState::Visible {
                self.state = ReasoningState::None;
            }
        } else {
            self.state = ReasoningState::Visible;
        }
        self
    }

    fn carries_anything(&self) -> bool {
        self.state != ReasoningState::None
            || !self.text.is_empty()
            || self.duration_ms.is_some()
            || self.signature.is_some()
    }
}

/// Result of merging the available reasoning candidates
#[derive(Debug, Clone, PartialEq)]
pub struct MergedReasoning {
    pub text: String,
    pub meta: ReasoningMeta,
}

/// Merge the (up to) three reasoning signals into one canonical value.
///
/// Candidates are considered in stream, result, tag order; this ordering is
/// also the policy for the hidden fallback when no candidate is visible.
pub fn merge_candidates(
    stream: Option<ReasoningCandidate>,
    result: Option<ReasoningCandidate>,
    tag: Option<ReasoningCandidate>,
) -> MergedReasoning {
    let candidates: Vec<ReasoningCandidate> = [stream, result, tag]
        .into_iter()
        .flatten()
        .map(ReasoningCandidate::normalized)
        .collect();

    let visible: Vec<&ReasoningCandidate> = candidates
        .iter()
        .filter(|c| c.state == ReasoningState::Visible)
        .collect();

    if !visible.is_empty() {
        let mut texts: Vec<&str> = Vec::new();
        for candidate in &visible {
            let trimmed = candidate.text.trim();
            if !texts.contains(&trimmed) {
                texts.push(trimmed);
            }
        }
        let meta = ReasoningMeta {
            state: ReasoningState::Visible,
            source: visible[0].source,
            duration_ms: visible.iter().find_map(|c| c.duration_ms),
            signature: candidates.iter().find_map(|c| c.signature.clone()),
        };
        return MergedReasoning {
            text: texts.join(REASONING_SEPARATOR),
            meta,
        };
    }

    if let Some(hidden) = candidates
        .iter()
        .find(|c| c.state == ReasoningState::Hidden)
    {
        return MergedReasoning {
            text: String::new(),
            meta: ReasoningMeta {
                state: ReasoningState::Hidden,
                source: hidden.source,
                duration_ms: hidden.duration_ms,
                signature: hidden.signature.clone(),
            },
        };
    }

    // Nothing visible, nothing hidden: attribute the empty result to the
    // first candidate that carried any non-default field at all.
    let source = candidates
        .iter()
        .find(|c| c.carries_anything())
        .map(|c| c.source)
        .unwrap_or_default();

    MergedReasoning {
        text: String::new(),
        meta: ReasoningMeta {
            state: ReasoningState::None,
            source,
            duration_ms: candidates.iter().find_map(|c| c.duration_ms),
            signature: candidates.iter().find_map(|c| c.signature.clone()),
        },
    }
}

/// Repair a possibly-malformed or legacy metadata record against the thinking
/// text actually stored next to it.
///
/// A missing record is inferred from the fallback text. A `Hidden` state never
/// survives when text is present: hidden means "no text available", so text
/// forces the state to `Visible`.
pub fn normalize(meta: Option<ReasoningMeta>, fallback_thinking: Option<&str>) -> ReasoningMeta {
    let has_text = fallback_thinking.is_some_and(|t| !t.trim().is_empty());

    let mut meta = meta.unwrap_or_default();
    match meta.state {
        ReasoningState::Visible if !has_text => meta.state = ReasoningState::None,
        ReasoningState::Hidden if has_text => meta.state = ReasoningState::Visible,
        ReasoningState::None if has_text => meta.state = ReasoningState::Visible,
        _ => {}
    }
    meta
}
