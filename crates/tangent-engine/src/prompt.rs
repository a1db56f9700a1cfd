//! Prompt assembly: labelled sections joined with blank lines, built from
//! the host context, the thread's prior turns, and the new question.

use tangent_store::{ContextSettings, HistoryRange, Message, MessageRole, MessageStatus};

use crate::host::{CharacterCard, ChatEntry};

/// Everything the prompt is assembled from
pub struct PromptInputs<'a> {
    pub settings: &'a ContextSettings,
    pub character: Option<CharacterCard>,
    pub persona: Option<String>,
    pub chat_entries: Vec<ChatEntry>,
    pub authors_note: Option<String>,
    pub prior_turns: &'a [Message],
    pub question: &'a str,
}

/// Resolve a history range against the actual history length, returning
/// inclusive bounds. Swapped bounds are corrected, out-of-range bounds
/// clamped; an empty history resolves to nothing.
pub fn resolve_range(range: HistoryRange, len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let last = len - 1;
    let (start, end) = match range {
        HistoryRange::All => (0, last),
        HistoryRange::StartTo { end } => (0, end.min(last)),
        HistoryRange::FromToEnd { start } => (start.min(last), last),
        HistoryRange::Between { start, end } => {
            let (lo, hi) = if start > end { (end, start) } else { (start, end) };
            (lo.min(last), hi.min(last))
        }
    };
    Some((start, end))
}

pub fn build_prompt(inputs: &PromptInputs<'_>) -> String {
    let mut sections: Vec<String> = Vec::new();

    if inputs.settings.include_character {
        if let Some(character) = &inputs.character {
            sections.push(character_section(character));
        }
    }

    if inputs.settings.include_persona {
        if let Some(persona) = &inputs.persona {
            if !persona.trim().is_empty() {
                sections.push(format!("### User Persona\n{}", persona.trim()));
            }
        }
    }

    if inputs.settings.include_authors_note {
        if let Some(note) = &inputs.authors_note {
            if !note.trim().is_empty() {
                sections.push(format!("### Author's Note\n{}", note.trim()));
            }
        }
    }

    if let Some(section) = history_section(
        &inputs.chat_entries,
        inputs.settings.history_range,
        inputs.character.as_ref(),
    ) {
        sections.push(section);
    }

    if let Some(section) = prior_turns_section(inputs.prior_turns) {
        sections.push(section);
    }

    sections.push(format!("### Question\n{}", inputs.question));
    sections.join("\n\n")
}

fn character_section(character: &CharacterCard) -> String {
    let mut lines = vec!["### Character".to_string()];
    lines.push(format!("Name: {}", character.name));
    for (label, value) in [
        ("Description", &character.description),
        ("Personality", &character.personality),
        ("Scenario", &character.scenario),
        ("Example dialogue", &character.example_dialogue),
    ] {
        if !value.trim().is_empty() {
            lines.push(format!("{}: {}", label, value.trim()));
        }
    }
    lines.join("\n")
}

fn history_section(
    entries: &[ChatEntry],
    range: HistoryRange,
    character: Option<&CharacterCard>,
) -> Option<String> {
    let (start, end) = resolve_range(range, entries.len())?;

    let mut lines = vec!["### Chat History".to_string()];
    for entry in &entries[start..=end] {
        let speaker = entry.name.clone().unwrap_or_else(|| {
            if entry.is_user {
                "User".to_string()
            } else {
                character
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| "Character".to_string())
            }
        });
        lines.push(format!("{}: {}", speaker, entry.text));
    }
    Some(lines.join("\n"))
}

/// Prior thread turns, filtered to completed messages only; pending, failed
/// and cancelled attempts never enter the prompt
fn prior_turns_section(turns: &[Message]) -> Option<String> {
    let completed: Vec<&Message> = turns
        .iter()
        .filter(|m| m.status == MessageStatus::Complete)
        .collect();
    if completed.is_empty() {
        return None;
    }

    let mut lines = vec!["### Conversation So Far".to_string()];
    for message in completed {
        let speaker = match message.role {
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
        };
        lines.push(format!("{}: {}", speaker, message.content));
    }
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<ChatEntry> {
        (0..n)
            .map(|i| ChatEntry {
                is_user: i % 2 == 0,
                name: None,
                text: format!("entry {}", i),
            })
            .collect()
    }

    #[test]
    fn resolve_range_whole_history() {
        assert_eq!(resolve_range(HistoryRange::All, 4), Some((0, 3)));
    }

    #[test]
    fn resolve_range_swaps_inverted_bounds() {
        assert_eq!(
            resolve_range(HistoryRange::Between { start: 5, end: 2 }, 10),
            Some((2, 5))
        );
    }

    #[test]
    fn resolve_range_clamps_out_of_range_bounds() {
        assert_eq!(
            resolve_range(HistoryRange::Between { start: 2, end: 100 }, 5),
            Some((2, 4))
        );
        assert_eq!(resolve_range(HistoryRange::StartTo { end: 99 }, 3), Some((0, 2)));
    }

    #[test]
    fn resolve_range_empty_history() {
        assert_eq!(resolve_range(HistoryRange::All, 0), None);
    }

    #[test]
    fn prompt_contains_labelled_sections() {
        let settings = ContextSettings::default();
        let prompt = build_prompt(&PromptInputs {
            settings: &settings,
            character: Some(CharacterCard {
                name: "Iris".to_string(),
                description: "A wandering archivist".to_string(),
                ..CharacterCard::default()
            }),
            chat_entries: entries(2),
            persona: None,
            authors_note: None,
            prior_turns: &[],
            question: "What happened so far?",
        });

        assert!(prompt.contains("### Character\nName: Iris"));
        assert!(prompt.contains("### Chat History"));
        assert!(prompt.contains("User: entry 0"));
        assert!(prompt.contains("Iris: entry 1"));
        assert!(prompt.ends_with("### Question\nWhat happened so far?"));
    }

    #[test]
    fn character_section_respects_include_flag() {
        let settings = ContextSettings {
            include_character: false,
            ..ContextSettings::default()
        };
        let prompt = build_prompt(&PromptInputs {
            settings: &settings,
            character: Some(CharacterCard {
                name: "Iris".to_string(),
                ..CharacterCard::default()
            }),
            chat_entries: vec![],
            persona: None,
            authors_note: None,
            prior_turns: &[],
            question: "q",
        });
        assert!(!prompt.contains("### Character"));
    }

    #[test]
    fn persona_section_respects_include_flag() {
        let persona = Some("A skeptical detective".to_string());
        let on = ContextSettings::default();
        let off = ContextSettings {
            include_persona: false,
            ..ContextSettings::default()
        };
        for (settings, expected) in [(&on, true), (&off, false)] {
            let prompt = build_prompt(&PromptInputs {
                settings,
                character: None,
                chat_entries: vec![],
                persona: persona.clone(),
                authors_note: None,
                prior_turns: &[],
                question: "q",
            });
            assert_eq!(
                prompt.contains("### User Persona\nA skeptical detective"),
                expected
            );
        }
    }

    #[test]
    fn incomplete_turns_are_excluded_from_prompt() {
        let settings = ContextSettings::default();
        let mut failed = Message::new(MessageRole::Assistant, "broken", MessageStatus::Failed, 0);
        failed.error = Some("boom".to_string());
        let turns = vec![
            Message::new(MessageRole::User, "earlier question", MessageStatus::Complete, 0),
            Message::new(MessageRole::Assistant, "earlier answer", MessageStatus::Complete, 0),
            failed,
        ];

        let prompt = build_prompt(&PromptInputs {
            settings: &settings,
            character: None,
            chat_entries: vec![],
            persona: None,
            authors_note: None,
            prior_turns: &turns,
            question: "next",
        });

        assert!(prompt.contains("User: earlier question"));
        assert!(prompt.contains("Assistant: earlier answer"));
        assert!(!prompt.contains("broken"));
    }

    #[test]
    fn history_slice_head_truncation() {
        let settings = ContextSettings {
            history_range: HistoryRange::FromToEnd { start: 3 },
            ..ContextSettings::default()
        };
        let prompt = build_prompt(&PromptInputs {
            settings: &settings,
            character: None,
            chat_entries: entries(5),
            persona: None,
            authors_note: None,
            prior_turns: &[],
            question: "q",
        });
        assert!(!prompt.contains("entry 2"));
        assert!(prompt.contains("entry 3"));
        assert!(prompt.contains("entry 4"));
    }
}
