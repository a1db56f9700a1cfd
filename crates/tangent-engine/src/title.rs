use regex::Regex;
use std::sync::LazyLock;

/// Character budget for titles derived from the question text
const FALLBACK_TITLE_CHARS: usize = 50;

/// Fixed-format inline marker the model is asked to lead with on a thread's
/// first assistant turn
static TITLE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\*\*Title:\s*(.+?)\*\*\s*").expect("valid title regex")
});

/// Instruction appended to the system prompt on the first assistant turn only
pub const TITLE_INSTRUCTION: &str = "Begin your reply with a short title for this conversation \
on its own line, formatted exactly as **Title: Your Title Here**, then continue with your answer.";

/// Parse the leading title marker off a response. Returns the title and the
/// remainder of the text with the marker removed.
pub fn parse_title_marker(text: &str) -> Option<(String, String)> {
    let captures = TITLE_MARKER.captures(text)?;
    let title = captures[1].trim().to_string();
    if title.is_empty() {
        return None;
    }
    let matched = captures.get(0).expect("whole match always present");
    let remainder = text[matched.end()..].trim_start().to_string();
    Some((title, remainder))
}

/// Deterministic fallback when the model did not emit a marker: the question
/// truncated to a fixed budget with an ellipsis
pub fn fallback_title(question: &str) -> String {
    let question = question.trim();
    if question.chars().count() <= FALLBACK_TITLE_CHARS {
        return question.to_string();
    }
    let truncated: String = question.chars().take(FALLBACK_TITLE_CHARS).collect();
    format!("{}…", truncated.trim_end())
}
