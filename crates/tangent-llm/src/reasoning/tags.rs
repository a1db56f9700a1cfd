use regex::Regex;
use std::sync::LazyLock;

/// Matches `<thinking>...</thinking>` and `<think>...</think>` spans,
/// case-insensitive, across newlines, lazily so multiple spans stay separate
static THINK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<think(?:ing)?>(.*?)</think(?:ing)?>").expect("valid tag regex")
});

/// Result of scanning a response for inline thinking tags
#[derive(Debug, Clone, PartialEq)]
pub struct TagParse {
    /// Inner text of all tag pairs, blank-line joined; `None` when no tags
    pub thinking: Option<String>,
    /// Input with the tag spans removed and surrounding whitespace trimmed;
    /// the input unchanged when no tags were found
    pub cleaned: String,
}

/// Extract every thinking/think tag pair from `text`.
///
/// Idempotent on `cleaned`: re-running the parse on its own output finds no
/// further tags.
pub fn parse_inline_tags(text: &str) -> TagParse {
    if !THINK_TAG.is_match(text) {
        return TagParse {
            thinking: None,
            cleaned: text.to_string(),
        };
    }

    let mut pieces: Vec<String> = Vec::new();
    for captures in THINK_TAG.captures_iter(text) {
        let inner = captures[1].trim();
        if !inner.is_empty() {
            pieces.push(inner.to_string());
        }
    }

    let cleaned = THINK_TAG.replace_all(text, "").trim().to_string();
    let thinking = if pieces.is_empty() {
        None
    } else {
        Some(pieces.join("\n\n"))
    };

    TagParse { thinking, cleaned }
}
