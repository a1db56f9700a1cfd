use serde_json::Value;

use super::{ReasoningCandidate, ReasoningSource};

/// Inspect a provider's final result object for reasoning, in fixed priority
/// order: native reasoning fields, structured content-block arrays, then the
/// reasoning-details array. The first source that yields text wins; the
/// details array is always scanned for an encrypted signature entry.
pub fn extract_from_result(result: &Value) -> Option<ReasoningCandidate> {
    let signature = details_signature(result);

    let texts = native_field_texts(result)
        .or_else(|| content_block_texts(result))
        .or_else(|| details_texts(result));

    match texts {
        Some(texts) if !texts.is_empty() => {
            let mut candidate =
                ReasoningCandidate::visible(texts.join("\n\n"), ReasoningSource::Result);
            candidate.signature = signature;
            Some(candidate)
        }
        // A signature without any recoverable text means the provider
        // reasoned but withheld the content.
        _ => signature.map(|sig| ReasoningCandidate::hidden(ReasoningSource::Result).signature(sig)),
    }
}

/// Pull the visible answer text out of a structured non-streaming result
pub fn extract_message_text(result: &Value) -> Option<String> {
    // OpenAI-style: choices[0].message.content, either a string or blocks
    if let Some(content) = result
        .pointer("/choices/0/message/content")
        .or_else(|| result.pointer("/choices/0/text"))
    {
        if let Some(text) = content.as_str() {
            return Some(text.to_string());
        }
        if let Some(blocks) = content.as_array() {
            let text = join_text_blocks(blocks);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    // Gemini-style: candidates[0].content.parts, skipping thought parts
    if let Some(parts) = result
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    {
        let text: String = parts
            .iter()
            .filter(|p| p.get("thought").and_then(Value::as_bool) != Some(true))
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();
        if !text.is_empty() {
            return Some(text);
        }
    }

    // Anthropic-style: top-level content block array
    if let Some(blocks) = result.get("content").and_then(Value::as_array) {
        let text = join_text_blocks(blocks);
        if !text.is_empty() {
            return Some(text);
        }
    }

    result
        .get("text")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn join_text_blocks(blocks: &[Value]) -> String {
    blocks
        .iter()
        .filter(|b| {
            matches!(
                b.get("type").and_then(Value::as_str),
                Some("text") | Some("output_text") | None
            )
        })
        .filter_map(|b| b.get("text").and_then(Value::as_str))
        .collect()
}

/// Nesting paths a provider's native reasoning field can appear at
const NATIVE_PATHS: &[&str] = &[
    "/reasoning",
    "/reasoning_content",
    "/extra/reasoning",
    "/choices/0/message/reasoning",
    "/choices/0/message/reasoning_content",
    "/choices/0/delta/reasoning",
    "/choices/0/delta/reasoning_content",
];

fn native_field_texts(result: &Value) -> Option<Vec<String>> {
    let mut texts = Vec::new();
    for path in NATIVE_PATHS {
        if let Some(text) = result.pointer(path).and_then(Value::as_str) {
            push_unique(&mut texts, text);
        }
    }
    non_empty(texts)
}

fn content_block_texts(result: &Value) -> Option<Vec<String>> {
    let mut texts = Vec::new();

    let block_arrays = [
        result.get("content"),
        result.pointer("/choices/0/message/content"),
    ];
    for blocks in block_arrays.into_iter().flatten() {
        if let Some(blocks) = blocks.as_array() {
            for block in blocks {
                collect_reasoning_block(block, &mut texts);
            }
        }
    }

    // Gemini marks reasoning parts with a boolean "thought" flag
    if let Some(parts) = result
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    {
        for part in parts {
            if part.get("thought").and_then(Value::as_bool) == Some(true) {
                if let Some(text) = part.get("text").and_then(Value::as_str) {
                    push_unique(&mut texts, text);
                }
            }
        }
    }

    non_empty(texts)
}

fn collect_reasoning_block(block: &Value, texts: &mut Vec<String>) {
    let block_type = block.get("type").and_then(Value::as_str).unwrap_or("");
    if matches!(block_type, "thinking" | "reasoning" | "thought") {
        if let Some(text) = block.get("thinking").and_then(Value::as_str) {
            push_unique(texts, text);
        } else if let Some(text) = block.get("text").and_then(Value::as_str) {
            push_unique(texts, text);
        }
    }

    // Some providers nest a "thinking" array of blocks inside a block
    if let Some(nested) = block.get("thinking").and_then(Value::as_array) {
        for item in nested {
            if let Some(text) = item.as_str() {
                push_unique(texts, text);
            } else if let Some(text) = item.get("text").and_then(Value::as_str) {
                push_unique(texts, text);
            }
        }
    }
}

fn details_array(result: &Value) -> Option<&Vec<Value>> {
    result
        .get("reasoning_details")
        .or_else(|| result.pointer("/choices/0/message/reasoning_details"))
        .and_then(Value::as_array)
}

fn details_texts(result: &Value) -> Option<Vec<String>> {
    let mut texts = Vec::new();
    for entry in details_array(result)?.iter() {
        if entry_is_encrypted(entry) {
            continue;
        }
        if let Some(text) = entry.get("text").and_then(Value::as_str) {
            push_unique(&mut texts, text);
        } else if let Some(text) = entry.get("summary").and_then(Value::as_str) {
            push_unique(&mut texts, text);
        }
    }
    non_empty(texts)
}

/// Opaque signature data from an encrypted details entry, unless the entry id
/// suggests it belongs to a tool call
fn details_signature(result: &Value) -> Option<String> {
    for entry in details_array(result)?.iter() {
        if !entry_is_encrypted(entry) {
            continue;
        }
        let id = entry.get("id").and_then(Value::as_str).unwrap_or("");
        if id.contains("tool") {
            continue;
        }
        if let Some(data) = entry.get("data").and_then(Value::as_str) {
            return Some(data.to_string());
        }
    }
    None
}

fn entry_is_encrypted(entry: &Value) -> bool {
    entry
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| t.contains("encrypted"))
}

fn push_unique(texts: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() && !texts.iter().any(|t| t == trimmed) {
        texts.push(trimmed.to_string());
    }
}

fn non_empty(texts: Vec<String>) -> Option<Vec<String>> {
    if texts.is_empty() {
        None
    } else {
        Some(texts)
    }
}
