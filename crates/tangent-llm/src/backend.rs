//! Per-backend integration table. Each backend contributes a small static
//! profile (request adjustments + token extraction) so the request builder
//! and the SSE decode loop stay backend-agnostic.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{SamplingParams, TokenDelta};

/// Identifier of the completion backend the request is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    OpenAi,
    Claude,
    OpenRouter,
    MakerSuite,
    MistralAi,
    Cohere,
    Perplexity,
    Groq,
    DeepSeek,
    Xai,
    Ai21,
    NanoGpt,
    ZeroOneAi,
    Pollinations,
    Aimlapi,
    Moonshot,
    Fireworks,
    Together,
    Scale,
    WindowAi,
    BlockEntropy,
    Custom,
}

impl BackendKind {
    pub const ALL: &'static [BackendKind] = &[
        BackendKind::OpenAi,
        BackendKind::Claude,
        BackendKind::OpenRouter,
        BackendKind::MakerSuite,
        BackendKind::MistralAi,
        BackendKind::Cohere,
        BackendKind::Perplexity,
        BackendKind::Groq,
        BackendKind::DeepSeek,
        BackendKind::Xai,
        BackendKind::Ai21,
        BackendKind::NanoGpt,
        BackendKind::ZeroOneAi,
        BackendKind::Pollinations,
        BackendKind::Aimlapi,
        BackendKind::Moonshot,
        BackendKind::Fireworks,
        BackendKind::Together,
        BackendKind::Scale,
        BackendKind::WindowAi,
        BackendKind::BlockEntropy,
        BackendKind::Custom,
    ];
}

/// Static record of one backend's quirks
pub struct BackendProfile {
    /// Seed support is an explicit allow-list; other backends reject the field
    pub supports_seed: bool,
    /// Mutates the common request body: extra fields in, rejected fields out
    pub prepare: fn(&mut Map<String, Value>, &SamplingParams),
    /// Pulls `{text, reasoning}` out of one decoded SSE payload
    pub extract: fn(&Value) -> TokenDelta,
}

/// Look up the static profile for a backend
pub fn profile(kind: BackendKind) -> &'static BackendProfile {
    match kind {
        BackendKind::OpenAi => &OPENAI,
        BackendKind::Claude => &CLAUDE,
        BackendKind::OpenRouter => &OPENROUTER,
        BackendKind::MakerSuite => &MAKERSUITE,
        BackendKind::MistralAi => &MISTRALAI,
        BackendKind::Cohere => &COHERE,
        BackendKind::Perplexity => &PERPLEXITY,
        BackendKind::Groq => &GROQ,
        BackendKind::DeepSeek => &DEEPSEEK,
        BackendKind::Xai => &XAI,
        BackendKind::Ai21 => &AI21,
        BackendKind::NanoGpt => &NANOGPT,
        BackendKind::ZeroOneAi => &ZEROONEAI,
        BackendKind::Pollinations => &POLLINATIONS,
        BackendKind::Aimlapi => &AIMLAPI,
        BackendKind::Moonshot => &MOONSHOT,
        BackendKind::Fireworks => &FIREWORKS,
        BackendKind::Together => &TOGETHER,
        BackendKind::Scale => &SCALE,
        BackendKind::WindowAi => &WINDOWAI,
        BackendKind::BlockEntropy => &BLOCKENTROPY,
        BackendKind::Custom => &CUSTOM,
    }
}

macro_rules! backend_profile {
    ($name:ident, seed: $seed:expr, prepare: $prepare:expr, extract: $extract:expr) => {
        static $name: BackendProfile = BackendProfile {
            supports_seed: $seed,
            prepare: $prepare,
            extract: $extract,
        };
    };
}

backend_profile!(OPENAI, seed: true, prepare: prepare_proxy, extract: extract_openai);
backend_profile!(CLAUDE, seed: false, prepare: prepare_claude, extract: extract_claude);
backend_profile!(OPENROUTER, seed: true, prepare: prepare_noop, extract: extract_openai);
backend_profile!(MAKERSUITE, seed: false, prepare: prepare_makersuite, extract: extract_google);
backend_profile!(MISTRALAI, seed: true, prepare: prepare_mistral, extract: extract_openai);
backend_profile!(COHERE, seed: false, prepare: prepare_cohere, extract: extract_cohere);
backend_profile!(PERPLEXITY, seed: false, prepare: prepare_perplexity, extract: extract_openai);
backend_profile!(GROQ, seed: true, prepare: prepare_noop, extract: extract_openai);
backend_profile!(DEEPSEEK, seed: true, prepare: prepare_noop, extract: extract_openai);
backend_profile!(XAI, seed: false, prepare: prepare_xai, extract: extract_openai);
backend_profile!(AI21, seed: false, prepare: prepare_ai21, extract: extract_openai);
backend_profile!(NANOGPT, seed: false, prepare: prepare_noop, extract: extract_openai);
backend_profile!(ZEROONEAI, seed: false, prepare: prepare_zeroone, extract: extract_openai);
backend_profile!(POLLINATIONS, seed: false, prepare: prepare_noop, extract: extract_openai);
backend_profile!(AIMLAPI, seed: false, prepare: prepare_noop, extract: extract_openai);
backend_profile!(MOONSHOT, seed: false, prepare: prepare_noop, extract: extract_openai);
backend_profile!(FIREWORKS, seed: false, prepare: prepare_noop, extract: extract_openai);
backend_profile!(TOGETHER, seed: true, prepare: prepare_noop, extract: extract_openai);
backend_profile!(SCALE, seed: false, prepare: prepare_scale, extract: extract_openai);
backend_profile!(WINDOWAI, seed: false, prepare: prepare_noop, extract: extract_openai);
backend_profile!(BLOCKENTROPY, seed: false, prepare: prepare_noop, extract: extract_openai);
backend_profile!(CUSTOM, seed: true, prepare: prepare_proxy, extract: extract_openai);

// ---------------------------------------------------------------------------
// Request preparation
// ---------------------------------------------------------------------------

fn prepare_noop(_body: &mut Map<String, Value>, _params: &SamplingParams) {}

/// Reverse-proxy credentials for backends routed through a user proxy
fn prepare_proxy(body: &mut Map<String, Value>, params: &SamplingParams) {
    if let Some(ref proxy) = params.reverse_proxy {
        body.insert("reverse_proxy".to_string(), Value::String(proxy.clone()));
    }
    if let Some(ref password) = params.proxy_password {
        body.insert("proxy_password".to_string(), Value::String(password.clone()));
    }
}

/// Anthropic rejects the OpenAI penalty fields and takes top_k
fn prepare_claude(body: &mut Map<String, Value>, params: &SamplingParams) {
    body.remove("presence_penalty");
    body.remove("frequency_penalty");
    if let Some(top_k) = params.top_k {
        body.insert("top_k".to_string(), Value::from(top_k));
    }
    prepare_proxy(body, params);
}

/// Gemini ignores penalties and takes top_k
fn prepare_makersuite(body: &mut Map<String, Value>, params: &SamplingParams) {
    body.remove("presence_penalty");
    body.remove("frequency_penalty");
    if let Some(top_k) = params.top_k {
        body.insert("top_k".to_string(), Value::from(top_k));
    }
}

/// Mistral rejects both penalty fields being present at once
fn prepare_mistral(body: &mut Map<String, Value>, _params: &SamplingParams) {
    if body.contains_key("presence_penalty") {
        body.remove("frequency_penalty");
    }
}

fn prepare_cohere(body: &mut Map<String, Value>, params: &SamplingParams) {
    // Cohere caps p at 0.99 and names k differently
    if let Some(top_p) = params.top_p {
        body.insert("p".to_string(), Value::from(top_p.min(0.99)));
        body.remove("top_p");
    }
    if let Some(top_k) = params.top_k {
        body.insert("k".to_string(), Value::from(top_k));
    }
}

/// Perplexity rejects presence and frequency penalties together
fn prepare_perplexity(body: &mut Map<String, Value>, _params: &SamplingParams) {
    if body.contains_key("presence_penalty") {
        body.remove("frequency_penalty");
    }
}

fn prepare_xai(body: &mut Map<String, Value>, _params: &SamplingParams) {
    body.remove("presence_penalty");
    body.remove("frequency_penalty");
}

fn prepare_ai21(body: &mut Map<String, Value>, _params: &SamplingParams) {
    body.remove("presence_penalty");
    body.remove("frequency_penalty");
}

fn prepare_zeroone(body: &mut Map<String, Value>, _params: &SamplingParams) {
    body.remove("frequency_penalty");
    body.remove("presence_penalty");
    body.remove("top_p");
}

fn prepare_scale(body: &mut Map<String, Value>, _params: &SamplingParams) {
    body.remove("max_tokens");
}

// ---------------------------------------------------------------------------
// Token extraction per wire dialect
// ---------------------------------------------------------------------------

/// OpenAI-style `choices[0].delta`, with the reasoning field under either of
/// the two names in circulation
fn extract_openai(payload: &Value) -> TokenDelta {
    let delta = payload.pointer("/choices/0/delta");
    let text = delta
        .and_then(|d| d.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let reasoning = delta
        .and_then(|d| {
            d.get("reasoning_content")
                .or_else(|| d.get("reasoning"))
        })
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    TokenDelta {
        text,
        reasoning,
        signature: None,
    }
}

/// Anthropic `delta.type` discriminated union
fn extract_claude(payload: &Value) -> TokenDelta {
    let mut delta = TokenDelta::default();
    let Some(inner) = payload.get("delta") else {
        return delta;
    };
    match inner.get("type").and_then(Value::as_str) {
        Some("text_delta") => {
            delta.text = inner
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
        }
        Some("thinking_delta") => {
            delta.reasoning = inner
                .get("thinking")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
        }
        Some("signature_delta") => {
            delta.signature = inner
                .get("signature")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
        _ => {}
    }
    delta
}

/// Google `candidates[0].content.parts`, each part carrying a `thought` flag
fn extract_google(payload: &Value) -> TokenDelta {
    let mut delta = TokenDelta::default();
    let Some(parts) = payload
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    else {
        return delta;
    };
    for part in parts {
        let Some(text) = part.get("text").and_then(Value::as_str) else {
            continue;
        };
        if part.get("thought").and_then(Value::as_bool) == Some(true) {
            delta.reasoning.push_str(text);
        } else {
            delta.text.push_str(text);
        }
    }
    delta
}

/// Cohere v2 `delta.message.content.text`
fn extract_cohere(payload: &Value) -> TokenDelta {
    TokenDelta {
        text: payload
            .pointer("/delta/message/content/text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        reasoning: String::new(),
        signature: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_backend_profile_tolerates_empty_inputs() {
        let params = SamplingParams::new("m");
        for kind in BackendKind::ALL {
            let p = profile(*kind);
            let mut body = Map::new();
            (p.prepare)(&mut body, &params);
            assert!((p.extract)(&json!({})).is_empty());
        }
    }

    #[test]
    fn openai_delta_extraction() {
        let payload = json!({"choices": [{"delta": {"content": "Hi", "reasoning": "hm"}}]});
        let delta = extract_openai(&payload);
        assert_eq!(delta.text, "Hi");
        assert_eq!(delta.reasoning, "hm");
    }

    #[test]
    fn openai_reasoning_content_name_is_accepted() {
        let payload = json!({"choices": [{"delta": {"reasoning_content": "deep"}}]});
        assert_eq!(extract_openai(&payload).reasoning, "deep");
    }

    #[test]
    fn claude_thinking_and_signature_deltas() {
        let thinking = json!({"delta": {"type": "thinking_delta", "thinking": "mull"}});
        assert_eq!(extract_claude(&thinking).reasoning, "mull");

        let signature = json!({"delta": {"type": "signature_delta", "signature": "sig=="}});
        assert_eq!(
            extract_claude(&signature).signature.as_deref(),
            Some("sig==")
        );

        let text = json!({"delta": {"type": "text_delta", "text": "out"}});
        assert_eq!(extract_claude(&text).text, "out");
    }

    #[test]
    fn google_parts_split_on_thought_flag() {
        let payload = json!({"candidates": [{"content": {"parts": [
            {"thought": true, "text": "think "},
            {"text": "answer"},
        ]}}]});
        let delta = extract_google(&payload);
        assert_eq!(delta.reasoning, "think ");
        assert_eq!(delta.text, "answer");
    }

    #[test]
    fn cohere_nested_message_text() {
        let payload = json!({"delta": {"message": {"content": {"text": "chunk"}}}});
        assert_eq!(extract_cohere(&payload).text, "chunk");
    }

    #[test]
    fn claude_profile_strips_penalties() {
        let params = SamplingParams::new("claude-3");
        let mut body = Map::new();
        body.insert("presence_penalty".to_string(), json!(0.5));
        body.insert("frequency_penalty".to_string(), json!(0.5));
        (profile(BackendKind::Claude).prepare)(&mut body, &params);
        assert!(!body.contains_key("presence_penalty"));
        assert!(!body.contains_key("frequency_penalty"));
    }

    #[test]
    fn seed_allow_list_is_explicit() {
        assert!(profile(BackendKind::OpenAi).supports_seed);
        assert!(profile(BackendKind::DeepSeek).supports_seed);
        assert!(!profile(BackendKind::Claude).supports_seed);
        assert!(!profile(BackendKind::MakerSuite).supports_seed);
    }
}
