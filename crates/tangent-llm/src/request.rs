use serde_json::Value;

use crate::backend::{profile, BackendKind};
use crate::types::{ChatMessage, SamplingParams};

/// Build the POST body for a streaming completion request: the common core
/// every backend shares, then the backend profile's adjustments on top.
pub fn build_request_body(
    backend: BackendKind,
    messages: &[ChatMessage],
    params: &SamplingParams,
) -> Value {
    let mut request = serde_json::json!({
        "model": params.model,
        "messages": messages,
        "stream": true,
    });

    let obj = request
        .as_object_mut()
        .expect("request body is always an object");

    if let Some(temp) = params.temperature {
        obj.insert("temperature".to_string(), serde_json::json!(temp));
    }
    if let Some(max_tokens) = params.max_tokens {
        obj.insert("max_tokens".to_string(), serde_json::json!(max_tokens));
    }
    if let Some(top_p) = params.top_p {
        obj.insert("top_p".to_string(), serde_json::json!(top_p));
    }
    if let Some(presence) = params.presence_penalty {
        obj.insert("presence_penalty".to_string(), serde_json::json!(presence));
    }
    if let Some(frequency) = params.frequency_penalty {
        obj.insert("frequency_penalty".to_string(), serde_json::json!(frequency));
    }

    let backend_profile = profile(backend);
    if backend_profile.supports_seed {
        if let Some(seed) = params.seed {
            obj.insert("seed".to_string(), serde_json::json!(seed));
        }
    }

    (backend_profile.prepare)(obj, params);
    request
}
