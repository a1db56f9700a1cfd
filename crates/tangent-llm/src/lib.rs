pub mod backend;
pub mod error;
pub mod reasoning;
pub mod request;
pub mod sse;
pub mod transport;
pub mod types;

pub use backend::{profile, BackendKind, BackendProfile};
pub use error::TransportError;
pub use reasoning::{
    extract_from_result, extract_message_text, merge_candidates, normalize, parse_inline_tags,
    MergedReasoning, ReasoningCandidate, ReasoningMeta, ReasoningSource, ReasoningState, TagParse,
    REASONING_SEPARATOR,
};
pub use request::build_request_body;
pub use sse::{decode_sse, SseLineBuffer};
pub use transport::StreamTransport;
pub use types::{ChatMessage, Role, SamplingParams, TokenDelta};
