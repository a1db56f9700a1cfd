//! # Tangent - branch-aware assistant threads for chat frontends
//!
//! Tangent turns a host chat application into a question-answering surface:
//! side conversations ("tangents") about an ongoing chat, each with its own
//! thread history, streamed token-by-token from any of twenty-plus OpenAI-,
//! Anthropic-, Google- or Cohere-shaped completion backends.
//!
//! - **Streaming transport** (SSE decoding with per-backend dialects)
//! - **Reasoning normalization** (stream deltas, result objects, and inline
//!   `<think>` tags reconciled into one canonical record)
//! - **Thread store** (swipes, branch-aware visibility, schema migration)
//! - **Generation engine** (single-flight orchestration, titles, retries)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tangent::prelude::*;
//! use std::sync::Arc;
//!
//! # fn hosts() -> (Arc<dyn PromptContextProvider>, Arc<dyn QuietGenerator>) { unimplemented!() }
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (context, quiet) = hosts();
//!     let engine = EngineBuilder::new()
//!         .context(context)
//!         .quiet(quiet)
//!         .transport("https://api.openai.com/v1/chat/completions", BackendKind::OpenAi, Some("sk-..."))
//!         .model("gpt-4o-mini")
//!         .build()?;
//!
//!     let thread_id = engine.create_thread("Untitled").await?;
//!     let outcome = engine
//!         .generate(
//!             GenerationRequest { thread_id, question: "What happened so far?".into() },
//!             CancellationToken::new(),
//!             None,
//!         )
//!         .await;
//!     println!("{}", outcome.response.unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Tangent consists of three composable crates:
//!
//! - **tangent-llm**: backend profiles, request shaping, SSE stream decoding,
//!   and reasoning extraction/merging
//! - **tangent-store**: threads, messages, swipes, and branch filtering
//! - **tangent-engine**: the generation orchestrator and its host-boundary
//!   traits

// Re-export all public APIs
pub use tangent_engine as engine;
pub use tangent_llm as llm;
pub use tangent_store as store;

// Re-export commonly used types
pub use tangent_engine::{
    EngineSettings, GenerationOrchestrator, GenerationOutcome, GenerationRequest,
    PromptContextProvider, QuietGenerator,
};
pub use tangent_llm::{BackendKind, SamplingParams, StreamTransport, TokenDelta};
pub use tangent_store::{Message, Thread, ThreadStore};

/// High-level builder for wiring up the generation engine
pub mod builder;

/// Convenient prelude with commonly used types
pub mod prelude {
    pub use crate::builder::EngineBuilder;
    pub use crate::engine::{
        GenerationOrchestrator, GenerationOutcome, GenerationRequest, ProfileControl,
        PromptContextProvider, QuietGenerator, QuietReply,
    };
    pub use crate::llm::{BackendKind, SamplingParams, TokenDelta};
    pub use crate::store::{Message, MessageStatus, Thread, ThreadStore};
    pub use anyhow::Result;
    pub use tokio_util::sync::CancellationToken;
}
