//! One-shot schema upgrade applied when threads are loaded. Older records
//! carried single-version messages without swipe arrays and thinking text
//! without reasoning metadata; after this pass every assistant message holds
//! length-aligned swipe arrays and a well-formed `ReasoningMeta`.

use tangent_llm::{normalize, ReasoningSource};

use crate::models::Thread;

pub fn migrate_threads(threads: &mut [Thread]) {
    let mut upgraded = 0usize;
    for thread in threads.iter_mut() {
        for message in thread.messages.iter_mut().filter(|m| m.is_assistant()) {
            if upgrade_message(message) {
                upgraded += 1;
            }
        }
    }
    if upgraded > 0 {
        tracing::debug!(count = upgraded, "upgraded legacy assistant messages");
    }
}

/// Returns true when anything about the record had to change
fn upgrade_message(message: &mut crate::models::Message) -> bool {
    let mut changed = false;

    if message.swipes.is_none() {
        message.ensure_swipes();
        changed = true;
    }

    let swipes = message.swipes.as_mut().expect("swipes materialized above");

    // Ragged parallel arrays are padded or truncated to the text array
    let len = swipes.texts.len().max(1);
    if swipes.texts.is_empty() {
        swipes.texts.push(message.content.clone());
        changed = true;
    }
    if swipes.thinking.len() != len {
        swipes.thinking.resize(len, None);
        changed = true;
    }
    if swipes.reasoning_meta.len() != len {
        swipes.reasoning_meta.resize(len, Default::default());
        changed = true;
    }
    if swipes.timestamps.len() != len {
        swipes.timestamps.resize(len, message.timestamp);
        changed = true;
    }
    if swipes.active >= len {
        swipes.active = len - 1;
        changed = true;
    }

    // Backfill reasoning metadata from the thinking text actually stored
    for (meta, thinking) in swipes.reasoning_meta.iter_mut().zip(swipes.thinking.iter()) {
        let repaired = normalize(Some(meta.clone()), thinking.as_deref());
        if repaired != *meta {
            *meta = repaired;
            changed = true;
        }
    }

    if message.reasoning_meta.is_none() {
        message.reasoning_meta = Some(normalize(None, message.thinking.as_deref()));
        changed = true;
        if let Some(meta) = &mut message.reasoning_meta {
            meta.source = ReasoningSource::Legacy;
        }
    }

    message.sync_from_active_swipe();
    changed
}
