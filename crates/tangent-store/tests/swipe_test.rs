use rand::prelude::*;
use tangent_llm::{ReasoningMeta, ReasoningSource, ReasoningState};
use tangent_store::{
    MessageRole, MessageStatus, SwipeDeletion, SwipeSet, StoreError, ThreadStore,
};
use uuid::Uuid;

fn store_with_assistant() -> (ThreadStore, Uuid, Uuid) {
    let mut store = ThreadStore::new();
    let thread_id = store.create_thread("thread", None);
    store
        .add_message(
            thread_id,
            MessageRole::User,
            "question",
            MessageStatus::Complete,
            None,
            3,
        )
        .unwrap();
    let message_id = store
        .add_message(
            thread_id,
            MessageRole::Assistant,
            "first answer",
            MessageStatus::Complete,
            None,
            3,
        )
        .unwrap();
    (store, thread_id, message_id)
}

fn assert_swipe_invariant(swipes: &SwipeSet) {
    let len = swipes.texts.len();
    assert!(len >= 1, "swipe arrays must never be empty");
    assert_eq!(swipes.thinking.len(), len);
    assert_eq!(swipes.reasoning_meta.len(), len);
    assert_eq!(swipes.timestamps.len(), len);
    assert!(swipes.active < len, "active index out of range");
}

#[test]
fn add_swipe_materializes_arrays_and_activates_new_version() {
    let (mut store, thread_id, message_id) = store_with_assistant();

    let active = store
        .add_swipe(
            thread_id,
            message_id,
            "second answer",
            Some("thought".to_string()),
            ReasoningMeta {
                state: ReasoningState::Visible,
                source: ReasoningSource::Stream,
                duration_ms: Some(100),
                signature: None,
            },
        )
        .unwrap();

    assert_eq!(active, 1);
    let message = store.message(thread_id, message_id).unwrap();
    let swipes = message.swipes.as_ref().unwrap();
    assert_swipe_invariant(swipes);
    assert_eq!(swipes.texts, vec!["first answer", "second answer"]);
    // Top-level fields mirror the active swipe
    assert_eq!(message.content, "second answer");
    assert_eq!(message.thinking.as_deref(), Some("thought"));
    assert_eq!(
        message.reasoning_meta.as_ref().unwrap().duration_ms,
        Some(100)
    );
}

#[test]
fn set_active_swipe_validates_range() {
    let (mut store, thread_id, message_id) = store_with_assistant();
    store
        .add_swipe(thread_id, message_id, "alt", None, ReasoningMeta::default())
        .unwrap();

    store.set_active_swipe(thread_id, message_id, 0).unwrap();
    assert_eq!(
        store.message(thread_id, message_id).unwrap().content,
        "first answer"
    );

    let err = store.set_active_swipe(thread_id, message_id, 5).unwrap_err();
    assert!(matches!(
        err,
        StoreError::InvalidSwipeIndex { index: 5, len: 2 }
    ));
}

#[test]
fn delete_swipe_shifts_active_down() {
    let (mut store, thread_id, message_id) = store_with_assistant();
    store
        .add_swipe(thread_id, message_id, "b", None, ReasoningMeta::default())
        .unwrap();
    store
        .add_swipe(thread_id, message_id, "c", None, ReasoningMeta::default())
        .unwrap();

    // active = 2 ("c"); deleting index 0 shifts active to 1, still "c"
    let outcome = store.delete_swipe(thread_id, message_id, 0).unwrap();
    assert_eq!(outcome, SwipeDeletion::Remaining(2));
    let message = store.message(thread_id, message_id).unwrap();
    assert_eq!(message.content, "c");
    assert_swipe_invariant(message.swipes.as_ref().unwrap());
}

#[test]
fn delete_last_swipe_signals_emptied() {
    let (mut store, thread_id, message_id) = store_with_assistant();
    // Materialize a single-version swipe set, then delete it
    store.set_active_swipe(thread_id, message_id, 0).unwrap();

    let outcome = store.delete_swipe(thread_id, message_id, 0).unwrap();
    assert_eq!(outcome, SwipeDeletion::Emptied);

    // The message is still there; deleting it is the caller's move
    assert!(store.message(thread_id, message_id).is_ok());
    store.remove_message(thread_id, message_id).unwrap();
    assert!(store.message(thread_id, message_id).is_err());
}

#[test]
fn swipe_ops_reject_user_messages() {
    let mut store = ThreadStore::new();
    let thread_id = store.create_thread("thread", None);
    let user_id = store
        .add_message(
            thread_id,
            MessageRole::User,
            "q",
            MessageStatus::Complete,
            None,
            0,
        )
        .unwrap();

    let err = store
        .add_swipe(thread_id, user_id, "x", None, ReasoningMeta::default())
        .unwrap_err();
    assert!(matches!(err, StoreError::NotAssistantMessage(_)));
}

/// Property check: after any sequence of swipe operations the four parallel
/// arrays stay length-aligned and the active index stays in range.
#[test]
fn swipe_arrays_stay_aligned_under_random_operations() {
    let mut rng = StdRng::seed_from_u64(0x7a4e);

    for _ in 0..50 {
        let (mut store, thread_id, message_id) = store_with_assistant();

        for _ in 0..40 {
            match rng.random_range(0..3u8) {
                0 => {
                    store
                        .add_swipe(
                            thread_id,
                            message_id,
                            format!("swipe {}", rng.random_range(0..1000)),
                            None,
                            ReasoningMeta::default(),
                        )
                        .unwrap();
                }
                1 => {
                    let len = store
                        .message(thread_id, message_id)
                        .unwrap()
                        .swipes
                        .as_ref()
                        .map(SwipeSet::len)
                        .unwrap_or(1);
                    // Deliberately sample out of range sometimes
                    let index = rng.random_range(0..len + 2);
                    let _ = store.set_active_swipe(thread_id, message_id, index);
                }
                _ => {
                    let len = store
                        .message(thread_id, message_id)
                        .unwrap()
                        .swipes
                        .as_ref()
                        .map(SwipeSet::len)
                        .unwrap_or(1);
                    if len > 1 {
                        let index = rng.random_range(0..len);
                        match store.delete_swipe(thread_id, message_id, index).unwrap() {
                            SwipeDeletion::Remaining(_) => {}
                            SwipeDeletion::Emptied => unreachable!("len > 1 guarded"),
                        }
                    }
                }
            }

            if let Some(swipes) = &store.message(thread_id, message_id).unwrap().swipes {
                assert_swipe_invariant(swipes);
                // Mirror invariant holds after every mutation
                let message = store.message(thread_id, message_id).unwrap();
                assert_eq!(message.content, swipes.texts[swipes.active]);
            }
        }
    }
}
