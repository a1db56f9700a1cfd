use tangent_store::{MessageRole, MessageStatus, ThreadStore};

#[test]
fn new_threads_are_prepended() {
    let mut store = ThreadStore::new();
    let first = store.create_thread("first", None);
    let second = store.create_thread("second", None);

    assert_eq!(store.threads()[0].id, second);
    assert_eq!(store.threads()[1].id, first);
}

#[test]
fn branch_filter_partitions_on_stamped_index() {
    let mut store = ThreadStore::new();
    let thread_id = store.create_thread("thread", None);

    for index in [0usize, 2, 5, 9] {
        store
            .add_message(
                thread_id,
                MessageRole::User,
                format!("at {}", index),
                MessageStatus::Complete,
                Some(index),
                0,
            )
            .unwrap();
    }

    let view = store.thread_for_branch(thread_id, 5).unwrap();
    let visible: Vec<_> = view
        .visible
        .iter()
        .map(|m| m.chat_message_index.unwrap())
        .collect();
    let branched: Vec<_> = view
        .branched
        .iter()
        .map(|m| m.chat_message_index.unwrap())
        .collect();

    assert_eq!(visible, vec![0, 2, 5]);
    assert_eq!(branched, vec![9]);
}

#[test]
fn legacy_messages_without_stamp_are_always_visible() {
    let mut store = ThreadStore::new();
    let thread_id = store.create_thread("thread", None);
    let message_id = store
        .add_message(
            thread_id,
            MessageRole::User,
            "old",
            MessageStatus::Complete,
            Some(100),
            0,
        )
        .unwrap();
    store
        .update_message(thread_id, message_id, |m| m.chat_message_index = None)
        .unwrap();

    let view = store.thread_for_branch(thread_id, 0).unwrap();
    assert_eq!(view.visible.len(), 1);
    assert!(view.branched.is_empty());
}

#[test]
fn branch_filter_does_not_mutate_stored_data() {
    let mut store = ThreadStore::new();
    let thread_id = store.create_thread("thread", None);
    store
        .add_message(
            thread_id,
            MessageRole::User,
            "beyond",
            MessageStatus::Complete,
            Some(10),
            0,
        )
        .unwrap();

    {
        let view = store.thread_for_branch(thread_id, 3).unwrap();
        assert!(view.visible.is_empty());
        assert_eq!(view.branched.len(), 1);
    }

    // The excluded message is retained, not deleted
    assert_eq!(store.thread(thread_id).unwrap().messages.len(), 1);
    let view = store.thread_for_branch(thread_id, 10).unwrap();
    assert_eq!(view.visible.len(), 1);
}

#[test]
fn add_message_stamps_host_chat_length_by_default() {
    let mut store = ThreadStore::new();
    let thread_id = store.create_thread("thread", None);
    let message_id = store
        .add_message(
            thread_id,
            MessageRole::User,
            "q",
            MessageStatus::Complete,
            None,
            7,
        )
        .unwrap();

    let message = store.message(thread_id, message_id).unwrap();
    assert_eq!(message.chat_message_index, Some(7));
}

#[test]
fn updated_at_refreshes_on_message_mutation() {
    let mut store = ThreadStore::new();
    let thread_id = store.create_thread("thread", None);
    let before = store.thread(thread_id).unwrap().updated_at;
    let message_id = store
        .add_message(
            thread_id,
            MessageRole::Assistant,
            "",
            MessageStatus::Pending,
            None,
            0,
        )
        .unwrap();
    store
        .update_message(thread_id, message_id, |m| {
            m.status = MessageStatus::Complete;
            m.content = "done".to_string();
        })
        .unwrap();

    assert!(store.thread(thread_id).unwrap().updated_at >= before);
}
