use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::migrate::migrate_threads;
use crate::models::{ContextSettings, Message, MessageRole, MessageStatus, Thread};
use tangent_llm::ReasoningMeta;

/// Outcome of deleting one swipe version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDeletion {
    /// Versions remain; the new count
    Remaining(usize),
    /// The last version was removed. The message itself is left in place;
    /// the caller must delete it.
    Emptied,
}

/// A thread's messages partitioned against the current host chat length.
/// Branched messages are retained, never deleted.
#[derive(Debug)]
pub struct BranchView<'a> {
    pub thread: &'a Thread,
    pub visible: Vec<&'a Message>,
    pub branched: Vec<&'a Message>,
}

/// In-memory thread/message store. All mutations are synchronous; durability
/// is the caller's job via `ThreadPersistence` after each mutation batch.
#[derive(Debug, Default)]
pub struct ThreadStore {
    threads: Vec<Thread>,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load previously persisted threads, applying the legacy schema upgrade
    pub fn from_threads(mut threads: Vec<Thread>) -> Self {
        migrate_threads(&mut threads);
        Self { threads }
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn snapshot(&self) -> Vec<Thread> {
        self.threads.clone()
    }

    // -----------------------------------------------------------------------
    // Thread CRUD
    // -----------------------------------------------------------------------

    /// Create a thread and return its id. New threads are prepended so the
    /// list stays most-recent-first.
    pub fn create_thread(
        &mut self,
        name: impl Into<String>,
        context_settings: Option<ContextSettings>,
    ) -> Uuid {
        let thread = Thread::new(name, context_settings);
        let id = thread.id;
        self.threads.insert(0, thread);
        id
    }

    pub fn thread(&self, thread_id: Uuid) -> Option<&Thread> {
        self.threads.iter().find(|t| t.id == thread_id)
    }

    fn thread_mut(&mut self, thread_id: Uuid) -> Result<&mut Thread> {
        self.threads
            .iter_mut()
            .find(|t| t.id == thread_id)
            .ok_or(StoreError::ThreadNotFound(thread_id))
    }

    pub fn rename_thread(&mut self, thread_id: Uuid, name: impl Into<String>) -> Result<()> {
        let thread = self.thread_mut(thread_id)?;
        thread.name = name.into();
        thread.touch();
        Ok(())
    }

    pub fn update_context_settings(
        &mut self,
        thread_id: Uuid,
        settings: ContextSettings,
    ) -> Result<()> {
        let thread = self.thread_mut(thread_id)?;
        thread.context_settings = Some(settings);
        thread.touch();
        Ok(())
    }

    pub fn delete_thread(&mut self, thread_id: Uuid) -> Result<()> {
        let before = self.threads.len();
        self.threads.retain(|t| t.id != thread_id);
        if self.threads.len() == before {
            return Err(StoreError::ThreadNotFound(thread_id));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.threads.clear();
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    /// Append a message, stamping the host chat length when no explicit
    /// index is supplied
    pub fn add_message(
        &mut self,
        thread_id: Uuid,
        role: MessageRole,
        content: impl Into<String>,
        status: MessageStatus,
        explicit_index: Option<usize>,
        host_chat_length: usize,
    ) -> Result<Uuid> {
        let thread = self.thread_mut(thread_id)?;
        let index = explicit_index.unwrap_or(host_chat_length);
        let message = Message::new(role, content, status, index);
        let id = message.id;
        thread.messages.push(message);
        thread.touch();
        Ok(id)
    }

    pub fn message(&self, thread_id: Uuid, message_id: Uuid) -> Result<&Message> {
        self.thread(thread_id)
            .ok_or(StoreError::ThreadNotFound(thread_id))?
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .ok_or(StoreError::MessageNotFound(message_id))
    }

    fn message_mut(&mut self, thread_id: Uuid, message_id: Uuid) -> Result<&mut Message> {
        self.thread_mut(thread_id)?
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or(StoreError::MessageNotFound(message_id))
    }

    /// Apply a mutation to one message. The swipe mirror is re-synced from
    /// the top-level fields afterwards, so generation results written here
    /// land in the active swipe slot too.
    pub fn update_message(
        &mut self,
        thread_id: Uuid,
        message_id: Uuid,
        mutate: impl FnOnce(&mut Message),
    ) -> Result<()> {
        let thread = self.thread_mut(thread_id)?;
        let message = thread
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or(StoreError::MessageNotFound(message_id))?;
        mutate(message);
        message.write_back_active_swipe();
        thread.touch();
        Ok(())
    }

    pub fn remove_message(&mut self, thread_id: Uuid, message_id: Uuid) -> Result<Message> {
        let thread = self.thread_mut(thread_id)?;
        let position = thread
            .messages
            .iter()
            .position(|m| m.id == message_id)
            .ok_or(StoreError::MessageNotFound(message_id))?;
        let message = thread.messages.remove(position);
        thread.touch();
        Ok(message)
    }

    // -----------------------------------------------------------------------
    // Swipes
    // -----------------------------------------------------------------------

    fn assistant_mut(&mut self, thread_id: Uuid, message_id: Uuid) -> Result<&mut Message> {
        let message = self.message_mut(thread_id, message_id)?;
        if !message.is_assistant() {
            return Err(StoreError::NotAssistantMessage(message_id));
        }
        Ok(message)
    }

    /// Append a new version and make it active
    pub fn add_swipe(
        &mut self,
        thread_id: Uuid,
        message_id: Uuid,
        text: impl Into<String>,
        thinking: Option<String>,
        reasoning_meta: ReasoningMeta,
    ) -> Result<usize> {
        let message = self.assistant_mut(thread_id, message_id)?;
        let swipes = message.ensure_swipes();
        swipes.texts.push(text.into());
        swipes.thinking.push(thinking);
        swipes.reasoning_meta.push(reasoning_meta);
        swipes.timestamps.push(chrono::Utc::now());
        swipes.active = swipes.len() - 1;
        let active = swipes.active;
        message.sync_from_active_swipe();
        self.thread_mut(thread_id)?.touch();
        Ok(active)
    }

    /// Switch the active version; the index must be in range
    pub fn set_active_swipe(
        &mut self,
        thread_id: Uuid,
        message_id: Uuid,
        index: usize,
    ) -> Result<()> {
        let message = self.assistant_mut(thread_id, message_id)?;
        let swipes = message.ensure_swipes();
        if index >= swipes.len() {
            return Err(StoreError::InvalidSwipeIndex {
                index,
                len: swipes.len(),
            });
        }
        swipes.active = index;
        message.sync_from_active_swipe();
        self.thread_mut(thread_id)?.touch();
        Ok(())
    }

    /// Remove one version. When the removed index preceded or equalled the
    /// active one the active index shifts down, clamped into range.
    pub fn delete_swipe(
        &mut self,
        thread_id: Uuid,
        message_id: Uuid,
        index: usize,
    ) -> Result<SwipeDeletion> {
        let message = self.assistant_mut(thread_id, message_id)?;
        let swipes = message.ensure_swipes();
        if index >= swipes.len() {
            return Err(StoreError::InvalidSwipeIndex {
                index,
                len: swipes.len(),
            });
        }

        swipes.texts.remove(index);
        swipes.thinking.remove(index);
        swipes.reasoning_meta.remove(index);
        swipes.timestamps.remove(index);

        if swipes.is_empty() {
            self.thread_mut(thread_id)?.touch();
            return Ok(SwipeDeletion::Emptied);
        }

        if index <= swipes.active {
            swipes.active = swipes.active.saturating_sub(1);
        }
        swipes.active = swipes.active.min(swipes.len() - 1);
        let remaining = swipes.len();
        message.sync_from_active_swipe();
        self.thread_mut(thread_id)?.touch();
        Ok(SwipeDeletion::Remaining(remaining))
    }

    // -----------------------------------------------------------------------
    // Branch-aware reads
    // -----------------------------------------------------------------------

    /// Partition a thread's messages into those visible at the current host
    /// chat length and those belonging to a since-abandoned branch. Messages
    /// lacking a stamp are legacy and always visible.
    pub fn thread_for_branch(&self, thread_id: Uuid, chat_length: usize) -> Result<BranchView<'_>> {
        let thread = self
            .thread(thread_id)
            .ok_or(StoreError::ThreadNotFound(thread_id))?;
        Ok(Self::partition(thread, chat_length))
    }

    pub fn threads_for_branch(&self, chat_length: usize) -> Vec<BranchView<'_>> {
        self.threads
            .iter()
            .map(|thread| Self::partition(thread, chat_length))
            .collect()
    }

    fn partition(thread: &Thread, chat_length: usize) -> BranchView<'_> {
        let (visible, branched) = thread.messages.iter().partition(|m| {
            m.chat_message_index
                .map(|index| index <= chat_length)
                .unwrap_or(true)
        });
        BranchView {
            thread,
            visible,
            branched,
        }
    }
}
