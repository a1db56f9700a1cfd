use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tangent_llm::ReasoningMeta;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Lifecycle of one generation attempt. A message transitions out of
/// `Pending` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Complete,
    Failed,
    Cancelled,
}

/// Alternate versions of one assistant message. The four arrays are parallel
/// and always length-aligned; `active` indexes into all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeSet {
    pub texts: Vec<String>,
    pub thinking: Vec<Option<String>>,
    pub reasoning_meta: Vec<ReasoningMeta>,
    pub timestamps: Vec<DateTime<Utc>>,
    pub active: usize,
}

impl SwipeSet {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub status: MessageStatus,
    /// Host chat length at creation time, used for branch filtering.
    /// Absent on records predating the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_message_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_meta: Option<ReasoningMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swipes: Option<SwipeSet>,
}

impl Message {
    pub fn new(
        role: MessageRole,
        content: impl Into<String>,
        status: MessageStatus,
        chat_message_index: usize,
    ) -> Self {
        let reasoning_meta = match role {
            MessageRole::Assistant => Some(ReasoningMeta::default()),
            MessageRole::User => None,
        };
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            status,
            chat_message_index: Some(chat_message_index),
            error: None,
            thinking: None,
            reasoning_meta,
            swipes: None,
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }

    /// Materialize the parallel swipe arrays from the current single-version
    /// fields, if not already present
    pub(crate) fn ensure_swipes(&mut self) -> &mut SwipeSet {
        if self.swipes.is_none() {
            self.swipes = Some(SwipeSet {
                texts: vec![self.content.clone()],
                thinking: vec![self.thinking.clone()],
                reasoning_meta: vec![self.reasoning_meta.clone().unwrap_or_default()],
                timestamps: vec![self.timestamp],
                active: 0,
            });
        }
        self.swipes.as_mut().expect("swipes just materialized")
    }

    /// Copy the active swipe's fields up to the top level. The mirror is
    /// maintained on every write, never derived at read time.
    pub(crate) fn sync_from_active_swipe(&mut self) {
        let Some(swipes) = &self.swipes else {
            return;
        };
        let i = swipes.active;
        self.content = swipes.texts[i].clone();
        self.thinking = swipes.thinking[i].clone();
        self.reasoning_meta = Some(swipes.reasoning_meta[i].clone());
        self.timestamp = swipes.timestamps[i];
    }

    /// Write the top-level fields back into the active swipe slot, keeping
    /// the mirror intact after a direct message update
    pub(crate) fn write_back_active_swipe(&mut self) {
        let content = self.content.clone();
        let thinking = self.thinking.clone();
        let meta = self.reasoning_meta.clone().unwrap_or_default();
        let timestamp = self.timestamp;
        if let Some(swipes) = &mut self.swipes {
            let i = swipes.active;
            swipes.texts[i] = content;
            swipes.thinking[i] = thinking;
            swipes.reasoning_meta[i] = meta;
            swipes.timestamps[i] = timestamp;
        }
    }
}
