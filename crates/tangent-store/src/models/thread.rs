use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;
use super::settings::ContextSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    /// Per-thread overrides of the global defaults; set at creation from the
    /// caller's snapshot, mutated only through an explicit update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_settings: Option<ContextSettings>,
}

impl Thread {
    pub fn new(name: impl Into<String>, context_settings: Option<ContextSettings>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            context_settings,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
