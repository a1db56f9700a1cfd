mod message;
mod settings;
mod thread;

pub use message::{Message, MessageRole, MessageStatus, SwipeSet};
pub use settings::{ContextSettings, HistoryRange};
pub use thread::Thread;
