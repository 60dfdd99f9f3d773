//! Persistent, owner-scoped stores
//!
//! Two RocksDB-backed stores share the same key discipline: every key is
//! prefixed with the owner's user_id, so cross-owner isolation is a
//! property of key layout rather than of per-call filtering.

pub mod conversations;
pub mod gate;
pub mod resolve;
pub mod tasks;
pub mod types;

pub use conversations::ConversationStore;
pub use gate::{guard_destructive, GateDecision};
pub use resolve::resolve_identifier;
pub use tasks::TaskStore;
pub use types::{
    Conversation, Message, MessageRole, NewTask, Resolution, Task, TaskFilter, TaskPatch, TaskRef,
};
