//! Core data types for tasks and conversations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single todo item, owned by exactly one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned id: monotonic, never reused within the store's lifetime
    pub id: u64,
    /// Owner of the task; every read/write is filtered by this field
    pub user_id: String,
    /// 1..=255 characters after trimming
    pub title: String,
    /// Up to 1000 characters; None means "no description"
    pub description: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,
}

/// Lightweight task reference for disambiguation displays and previews
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: u64,
    pub title: String,
}

impl From<&Task> for TaskRef {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
        }
    }
}

/// Fields for creating a task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            is_completed: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update: omitted fields are unchanged. The nested Option on
/// description distinguishes "leave alone" (None) from "clear" (Some(None)).
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub is_completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.is_completed.is_none()
    }
}

/// Completion filter for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.is_completed,
            Self::Incomplete => !task.is_completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
        }
    }
}

/// Outcome of resolving a free-text identifier. Ephemeral; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    NotFound,
    Unique(Task),
    /// Candidate list (id + title only) for disambiguation display
    Ambiguous(Vec<TaskRef>),
}

/// A chat conversation session; owns its messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: u64,
    pub user_id: String,
    /// Auto-generated from the first user message when absent
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role of a chat message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single message within a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub conversation_id: u64,
    pub user_id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches() {
        let mut task = Task {
            id: 1,
            user_id: "alice".to_string(),
            title: "t".to_string(),
            description: None,
            is_completed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(TaskFilter::All.matches(&task));
        assert!(TaskFilter::Incomplete.matches(&task));
        assert!(!TaskFilter::Completed.matches(&task));

        task.is_completed = true;
        assert!(TaskFilter::All.matches(&task));
        assert!(TaskFilter::Completed.matches(&task));
        assert!(!TaskFilter::Incomplete.matches(&task));
    }

    #[test]
    fn test_patch_emptiness() {
        assert!(TaskPatch::default().is_empty());
        assert!(!TaskPatch {
            description: Some(None), // explicit clear counts as a change
            ..Default::default()
        }
        .is_empty());
    }
}
