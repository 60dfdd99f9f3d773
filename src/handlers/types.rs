//! Request and response types for the REST API

use serde::{Deserialize, Deserializer, Serialize};

use crate::store::types::{Conversation, Message, MessageRole, Task, TaskFilter};

// =============================================================================
// TASK REQUEST/RESPONSE TYPES
// =============================================================================

/// Request to create a task
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
}

/// Request to partially update a task.
///
/// `description` distinguishes three cases: absent (leave unchanged),
/// explicit null (clear), and a string (replace).
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub is_completed: Option<bool>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    // Present-but-null deserializes to Some(None); absent fields never reach
    // here and stay None via the field default.
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Query parameters for task listing
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default)]
    pub filter: TaskFilter,
}

/// Response for task listing
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub count: usize,
}

/// Response for task deletion
#[derive(Debug, Serialize)]
pub struct DeleteTaskResponse {
    pub success: bool,
    pub id: u64,
}

// =============================================================================
// CONVERSATION REQUEST/RESPONSE TYPES
// =============================================================================

/// Request to append a chat message. Without a conversation_id the message
/// goes to the caller's most recent conversation (creating one if needed).
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub conversation_id: Option<u64>,
    #[serde(default = "default_role")]
    pub role: MessageRole,
    pub content: String,
}

fn default_role() -> MessageRole {
    MessageRole::User
}

/// Response after appending a message
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub conversation: Conversation,
    pub message: Message,
}

/// Response for conversation listing
#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<Conversation>,
    pub count: usize,
}

/// Query parameters for message history
#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    #[serde(default = "default_message_limit")]
    pub limit: usize,
}

fn default_message_limit() -> usize {
    50
}

/// Response for message history
#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub conversation_id: u64,
    pub messages: Vec<Message>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let absent: UpdateTaskRequest = serde_json::from_str(r#"{"title": "t"}"#).unwrap();
        assert_eq!(absent.description, None);

        let null: UpdateTaskRequest =
            serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(null.description, Some(None));

        let set: UpdateTaskRequest =
            serde_json::from_str(r#"{"description": "notes"}"#).unwrap();
        assert_eq!(set.description, Some(Some("notes".to_string())));
    }

    #[test]
    fn test_list_query_filter_default() {
        let q: ListTasksQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.filter, TaskFilter::All);

        let q: ListTasksQuery = serde_json::from_str(r#"{"filter": "completed"}"#).unwrap();
        assert_eq!(q.filter, TaskFilter::Completed);
    }
}
