//! Agent Tool Invocation and Conversation Handlers
//!
//! Tool invocations always answer 200 with a structured envelope: agents
//! consume `{"success": ...}` payloads, not HTTP status codes. Conversation
//! endpoints persist chat history scoped to the authenticated user.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use serde_json::Value;
use tracing::debug;

use super::state::AppManager;
use super::types::{
    ConversationListResponse, MessageListResponse, MessagesQuery, SendMessageRequest,
    SendMessageResponse,
};
use crate::auth::AuthUser;
use crate::errors::{AppError, Result};

/// Application state type alias
pub type AppState = std::sync::Arc<AppManager>;

/// Invoke a named agent tool with loosely-typed JSON arguments.
///
/// The response is always 200: failures are `{"success": false, ...}`
/// payloads with error text the agent can relay to the user.
pub async fn invoke_tool(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(tool): Path<String>,
    Json(args): Json<Value>,
) -> Json<Value> {
    debug!(user_id = %user_id, tool = %tool, "Tool invocation");

    Json(state.tools().invoke(&user_id, &tool, &args))
}

/// Append a chat message, creating or reusing a conversation as needed
pub async fn send_message(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>> {
    let store = state.conversation_store();

    let conversation = store.get_or_create(&user_id, req.conversation_id)?;

    let message = store
        .append_message(&user_id, conversation.id, req.role, &req.content)?
        .ok_or(AppError::ConversationNotFound(conversation.id))?;

    // Re-read to pick up the refreshed updated_at and any auto-title
    let conversation = store
        .get(&user_id, conversation.id)?
        .ok_or(AppError::ConversationNotFound(conversation.id))?;

    Ok(Json(SendMessageResponse {
        conversation,
        message,
    }))
}

/// List the caller's conversations, most recently active first
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<ConversationListResponse>> {
    let conversations = state.conversation_store().list_recent(&user_id, 100)?;
    let count = conversations.len();

    Ok(Json(ConversationListResponse {
        conversations,
        count,
    }))
}

/// Fetch the last N messages of a conversation in chronological order
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(conversation_id): Path<u64>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessageListResponse>> {
    let messages = state
        .conversation_store()
        .messages(&user_id, conversation_id, query.limit)?
        .ok_or(AppError::ConversationNotFound(conversation_id))?;
    let count = messages.len();

    Ok(Json(MessageListResponse {
        conversation_id,
        messages,
        count,
    }))
}
