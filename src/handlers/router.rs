//! Router Configuration - Centralized route definitions
//!
//! Routes are split into public (no auth: health checks and metrics) and
//! protected (auth required: everything that touches user data). Auth and
//! rate-limit layers are applied by the caller.

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;

use super::state::AppManager;
use super::{agent, health, tasks};

/// Application state type alias
pub type AppState = Arc<AppManager>;

/// Build the public routes (no authentication required)
///
/// These must always be accessible for Kubernetes probes and Prometheus
/// scraping.
pub fn build_public_routes(state: AppState) -> Router {
    Router::new()
        // =================================================================
        // HEALTH & KUBERNETES PROBES
        // =================================================================
        .route("/health", get(health::health))
        .route("/health/live", get(health::health_live))
        .route("/health/ready", get(health::health_ready))
        // =================================================================
        // METRICS (PROMETHEUS)
        // =================================================================
        .route("/metrics", get(health::metrics_endpoint))
        .with_state(state)
}

/// Build the protected API routes (authentication required)
pub fn build_protected_routes(state: AppState) -> Router {
    Router::new()
        // =================================================================
        // TASK CRUD
        // =================================================================
        .route("/api/v1/tasks", get(tasks::list_tasks))
        .route("/api/v1/tasks", post(tasks::create_task))
        .route("/api/v1/tasks/{task_id}", get(tasks::get_task))
        .route("/api/v1/tasks/{task_id}", put(tasks::update_task))
        .route("/api/v1/tasks/{task_id}", delete(tasks::delete_task))
        .route("/api/v1/tasks/{task_id}/toggle", patch(tasks::toggle_task))
        // =================================================================
        // AGENT TOOLS
        // =================================================================
        .route("/api/agent/tools/{tool}", post(agent::invoke_tool))
        // =================================================================
        // CONVERSATIONS
        // =================================================================
        .route("/api/chat/messages", post(agent::send_message))
        .route("/api/chat/conversations", get(agent::list_conversations))
        .route(
            "/api/chat/conversations/{conversation_id}/messages",
            get(agent::get_messages),
        )
        .with_state(state)
}

/// Build the complete router with both public and protected routes
///
/// Note: This function does NOT apply auth middleware or rate limiting.
/// The caller (main.rs) applies those layers.
pub fn build_router(state: AppState) -> Router {
    let public = build_public_routes(state.clone());
    let protected = build_protected_routes(state);

    Router::new().merge(public).merge(protected)
}
