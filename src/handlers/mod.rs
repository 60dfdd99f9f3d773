//! HTTP API Handlers - Modular organization of the REST API
//!
//! Each submodule handles a specific domain: task CRUD, agent tooling and
//! conversations, and health/metrics infrastructure.

// Core modules
pub mod router;
pub mod state;
pub mod types;

// Health and utilities
pub mod health;

// Task management
pub mod tasks;

// Agent tool invocation and conversations
pub mod agent;

// Re-export commonly used items
pub use router::{build_protected_routes, build_public_routes, build_router, AppState};
pub use state::AppManager;
pub use types::*;
