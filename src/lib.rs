//! Tasknest Library
//!
//! Multi-user todo service with an agent tool facade:
//! - Owner-scoped task store (RocksDB, integer ids, never reused)
//! - Free-text identifier resolution with disambiguation
//! - Two-phase confirmation gate for destructive operations
//! - Conversation history persistence for the chat layer
//!
//! Every read and write is scoped by an explicit owner id; no operation
//! may observe or mutate a task belonging to another principal.

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod store;
pub mod tools;
pub mod validation;

// Re-export dependencies to ensure tests use the same version
pub use chrono;
pub use parking_lot;
