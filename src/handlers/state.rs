//! Application State - Central manager for the task server
//!
//! Owns the persistent stores and the agent tool façade. One instance is
//! shared across all request handlers behind an Arc.

use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::config::ServerConfig;
use crate::store::{ConversationStore, TaskStore};
use crate::tools::TaskTools;

/// Central state for the server: stores, tool façade, and config
pub struct AppManager {
    task_store: Arc<TaskStore>,
    conversation_store: Arc<ConversationStore>,
    tools: TaskTools,
    server_config: ServerConfig,
    start_time: Instant,
}

impl AppManager {
    /// Open all stores under the configured storage path
    pub fn new(server_config: ServerConfig) -> Result<Self> {
        let task_store = Arc::new(TaskStore::open(&server_config.storage_path)?);
        let conversation_store = Arc::new(ConversationStore::open(&server_config.storage_path)?);
        let tools = TaskTools::new(task_store.clone());

        info!(
            storage_path = %server_config.storage_path.display(),
            "Application state initialized"
        );

        Ok(Self {
            task_store,
            conversation_store,
            tools,
            server_config,
            start_time: Instant::now(),
        })
    }

    pub fn task_store(&self) -> &Arc<TaskStore> {
        &self.task_store
    }

    pub fn conversation_store(&self) -> &Arc<ConversationStore> {
        &self.conversation_store
    }

    pub fn tools(&self) -> &TaskTools {
        &self.tools
    }

    pub fn server_config(&self) -> &ServerConfig {
        &self.server_config
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Flush all stores to disk (graceful shutdown)
    pub fn flush(&self) -> Result<()> {
        self.task_store.flush()?;
        self.conversation_store.flush()?;
        Ok(())
    }
}
