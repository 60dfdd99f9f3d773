//! Owner-scoped task storage
//!
//! Tasks are stored under keys of the form `{user_id}:{id:020}`. The
//! zero-padded id keeps prefix iteration ordered and the user_id prefix
//! makes owner isolation a key-layout property. Ids come from a persisted
//! monotonic sequence and are never reused, even across restarts.

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use rocksdb::{Options, DB};
use std::path::Path;
use std::sync::Arc;

use super::types::{NewTask, Task, TaskFilter, TaskPatch};
use crate::metrics::TASK_OPERATIONS_TOTAL;
use crate::validation;

const NEXT_TASK_ID_KEY: &[u8] = b"next_task_id";

/// Storage and query engine for tasks
pub struct TaskStore {
    /// Main task storage: key = {user_id}:{id:020}
    task_db: Arc<DB>,
    /// Sequence storage (survives restarts so ids are never reused)
    meta_db: Arc<DB>,
    /// Next id to hand out; persisted before use
    next_id: Mutex<u64>,
}

fn db_options() -> Options {
    let mut opts = Options::default();
    opts.create_if_missing(true);
    opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
    opts.set_max_write_buffer_number(2);
    opts.set_write_buffer_size(8 * 1024 * 1024); // 8MB
    opts
}

fn task_key(user_id: &str, id: u64) -> String {
    format!("{user_id}:{id:020}")
}

impl TaskStore {
    /// Open (or create) a task store at the given path
    pub fn open(storage_path: &Path) -> Result<Self> {
        let tasks_path = storage_path.join("tasks");
        std::fs::create_dir_all(&tasks_path)?;

        let opts = db_options();

        let task_db = Arc::new(
            DB::open(&opts, tasks_path.join("items")).context("Failed to open tasks DB")?,
        );
        let meta_db = Arc::new(
            DB::open(&opts, tasks_path.join("meta")).context("Failed to open tasks meta DB")?,
        );

        let next_id = match meta_db.get(NEXT_TASK_ID_KEY)? {
            Some(raw) => std::str::from_utf8(&raw)
                .ok()
                .and_then(|s| s.parse().ok())
                .context("Corrupt task id sequence")?,
            None => 1,
        };

        tracing::info!(next_task_id = next_id, "Task store initialized");

        Ok(Self {
            task_db,
            meta_db,
            next_id: Mutex::new(next_id),
        })
    }

    /// Allocate the next task id. The advanced sequence is persisted before
    /// the id is handed out, so a crash cannot cause reuse.
    fn allocate_id(&self) -> Result<u64> {
        let mut guard = self.next_id.lock();
        let id = *guard;
        self.meta_db
            .put(NEXT_TASK_ID_KEY, (id + 1).to_string().as_bytes())
            .context("Failed to persist task id sequence")?;
        *guard = id + 1;
        Ok(id)
    }

    fn put_task(&self, task: &Task) -> Result<()> {
        let key = task_key(&task.user_id, task.id);
        let value = serde_json::to_vec(task).context("Failed to serialize task")?;
        self.task_db
            .put(key.as_bytes(), &value)
            .context("Failed to store task")?;
        Ok(())
    }

    /// Create a new task for the given owner
    pub fn insert(&self, user_id: &str, new_task: NewTask) -> Result<Task> {
        validation::validate_user_id(user_id)?;
        validation::validate_title(&new_task.title)?;
        if let Some(ref description) = new_task.description {
            validation::validate_description(description)?;
        }

        let now = Utc::now();
        let task = Task {
            id: self.allocate_id()?,
            user_id: user_id.to_string(),
            title: new_task.title.trim().to_string(),
            description: new_task.description,
            is_completed: new_task.is_completed,
            created_at: now,
            updated_at: now,
        };

        self.put_task(&task)?;
        TASK_OPERATIONS_TOTAL
            .with_label_values(&["insert", "ok"])
            .inc();

        tracing::debug!(
            user_id = %task.user_id,
            task_id = task.id,
            "Created task"
        );

        Ok(task)
    }

    /// Point lookup scoped to the owner. Absent and not-owned are both None.
    pub fn get(&self, user_id: &str, id: u64) -> Result<Option<Task>> {
        let key = task_key(user_id, id);

        match self.task_db.get(key.as_bytes())? {
            Some(value) => {
                let task: Task =
                    serde_json::from_slice(&value).context("Failed to deserialize task")?;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    /// List the owner's tasks, newest-created first (ties broken by id
    /// descending). Each call re-queries; no iterator state is retained.
    pub fn list(&self, user_id: &str, filter: TaskFilter) -> Result<Vec<Task>> {
        let prefix = format!("{user_id}:");
        let mut tasks = Vec::new();

        let iter = self.task_db.prefix_iterator(prefix.as_bytes());
        for entry in iter {
            let (key, value) = entry.context("Task iteration failed")?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }

            let task: Task =
                serde_json::from_slice(&value).context("Failed to deserialize task")?;
            if filter.matches(&task) {
                tasks.push(task);
            }
        }

        tasks.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(tasks)
    }

    /// Apply a partial update. Omitted fields are unchanged; an explicit
    /// `Some(None)` description clears it. Refreshes `updated_at`, except
    /// that a patch carrying no fields is a no-op and writes nothing.
    /// Returns None if the task is absent or owned by another principal.
    pub fn update(&self, user_id: &str, id: u64, patch: TaskPatch) -> Result<Option<Task>> {
        let Some(mut task) = self.get(user_id, id)? else {
            TASK_OPERATIONS_TOTAL
                .with_label_values(&["update", "not_found"])
                .inc();
            return Ok(None);
        };

        if patch.is_empty() {
            return Ok(Some(task));
        }

        if let Some(title) = patch.title {
            validation::validate_title(&title)?;
            task.title = title.trim().to_string();
        }

        if let Some(description) = patch.description {
            if let Some(ref d) = description {
                validation::validate_description(d)?;
            }
            task.description = description;
        }

        if let Some(is_completed) = patch.is_completed {
            task.is_completed = is_completed;
        }

        task.updated_at = Utc::now();
        self.put_task(&task)?;
        TASK_OPERATIONS_TOTAL
            .with_label_values(&["update", "ok"])
            .inc();

        tracing::debug!(user_id = %user_id, task_id = id, "Updated task");

        Ok(Some(task))
    }

    /// Delete a task. Returns whether it existed (for this owner).
    pub fn delete(&self, user_id: &str, id: u64) -> Result<bool> {
        if self.get(user_id, id)?.is_none() {
            TASK_OPERATIONS_TOTAL
                .with_label_values(&["delete", "not_found"])
                .inc();
            return Ok(false);
        }

        let key = task_key(user_id, id);
        self.task_db
            .delete(key.as_bytes())
            .context("Failed to delete task")?;
        TASK_OPERATIONS_TOTAL
            .with_label_values(&["delete", "ok"])
            .inc();

        tracing::debug!(user_id = %user_id, task_id = id, "Deleted task");

        Ok(true)
    }

    /// Flip the completion flag
    pub fn toggle(&self, user_id: &str, id: u64) -> Result<Option<Task>> {
        let Some(task) = self.get(user_id, id)? else {
            return Ok(None);
        };

        self.update(
            user_id,
            id,
            TaskPatch {
                is_completed: Some(!task.is_completed),
                ..Default::default()
            },
        )
    }

    /// Set the completion flag to an explicit value
    pub fn set_completion(&self, user_id: &str, id: u64, completed: bool) -> Result<Option<Task>> {
        self.update(
            user_id,
            id,
            TaskPatch {
                is_completed: Some(completed),
                ..Default::default()
            },
        )
    }

    /// Flush RocksDB to disk (graceful shutdown)
    pub fn flush(&self) -> Result<()> {
        self.task_db.flush().context("Failed to flush tasks DB")?;
        self.meta_db.flush().context("Failed to flush tasks meta DB")?;
        Ok(())
    }
}
