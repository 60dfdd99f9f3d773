//! Agent-facing tool façade over the task store
//!
//! Every operation is total: instead of bubbling errors to the transport,
//! each returns a structured success or failure payload that an agent can
//! read and relay. Storage failures are redacted to a generic operation
//! error so internals never leak into chat output.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::metrics::TOOL_INVOCATIONS_TOTAL;
use crate::store::{
    guard_destructive, resolve_identifier, GateDecision, Resolution, TaskStore,
};
use crate::store::types::{NewTask, Task, TaskFilter, TaskPatch, TaskRef};
use crate::validation;

/// Failure outcomes of a tool invocation. Rendered to JSON via
/// [`ToolError::to_value`], never surfaced as a transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Input failed validation before any lookup
    Validation(String),
    /// The identifier matched no task owned by the caller
    NotFound { identifier: String },
    /// The identifier matched several tasks; nothing was mutated
    Ambiguous {
        identifier: String,
        matches: Vec<TaskRef>,
    },
    /// Storage or other internal failure, already redacted
    Operation(String),
}

impl ToolError {
    fn outcome(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Ambiguous { .. } => "ambiguous",
            Self::Operation(_) => "error",
        }
    }

    /// Render the failure envelope an agent sees
    pub fn to_value(&self) -> Value {
        match self {
            Self::Validation(reason) => json!({
                "success": false,
                "error": reason,
            }),
            Self::NotFound { identifier } => json!({
                "success": false,
                "error": format!("No task found matching '{identifier}'"),
                "suggestion": "Use list_tasks to see all your tasks",
            }),
            Self::Ambiguous { identifier, matches } => json!({
                "success": false,
                "error": format!(
                    "Multiple tasks match '{identifier}'. Please be more specific."
                ),
                "matches": matches,
                "hint": "Try using the task ID or a more specific title",
            }),
            Self::Operation(reason) => json!({
                "success": false,
                "error": reason,
            }),
        }
    }
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Successful `add_task` payload
#[derive(Debug, Clone, Serialize)]
pub struct TaskCreated {
    pub success: bool,
    pub task: Task,
    pub message: String,
}

/// Successful `list_tasks` payload. An empty listing is a success.
#[derive(Debug, Clone, Serialize)]
pub struct TaskListing {
    pub success: bool,
    pub tasks: Vec<Task>,
    pub count: usize,
    pub filter_applied: &'static str,
    /// Present only for empty listings, so the agent has something to relay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Successful `set_task_completion` payload
#[derive(Debug, Clone, Serialize)]
pub struct CompletionChange {
    pub success: bool,
    pub task: Task,
    pub message: String,
}

/// Outcome of `delete_task`: either a confirmation demand (no side effect
/// yet) or the completed deletion.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DeleteOutcome {
    ConfirmationRequired {
        success: bool,
        requires_confirmation: bool,
        task_to_delete: TaskRef,
        message: String,
    },
    Deleted {
        success: bool,
        deleted_task: TaskRef,
        message: String,
    },
}

/// One field's before/after values in an update diff
#[derive(Debug, Clone, Serialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// Successful `update_task` payload with a per-field diff
#[derive(Debug, Clone, Serialize)]
pub struct TaskUpdated {
    pub success: bool,
    pub task: Task,
    pub changes: BTreeMap<&'static str, FieldChange>,
    pub message: String,
}

/// The five tool operations exposed to agents
#[derive(Clone)]
pub struct TaskTools {
    store: Arc<TaskStore>,
}

fn storage_error(err: anyhow::Error) -> ToolError {
    tracing::error!(error = %err, "Tool operation failed");
    ToolError::Operation("The operation could not be completed. Please try again.".to_string())
}

impl TaskTools {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    /// Resolve an identifier to exactly one task, mapping the zero and
    /// many cases to tool errors.
    fn resolve_one(&self, user_id: &str, identifier: &str) -> ToolResult<Task> {
        validation::validate_identifier(identifier)
            .map_err(|e| ToolError::Validation(e.to_string()))?;

        match resolve_identifier(&self.store, user_id, identifier).map_err(storage_error)? {
            Resolution::Unique(task) => Ok(task),
            Resolution::NotFound => Err(ToolError::NotFound {
                identifier: identifier.trim().to_string(),
            }),
            Resolution::Ambiguous(matches) => Err(ToolError::Ambiguous {
                identifier: identifier.trim().to_string(),
                matches,
            }),
        }
    }

    /// Create a task
    pub fn add_task(
        &self,
        user_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> ToolResult<TaskCreated> {
        validation::validate_title(title).map_err(|e| ToolError::Validation(e.to_string()))?;

        let mut new_task = NewTask::new(title);
        if let Some(description) = description {
            let trimmed = description.trim();
            if !trimmed.is_empty() {
                validation::validate_description(trimmed)
                    .map_err(|e| ToolError::Validation(e.to_string()))?;
                new_task = new_task.with_description(trimmed);
            }
        }

        let task = self.store.insert(user_id, new_task).map_err(storage_error)?;

        Ok(TaskCreated {
            success: true,
            message: format!("Task '{}' created successfully", task.title),
            task,
        })
    }

    /// List the caller's tasks under a completion filter
    pub fn list_tasks(&self, user_id: &str, filter: TaskFilter) -> ToolResult<TaskListing> {
        let tasks = self.store.list(user_id, filter).map_err(storage_error)?;
        let count = tasks.len();

        let message = if count == 0 {
            Some("No tasks found".to_string())
        } else {
            None
        };

        Ok(TaskListing {
            success: true,
            tasks,
            count,
            filter_applied: filter.as_str(),
            message,
        })
    }

    /// Set a task's completion state to an explicit value
    pub fn set_task_completion(
        &self,
        user_id: &str,
        identifier: &str,
        completed: bool,
    ) -> ToolResult<CompletionChange> {
        let task = self.resolve_one(user_id, identifier)?;

        let updated = self
            .store
            .set_completion(user_id, task.id, completed)
            .map_err(storage_error)?
            .ok_or(ToolError::NotFound {
                identifier: identifier.trim().to_string(),
            })?;

        Ok(CompletionChange {
            success: true,
            message: format!(
                "Task '{}' marked as {}",
                updated.title,
                if completed { "complete" } else { "incomplete" }
            ),
            task: updated,
        })
    }

    /// Delete a task behind the confirmation gate. The first call returns
    /// a preview and performs no mutation; the caller re-invokes with
    /// `confirmed = true` (typically using the previewed id).
    pub fn delete_task(
        &self,
        user_id: &str,
        identifier: &str,
        confirmed: bool,
    ) -> ToolResult<DeleteOutcome> {
        let task = self.resolve_one(user_id, identifier)?;

        match guard_destructive(&task, confirmed) {
            GateDecision::Blocked { preview, message } => {
                Ok(DeleteOutcome::ConfirmationRequired {
                    success: false,
                    requires_confirmation: true,
                    task_to_delete: preview,
                    message,
                })
            }
            GateDecision::Proceed => {
                let existed = self
                    .store
                    .delete(user_id, task.id)
                    .map_err(storage_error)?;
                if !existed {
                    return Err(ToolError::NotFound {
                        identifier: identifier.trim().to_string(),
                    });
                }

                Ok(DeleteOutcome::Deleted {
                    success: true,
                    message: format!("Task '{}' has been deleted", task.title),
                    deleted_task: TaskRef::from(&task),
                })
            }
        }
    }

    /// Update a task's title and/or description, reporting a diff of what
    /// actually changed. A no-op update succeeds with an empty diff.
    pub fn update_task(
        &self,
        user_id: &str,
        identifier: &str,
        new_title: Option<&str>,
        new_description: Option<&str>,
    ) -> ToolResult<TaskUpdated> {
        if new_title.is_none() && new_description.is_none() {
            return Err(ToolError::Validation(
                "No changes specified. Provide new_title or new_description.".to_string(),
            ));
        }

        let task = self.resolve_one(user_id, identifier)?;

        let mut patch = TaskPatch::default();
        let mut changes: BTreeMap<&'static str, FieldChange> = BTreeMap::new();

        if let Some(title) = new_title {
            let trimmed = title.trim();
            validation::validate_title(trimmed)
                .map_err(|e| ToolError::Validation(e.to_string()))?;
            if trimmed != task.title {
                changes.insert(
                    "title",
                    FieldChange {
                        old: json!(task.title),
                        new: json!(trimmed),
                    },
                );
                patch.title = Some(trimmed.to_string());
            }
        }

        if let Some(description) = new_description {
            // An empty string clears the description
            let trimmed = description.trim();
            let next = if trimmed.is_empty() {
                None
            } else {
                validation::validate_description(trimmed)
                    .map_err(|e| ToolError::Validation(e.to_string()))?;
                Some(trimmed.to_string())
            };
            if next != task.description {
                changes.insert(
                    "description",
                    FieldChange {
                        old: json!(task.description),
                        new: json!(next),
                    },
                );
                patch.description = Some(next);
            }
        }

        if changes.is_empty() {
            return Ok(TaskUpdated {
                success: true,
                task,
                changes,
                message: "No changes were needed".to_string(),
            });
        }

        let updated = self
            .store
            .update(user_id, task.id, patch)
            .map_err(storage_error)?
            .ok_or(ToolError::NotFound {
                identifier: identifier.trim().to_string(),
            })?;

        Ok(TaskUpdated {
            success: true,
            message: "Task updated successfully".to_string(),
            task: updated,
            changes,
        })
    }

    /// Dispatch a named tool with loosely-typed arguments, producing the
    /// JSON envelope agents consume. Always returns a value; failures are
    /// `{"success": false, ...}` payloads.
    pub fn invoke(&self, user_id: &str, tool: &str, args: &Value) -> Value {
        let result = self.dispatch(user_id, tool, args);

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.outcome(),
        };
        TOOL_INVOCATIONS_TOTAL
            .with_label_values(&[tool, outcome])
            .inc();

        match result {
            Ok(value) => value,
            Err(e) => e.to_value(),
        }
    }

    fn dispatch(&self, user_id: &str, tool: &str, args: &Value) -> ToolResult<Value> {
        let str_arg = |name: &str| args.get(name).and_then(Value::as_str);

        match tool {
            "add_task" => {
                let title = str_arg("title")
                    .ok_or_else(|| ToolError::Validation("title is required".to_string()))?;
                self.add_task(user_id, title, str_arg("description"))
                    .map(|p| json!(p))
            }
            "list_tasks" => {
                let filter = match str_arg("filter") {
                    None | Some("all") => TaskFilter::All,
                    Some("completed") => TaskFilter::Completed,
                    Some("incomplete") => TaskFilter::Incomplete,
                    Some(other) => {
                        return Err(ToolError::Validation(format!(
                            "Unknown filter '{other}'. Use all, completed, or incomplete."
                        )))
                    }
                };
                self.list_tasks(user_id, filter).map(|p| json!(p))
            }
            "set_task_completion" => {
                let identifier = str_arg("identifier").ok_or_else(|| {
                    ToolError::Validation("identifier is required".to_string())
                })?;
                let completed = args
                    .get("completed")
                    .and_then(Value::as_bool)
                    .ok_or_else(|| {
                        ToolError::Validation("completed is required".to_string())
                    })?;
                self.set_task_completion(user_id, identifier, completed)
                    .map(|p| json!(p))
            }
            "delete_task" => {
                let identifier = str_arg("identifier").ok_or_else(|| {
                    ToolError::Validation("identifier is required".to_string())
                })?;
                let confirmed = args
                    .get("confirmed")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                self.delete_task(user_id, identifier, confirmed)
                    .map(|p| json!(p))
            }
            "update_task" => {
                let identifier = str_arg("identifier").ok_or_else(|| {
                    ToolError::Validation("identifier is required".to_string())
                })?;
                self.update_task(
                    user_id,
                    identifier,
                    str_arg("new_title"),
                    str_arg("new_description"),
                )
                .map(|p| json!(p))
            }
            other => Err(ToolError::Validation(format!("Unknown tool '{other}'"))),
        }
    }
}
