//! Confirmation gate for destructive operations
//!
//! A destructive action invoked without an explicit affirmative is blocked
//! with a preview of what would be destroyed; the caller must re-invoke
//! with `confirmed = true`. The gate only decides whether the caller may
//! proceed — it never performs the mutation itself.

use super::types::{Task, TaskRef};

/// Decision for a guarded destructive action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// No side effect occurred; `preview` names what would be destroyed.
    /// The preview carries the resolved numeric id so the confirming call
    /// can use it and re-resolve exactly (ids are never reused).
    Blocked { preview: TaskRef, message: String },
    /// The caller may now perform the mutation
    Proceed,
}

/// Guard a destructive action against an unconfirmed invocation
pub fn guard_destructive(task: &Task, confirmed: bool) -> GateDecision {
    if confirmed {
        return GateDecision::Proceed;
    }

    GateDecision::Blocked {
        preview: TaskRef::from(task),
        message: format!(
            "Are you sure you want to delete '{}'? This action cannot be undone.",
            task.title
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_task() -> Task {
        Task {
            id: 7,
            user_id: "alice".to_string(),
            title: "Buy milk".to_string(),
            description: None,
            is_completed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_unconfirmed_is_blocked_with_preview() {
        let task = sample_task();
        match guard_destructive(&task, false) {
            GateDecision::Blocked { preview, message } => {
                assert_eq!(preview.id, 7);
                assert_eq!(preview.title, "Buy milk");
                assert!(message.contains("Buy milk"));
            }
            GateDecision::Proceed => panic!("unconfirmed delete must be blocked"),
        }
    }

    #[test]
    fn test_confirmed_proceeds() {
        let task = sample_task();
        assert_eq!(guard_destructive(&task, true), GateDecision::Proceed);
    }
}
