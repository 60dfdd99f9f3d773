//! Free-text task identifier resolution
//!
//! Callers (especially chat agents) rarely know numeric ids, so an
//! identifier is either an exact id or a title fragment. All-digit
//! identifiers take absolute precedence as id lookups and never fall
//! through to text matching: a task titled "42 ways to cook" is not a
//! match for the identifier "42".

use anyhow::Result;

use super::tasks::TaskStore;
use super::types::{Resolution, Task, TaskFilter, TaskRef};

/// Resolve an identifier to zero, one, or many of the owner's tasks.
///
/// 1. All-digit identifier: exact-id lookup; a miss is `NotFound`.
/// 2. Otherwise: case-insensitive substring match against titles.
///    Candidates are returned in the stable listing order, so repeated
///    calls against the same data yield the same candidate sequence.
pub fn resolve_identifier(
    store: &TaskStore,
    user_id: &str,
    identifier: &str,
) -> Result<Resolution> {
    let identifier = identifier.trim();

    if !identifier.is_empty() && identifier.chars().all(|c| c.is_ascii_digit()) {
        // Ids beyond u64 can't exist in the store
        return match identifier.parse::<u64>() {
            Ok(id) => match store.get(user_id, id)? {
                Some(task) => Ok(Resolution::Unique(task)),
                None => Ok(Resolution::NotFound),
            },
            Err(_) => Ok(Resolution::NotFound),
        };
    }

    let needle = identifier.to_lowercase();
    let mut matches: Vec<Task> = Vec::new();

    for task in store.list(user_id, TaskFilter::All)? {
        if task.title.to_lowercase().contains(&needle) {
            matches.push(task);
        }
    }

    match matches.len() {
        0 => Ok(Resolution::NotFound),
        1 => Ok(Resolution::Unique(matches.remove(0))),
        _ => Ok(Resolution::Ambiguous(
            matches.iter().map(TaskRef::from).collect(),
        )),
    }
}
