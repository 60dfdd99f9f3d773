//! Integration tests for free-text identifier resolution

use tempfile::TempDir;

use tasknest::store::types::{NewTask, Resolution};
use tasknest::store::{resolve_identifier, TaskStore};

fn open_store(dir: &TempDir) -> TaskStore {
    TaskStore::open(dir.path()).expect("store should open")
}

#[test]
fn test_numeric_identifier_is_exact_id_lookup() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let task = store.insert("alice", NewTask::new("Buy milk")).unwrap();

    match resolve_identifier(&store, "alice", &task.id.to_string()).unwrap() {
        Resolution::Unique(found) => assert_eq!(found.id, task.id),
        other => panic!("expected unique resolution, got {other:?}"),
    }
}

#[test]
fn test_numeric_identifier_never_falls_back_to_title() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    // A task whose title contains a number that is not its id
    let task = store
        .insert("alice", NewTask::new("42 ways to cook pasta"))
        .unwrap();
    assert_ne!(task.id, 42);

    // "42" is treated purely as an id lookup; the title is not consulted
    assert_eq!(
        resolve_identifier(&store, "alice", "42").unwrap(),
        Resolution::NotFound
    );
}

#[test]
fn test_substring_match_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let task = store.insert("alice", NewTask::new("Buy Milk")).unwrap();

    for identifier in ["milk", "MILK", "buy mi", "Buy Milk"] {
        match resolve_identifier(&store, "alice", identifier).unwrap() {
            Resolution::Unique(found) => assert_eq!(found.id, task.id),
            other => panic!("'{identifier}' should resolve uniquely, got {other:?}"),
        }
    }
}

#[test]
fn test_identifier_is_trimmed() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let task = store.insert("alice", NewTask::new("Buy milk")).unwrap();

    match resolve_identifier(&store, "alice", &format!("  {}  ", task.id)).unwrap() {
        Resolution::Unique(found) => assert_eq!(found.id, task.id),
        other => panic!("expected unique resolution, got {other:?}"),
    }

    match resolve_identifier(&store, "alice", "  milk  ").unwrap() {
        Resolution::Unique(found) => assert_eq!(found.id, task.id),
        other => panic!("expected unique resolution, got {other:?}"),
    }
}

#[test]
fn test_ambiguous_lists_candidates_in_stable_order() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store.insert("alice", NewTask::new("Call mom")).unwrap();
    store.insert("alice", NewTask::new("Call dentist")).unwrap();
    store.insert("alice", NewTask::new("Buy groceries")).unwrap();

    let first = match resolve_identifier(&store, "alice", "call").unwrap() {
        Resolution::Ambiguous(matches) => {
            assert_eq!(matches.len(), 2);
            matches
        }
        other => panic!("expected ambiguous resolution, got {other:?}"),
    };

    // Repeated resolution yields the same candidate sequence
    match resolve_identifier(&store, "alice", "call").unwrap() {
        Resolution::Ambiguous(matches) => assert_eq!(matches, first),
        other => panic!("expected ambiguous resolution, got {other:?}"),
    }
}

#[test]
fn test_exact_title_match_does_not_auto_select() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let short = store.insert("alice", NewTask::new("Buy milk")).unwrap();
    let long = store
        .insert("alice", NewTask::new("Buy milk for cat"))
        .unwrap();

    // "Buy milk" equals one title exactly, but the other title contains it
    // too: still ambiguous, never a silent pick of the exact match
    match resolve_identifier(&store, "alice", "Buy milk").unwrap() {
        Resolution::Ambiguous(matches) => {
            let mut ids: Vec<u64> = matches.iter().map(|m| m.id).collect();
            ids.sort_unstable();
            assert_eq!(ids, vec![short.id, long.id]);
        }
        other => panic!("expected ambiguous resolution, got {other:?}"),
    }
}

#[test]
fn test_no_match_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store.insert("alice", NewTask::new("Buy milk")).unwrap();

    assert_eq!(
        resolve_identifier(&store, "alice", "dentist").unwrap(),
        Resolution::NotFound
    );
}

#[test]
fn test_resolution_is_owner_scoped() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let task = store.insert("alice", NewTask::new("Alice's errand")).unwrap();

    // Neither the id nor the title resolves for another owner
    assert_eq!(
        resolve_identifier(&store, "bob", &task.id.to_string()).unwrap(),
        Resolution::NotFound
    );
    assert_eq!(
        resolve_identifier(&store, "bob", "errand").unwrap(),
        Resolution::NotFound
    );
}

#[test]
fn test_oversized_numeric_identifier_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    store.insert("alice", NewTask::new("t")).unwrap();

    // Larger than u64::MAX: no such id can exist
    assert_eq!(
        resolve_identifier(&store, "alice", "99999999999999999999999").unwrap(),
        Resolution::NotFound
    );
}
