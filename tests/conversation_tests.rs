//! Integration tests for conversation and message persistence

use std::thread::sleep;
use std::time::Duration;
use tempfile::TempDir;

use tasknest::store::types::MessageRole;
use tasknest::store::ConversationStore;

fn open_store(dir: &TempDir) -> ConversationStore {
    ConversationStore::open(dir.path()).expect("store should open")
}

#[test]
fn test_create_and_get() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let conversation = store.create("alice", Some("Groceries".to_string())).unwrap();
    assert_eq!(conversation.title.as_deref(), Some("Groceries"));

    let fetched = store.get("alice", conversation.id).unwrap().unwrap();
    assert_eq!(fetched, conversation);
}

#[test]
fn test_conversations_are_owner_scoped() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let conversation = store.create("alice", None).unwrap();

    assert!(store.get("bob", conversation.id).unwrap().is_none());
    assert!(store
        .messages("bob", conversation.id, 10)
        .unwrap()
        .is_none());
    assert!(store
        .append_message("bob", conversation.id, MessageRole::User, "hi")
        .unwrap()
        .is_none());
}

#[test]
fn test_get_or_create_prefers_explicit_id() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let first = store.create("alice", None).unwrap();
    let second = store.create("alice", None).unwrap();

    let found = store.get_or_create("alice", Some(first.id)).unwrap();
    assert_eq!(found.id, first.id);

    // Unknown id falls back to the most recent conversation
    let fallback = store.get_or_create("alice", Some(999_999)).unwrap();
    assert_eq!(fallback.id, second.id);
}

#[test]
fn test_get_or_create_starts_fresh_when_none_exist() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let conversation = store.get_or_create("alice", None).unwrap();
    assert_eq!(conversation.title, None);

    // A second call without an id reuses it instead of multiplying
    let again = store.get_or_create("alice", None).unwrap();
    assert_eq!(again.id, conversation.id);
}

#[test]
fn test_first_user_message_auto_titles() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let conversation = store.create("alice", None).unwrap();

    store
        .append_message(
            "alice",
            conversation.id,
            MessageRole::User,
            "Remind me to buy milk tomorrow",
        )
        .unwrap()
        .unwrap();

    let titled = store.get("alice", conversation.id).unwrap().unwrap();
    assert_eq!(
        titled.title.as_deref(),
        Some("Remind me to buy milk tomorrow")
    );

    // The title sticks; later messages don't overwrite it
    store
        .append_message("alice", conversation.id, MessageRole::User, "Actually, eggs")
        .unwrap()
        .unwrap();
    let unchanged = store.get("alice", conversation.id).unwrap().unwrap();
    assert_eq!(unchanged.title, titled.title);
}

#[test]
fn test_auto_title_is_truncated() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let conversation = store.create("alice", None).unwrap();
    let long_message = "a".repeat(500);

    store
        .append_message("alice", conversation.id, MessageRole::User, &long_message)
        .unwrap()
        .unwrap();

    let titled = store.get("alice", conversation.id).unwrap().unwrap();
    assert_eq!(titled.title.as_deref().map(str::len), Some(80));
}

#[test]
fn test_assistant_message_does_not_title() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let conversation = store.create("alice", None).unwrap();

    store
        .append_message(
            "alice",
            conversation.id,
            MessageRole::Assistant,
            "How can I help?",
        )
        .unwrap()
        .unwrap();

    let untitled = store.get("alice", conversation.id).unwrap().unwrap();
    assert_eq!(untitled.title, None);
}

#[test]
fn test_append_refreshes_updated_at() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let conversation = store.create("alice", None).unwrap();

    sleep(Duration::from_millis(5));
    store
        .append_message("alice", conversation.id, MessageRole::User, "hello")
        .unwrap()
        .unwrap();

    let refreshed = store.get("alice", conversation.id).unwrap().unwrap();
    assert!(refreshed.updated_at > conversation.updated_at);
}

#[test]
fn test_recent_listing_orders_by_activity() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let first = store.create("alice", None).unwrap();
    sleep(Duration::from_millis(5));
    let second = store.create("alice", None).unwrap();

    // Activity in the older conversation bumps it to the front
    sleep(Duration::from_millis(5));
    store
        .append_message("alice", first.id, MessageRole::User, "bump")
        .unwrap()
        .unwrap();

    let recent = store.list_recent("alice", 10).unwrap();
    let ids: Vec<u64> = recent.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[test]
fn test_messages_returns_last_n_in_order() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let conversation = store.create("alice", None).unwrap();

    for i in 1..=5 {
        store
            .append_message(
                "alice",
                conversation.id,
                MessageRole::User,
                &format!("message {i}"),
            )
            .unwrap()
            .unwrap();
    }

    let messages = store.messages("alice", conversation.id, 3).unwrap().unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["message 3", "message 4", "message 5"]);
}

#[test]
fn test_message_content_is_validated() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let conversation = store.create("alice", None).unwrap();

    assert!(store
        .append_message("alice", conversation.id, MessageRole::User, "   ")
        .is_err());
    assert!(store
        .append_message(
            "alice",
            conversation.id,
            MessageRole::User,
            &"m".repeat(10_001),
        )
        .is_err());
}

#[test]
fn test_history_survives_restart() {
    let dir = TempDir::new().unwrap();

    let conversation_id = {
        let store = open_store(&dir);
        let conversation = store.create("alice", None).unwrap();
        store
            .append_message("alice", conversation.id, MessageRole::User, "persist me")
            .unwrap()
            .unwrap();
        store.flush().unwrap();
        conversation.id
    };

    let store = open_store(&dir);
    let messages = store.messages("alice", conversation_id, 10).unwrap().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "persist me");
}
