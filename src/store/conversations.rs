//! Conversation and message persistence for the chat layer
//!
//! Keys follow the task-store discipline:
//!   conversations: {user_id}:{conversation_id:020}
//!   messages:      {user_id}:{conversation_id:020}:{message_id:020}
//! so both listing and ownership checks are prefix operations.

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use rocksdb::{Options, DB};
use std::path::Path;
use std::sync::Arc;

use super::types::{Conversation, Message, MessageRole};
use crate::validation;

const NEXT_CONVERSATION_ID_KEY: &[u8] = b"next_conversation_id";
const NEXT_MESSAGE_ID_KEY: &[u8] = b"next_message_id";

/// Maximum auto-generated title length (characters)
const AUTO_TITLE_MAX_CHARS: usize = 80;

/// Storage for conversations and their messages
pub struct ConversationStore {
    conversation_db: Arc<DB>,
    message_db: Arc<DB>,
    meta_db: Arc<DB>,
    next_conversation_id: Mutex<u64>,
    next_message_id: Mutex<u64>,
}

fn conversation_key(user_id: &str, id: u64) -> String {
    format!("{user_id}:{id:020}")
}

fn message_key(user_id: &str, conversation_id: u64, message_id: u64) -> String {
    format!("{user_id}:{conversation_id:020}:{message_id:020}")
}

fn load_sequence(meta_db: &DB, key: &[u8]) -> Result<u64> {
    match meta_db.get(key)? {
        Some(raw) => std::str::from_utf8(&raw)
            .ok()
            .and_then(|s| s.parse().ok())
            .context("Corrupt id sequence"),
        None => Ok(1),
    }
}

fn allocate(meta_db: &DB, key: &[u8], counter: &Mutex<u64>) -> Result<u64> {
    let mut guard = counter.lock();
    let id = *guard;
    meta_db
        .put(key, (id + 1).to_string().as_bytes())
        .context("Failed to persist id sequence")?;
    *guard = id + 1;
    Ok(id)
}

impl ConversationStore {
    /// Open (or create) a conversation store at the given path
    pub fn open(storage_path: &Path) -> Result<Self> {
        let chat_path = storage_path.join("conversations");
        std::fs::create_dir_all(&chat_path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let conversation_db = Arc::new(
            DB::open(&opts, chat_path.join("items")).context("Failed to open conversations DB")?,
        );
        let message_db = Arc::new(
            DB::open(&opts, chat_path.join("messages")).context("Failed to open messages DB")?,
        );
        let meta_db = Arc::new(
            DB::open(&opts, chat_path.join("meta"))
                .context("Failed to open conversations meta DB")?,
        );

        let next_conversation_id = load_sequence(&meta_db, NEXT_CONVERSATION_ID_KEY)?;
        let next_message_id = load_sequence(&meta_db, NEXT_MESSAGE_ID_KEY)?;

        tracing::info!(
            next_conversation_id,
            next_message_id,
            "Conversation store initialized"
        );

        Ok(Self {
            conversation_db,
            message_db,
            meta_db,
            next_conversation_id: Mutex::new(next_conversation_id),
            next_message_id: Mutex::new(next_message_id),
        })
    }

    fn put_conversation(&self, conversation: &Conversation) -> Result<()> {
        let key = conversation_key(&conversation.user_id, conversation.id);
        let value =
            serde_json::to_vec(conversation).context("Failed to serialize conversation")?;
        self.conversation_db
            .put(key.as_bytes(), &value)
            .context("Failed to store conversation")?;
        Ok(())
    }

    /// Create a new conversation for a user
    pub fn create(&self, user_id: &str, title: Option<String>) -> Result<Conversation> {
        validation::validate_user_id(user_id)?;

        let now = Utc::now();
        let conversation = Conversation {
            id: allocate(&self.meta_db, NEXT_CONVERSATION_ID_KEY, &self.next_conversation_id)?,
            user_id: user_id.to_string(),
            title,
            created_at: now,
            updated_at: now,
        };

        self.put_conversation(&conversation)?;

        tracing::debug!(
            user_id = %user_id,
            conversation_id = conversation.id,
            "Created conversation"
        );

        Ok(conversation)
    }

    /// Point lookup scoped to the owner
    pub fn get(&self, user_id: &str, id: u64) -> Result<Option<Conversation>> {
        let key = conversation_key(user_id, id);

        match self.conversation_db.get(key.as_bytes())? {
            Some(value) => Ok(Some(
                serde_json::from_slice(&value).context("Failed to deserialize conversation")?,
            )),
            None => Ok(None),
        }
    }

    /// Get a specific conversation (validating ownership), else the most
    /// recently updated one, else a fresh conversation.
    pub fn get_or_create(
        &self,
        user_id: &str,
        conversation_id: Option<u64>,
    ) -> Result<Conversation> {
        if let Some(id) = conversation_id {
            if let Some(conversation) = self.get(user_id, id)? {
                return Ok(conversation);
            }
        }

        let mut recent = self.list_recent(user_id, 1)?;
        if let Some(conversation) = recent.pop() {
            return Ok(conversation);
        }

        self.create(user_id, None)
    }

    /// List the owner's conversations, most recently updated first
    pub fn list_recent(&self, user_id: &str, limit: usize) -> Result<Vec<Conversation>> {
        let prefix = format!("{user_id}:");
        let mut conversations = Vec::new();

        let iter = self.conversation_db.prefix_iterator(prefix.as_bytes());
        for entry in iter {
            let (key, value) = entry.context("Conversation iteration failed")?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }

            let conversation: Conversation =
                serde_json::from_slice(&value).context("Failed to deserialize conversation")?;
            conversations.push(conversation);
        }

        conversations.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        conversations.truncate(limit);

        Ok(conversations)
    }

    /// Append a message to a conversation the user owns.
    ///
    /// Refreshes the conversation's `updated_at`; the first user message
    /// auto-titles an untitled conversation. Returns None if the
    /// conversation is absent or owned by another principal.
    pub fn append_message(
        &self,
        user_id: &str,
        conversation_id: u64,
        role: MessageRole,
        content: &str,
    ) -> Result<Option<Message>> {
        validation::validate_message_content(content)?;

        let Some(mut conversation) = self.get(user_id, conversation_id)? else {
            return Ok(None);
        };

        let message = Message {
            id: allocate(&self.meta_db, NEXT_MESSAGE_ID_KEY, &self.next_message_id)?,
            conversation_id,
            user_id: user_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };

        let key = message_key(user_id, conversation_id, message.id);
        let value = serde_json::to_vec(&message).context("Failed to serialize message")?;
        self.message_db
            .put(key.as_bytes(), &value)
            .context("Failed to store message")?;

        if conversation.title.is_none() && role == MessageRole::User {
            conversation.title = Some(content.chars().take(AUTO_TITLE_MAX_CHARS).collect());
        }
        conversation.updated_at = message.created_at;
        self.put_conversation(&conversation)?;

        tracing::debug!(
            user_id = %user_id,
            conversation_id,
            message_id = message.id,
            role = ?role,
            "Appended message"
        );

        Ok(Some(message))
    }

    /// Fetch the last `limit` messages of a conversation in chronological
    /// order. Returns None if the conversation is absent or not owned.
    pub fn messages(
        &self,
        user_id: &str,
        conversation_id: u64,
        limit: usize,
    ) -> Result<Option<Vec<Message>>> {
        if self.get(user_id, conversation_id)?.is_none() {
            return Ok(None);
        }

        let prefix = format!("{user_id}:{conversation_id:020}:");
        let mut messages = Vec::new();

        let iter = self.message_db.prefix_iterator(prefix.as_bytes());
        for entry in iter {
            let (key, value) = entry.context("Message iteration failed")?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }

            let message: Message =
                serde_json::from_slice(&value).context("Failed to deserialize message")?;
            messages.push(message);
        }

        // Keys are ordered by message id, which is allocation order
        messages.sort_by_key(|m| m.id);
        if messages.len() > limit {
            messages.drain(..messages.len() - limit);
        }

        Ok(Some(messages))
    }

    /// Flush RocksDB to disk (graceful shutdown)
    pub fn flush(&self) -> Result<()> {
        self.conversation_db
            .flush()
            .context("Failed to flush conversations DB")?;
        self.message_db
            .flush()
            .context("Failed to flush messages DB")?;
        self.meta_db
            .flush()
            .context("Failed to flush conversations meta DB")?;
        Ok(())
    }
}
