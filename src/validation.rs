//! Input validation for the task API
//! Enforces the data-model bounds before anything touches the store.

use anyhow::{anyhow, Result};

/// Maximum lengths for task fields and identifiers
pub const MAX_USER_ID_LENGTH: usize = 128;
pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_IDENTIFIER_LENGTH: usize = 256;
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Validate user_id
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(anyhow!("user_id cannot be empty"));
    }

    if user_id.len() > MAX_USER_ID_LENGTH {
        return Err(anyhow!(
            "user_id too long: {} chars (max: {})",
            user_id.len(),
            MAX_USER_ID_LENGTH
        ));
    }

    // Only allow alphanumeric, dash, underscore, @ and dot.
    // ':' is excluded deliberately: it is the storage key separator.
    if !user_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '@' || c == '.')
    {
        return Err(anyhow!(
            "user_id contains invalid characters (allowed: alphanumeric, -, _, @, .)"
        ));
    }

    Ok(())
}

/// Validate a task title. The caller is expected to trim first; the bound
/// applies to the trimmed string.
pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(anyhow!("Title is required and cannot be empty"));
    }

    // Bounds count characters, not bytes, so multibyte titles are not
    // rejected early
    if title.trim().chars().count() > MAX_TITLE_LENGTH {
        return Err(anyhow!(
            "Title must be {MAX_TITLE_LENGTH} characters or less"
        ));
    }

    Ok(())
}

/// Validate an optional task description
pub fn validate_description(description: &str) -> Result<()> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(anyhow!(
            "Description must be {MAX_DESCRIPTION_LENGTH} characters or less"
        ));
    }

    Ok(())
}

/// Validate a free-text task identifier (numeric id or title fragment)
pub fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.trim().is_empty() {
        return Err(anyhow!("task identifier cannot be empty"));
    }

    if identifier.len() > MAX_IDENTIFIER_LENGTH {
        return Err(anyhow!(
            "task identifier too long: {} chars (max: {})",
            identifier.len(),
            MAX_IDENTIFIER_LENGTH
        ));
    }

    Ok(())
}

/// Validate chat message content
pub fn validate_message_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(anyhow!("message content cannot be empty"));
    }

    if content.len() > MAX_MESSAGE_LENGTH {
        return Err(anyhow!(
            "message content too long: {} chars (max: {})",
            content.len(),
            MAX_MESSAGE_LENGTH
        ));
    }

    Ok(())
}
