//! Database row types — these map directly to SQLite rows.
//! Text columns are decoded into typed values when the row is read; a
//! malformed column fails the query instead of producing a partial row.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use mirror_types::models::{Message, User};

/// Primary key of a message row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageKey {
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub is_palindrome: bool,
    pub last_updated_at: DateTime<Utc>,
    pub last_updated_by: Uuid,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub api_key_hash: String,
    pub last_access_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            owner_id: row.owner_id,
            created_at: row.created_at,
            text: row.text,
            is_palindrome: row.is_palindrome,
            last_updated_at: row.last_updated_at,
            last_updated_by: row.last_updated_by,
            deleted: row.deleted,
        }
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.full_name,
            email: row.email,
            last_access_at: row.last_access_at,
            created_at: row.created_at,
        }
    }
}
