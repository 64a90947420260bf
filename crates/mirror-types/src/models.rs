use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A versioned text record, keyed by `(owner_id, created_at)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    #[serde(rename = "create_date", with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "message")]
    pub text: String,
    pub is_palindrome: bool,
    /// Optimistic-concurrency token. Clients echo it back on update/delete.
    #[serde(rename = "last_updated_date", with = "crate::timestamp")]
    pub last_updated_at: DateTime<Utc>,
    pub last_updated_by: Uuid,
    #[serde(skip)]
    pub deleted: bool,
}

/// Public view of a registered user. Email and key hash stay server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    #[serde(rename = "user_id")]
    pub id: Uuid,
    pub name: String,
    #[serde(skip)]
    pub email: String,
    #[serde(rename = "last_access", with = "crate::timestamp")]
    pub last_access_at: DateTime<Utc>,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}
