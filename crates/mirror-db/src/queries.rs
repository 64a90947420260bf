use crate::Database;
use crate::models::{MessageKey, MessageRow, UserRow};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use mirror_types::timestamp;
use mirror_types::validation::{TimestampFormat, parse_identifier, parse_timestamp};

const MESSAGE_COLUMNS: &str =
    "owner_id, created_at, text, is_palindrome, last_updated_at, last_updated_by, deleted";

const USER_COLUMNS: &str = "id, full_name, email, api_key_hash, last_access_at, created_at";

impl Database {
    // -- Messages --

    pub fn list_messages(&self) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages WHERE deleted = 0 ORDER BY created_at"
                ),
                [],
            )
        })
    }

    pub fn list_messages_by_owner(&self, owner_id: Uuid) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages
                     WHERE owner_id = ?1 AND deleted = 0
                     ORDER BY created_at"
                ),
                [owner_id.to_string()],
            )
        })
    }

    /// Live (non-deleted) message at `key`.
    pub fn get_message(&self, key: &MessageKey) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, key, true))
    }

    /// Message at `key` whether or not it has been deleted.
    pub fn get_message_any_state(&self, key: &MessageKey) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, key, false))
    }

    /// Insert a new message. `created_at` (and the initial version token) are
    /// assigned here; the stored row is read back as the owner's latest.
    pub fn insert_message(
        &self,
        owner_id: Uuid,
        text: &str,
        is_palindrome: bool,
    ) -> Result<MessageRow> {
        self.with_conn_mut(|conn| {
            // Keep created_at strictly increasing per owner so the key is
            // unique and "latest" is the row we just wrote.
            let previous: Option<String> = conn.query_row(
                "SELECT MAX(created_at) FROM messages WHERE owner_id = ?1",
                [owner_id.to_string()],
                |row| row.get(0),
            )?;
            let previous = previous
                .map(|raw| parse_timestamp(&raw, TimestampFormat::Rfc3339Nano))
                .transpose()?;
            let created_at = match previous {
                Some(prev) => next_version(prev),
                None => Utc::now(),
            };
            let stamp = timestamp::format(&created_at);

            conn.execute(
                "INSERT INTO messages
                    (owner_id, created_at, text, is_palindrome, last_updated_at, last_updated_by, deleted)
                 VALUES (?1, ?2, ?3, ?4, ?2, ?1, 0)",
                rusqlite::params![owner_id.to_string(), stamp, text, is_palindrome],
            )?;

            query_latest_for_owner(conn, owner_id)?
                .ok_or_else(|| anyhow!("Inserted message for {} not found on re-read", owner_id))
        })
    }

    /// Conditionally rewrite a live message's text. The version check is part
    /// of the UPDATE predicate; `Ok(None)` means no row matched.
    pub fn update_message(
        &self,
        key: &MessageKey,
        expected_version: DateTime<Utc>,
        text: &str,
        is_palindrome: bool,
        updated_by: Uuid,
    ) -> Result<Option<MessageRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE messages
                 SET text = ?1, is_palindrome = ?2, last_updated_by = ?3, last_updated_at = ?4
                 WHERE owner_id = ?5 AND created_at = ?6 AND last_updated_at = ?7 AND deleted = 0",
                rusqlite::params![
                    text,
                    is_palindrome,
                    updated_by.to_string(),
                    timestamp::format(&next_version(expected_version)),
                    key.owner_id.to_string(),
                    timestamp::format(&key.created_at),
                    timestamp::format(&expected_version),
                ],
            )?;

            if changed == 0 {
                return Ok(None);
            }
            query_message(conn, key, true)
        })
    }

    /// Conditionally mark a live message deleted. Same predicate as
    /// [`Database::update_message`]; the returned row is the deleted one.
    pub fn soft_delete_message(
        &self,
        key: &MessageKey,
        expected_version: DateTime<Utc>,
        deleted_by: Uuid,
    ) -> Result<Option<MessageRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE messages
                 SET deleted = 1, last_updated_by = ?1, last_updated_at = ?2
                 WHERE owner_id = ?3 AND created_at = ?4 AND last_updated_at = ?5 AND deleted = 0",
                rusqlite::params![
                    deleted_by.to_string(),
                    timestamp::format(&next_version(expected_version)),
                    key.owner_id.to_string(),
                    timestamp::format(&key.created_at),
                    timestamp::format(&expected_version),
                ],
            )?;

            if changed == 0 {
                return Ok(None);
            }
            query_message(conn, key, false)
        })
    }

    // -- Users --

    pub fn create_user(&self, full_name: &str, email: &str, api_key_hash: &str) -> Result<UserRow> {
        let id = Uuid::new_v4();
        let now = timestamp::format(&Utc::now());

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, full_name, email, api_key_hash, last_access_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![id.to_string(), full_name, email, api_key_hash, now],
            )?;

            query_user(conn, &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"), &id.to_string())?
                .ok_or_else(|| anyhow!("Inserted user {} not found on re-read", id))
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at"))?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_user_by_api_key_hash(&self, api_key_hash: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(
                conn,
                &format!("SELECT {USER_COLUMNS} FROM users WHERE api_key_hash = ?1"),
                api_key_hash,
            )
        })
    }
}

/// Version token following `prev`: the current time, or one nanosecond past
/// `prev` if the clock has not moved beyond it.
pub fn next_version(prev: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    let bumped = prev + Duration::nanoseconds(1);
    if now > prev { now } else { bumped }
}

fn query_messages<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_message(conn: &Connection, key: &MessageKey, live_only: bool) -> Result<Option<MessageRow>> {
    let sql = if live_only {
        format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE owner_id = ?1 AND created_at = ?2 AND deleted = 0"
        )
    } else {
        format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE owner_id = ?1 AND created_at = ?2")
    };

    conn.query_row(
        &sql,
        rusqlite::params![key.owner_id.to_string(), timestamp::format(&key.created_at)],
        message_from_row,
    )
    .optional()
}

fn query_latest_for_owner(conn: &Connection, owner_id: Uuid) -> Result<Option<MessageRow>> {
    conn.query_row(
        &format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE owner_id = ?1 AND deleted = 0
             ORDER BY created_at DESC
             LIMIT 1"
        ),
        [owner_id.to_string()],
        message_from_row,
    )
    .optional()
}

fn query_user(conn: &Connection, sql: &str, param: &str) -> Result<Option<UserRow>> {
    conn.query_row(sql, [param], user_from_row).optional()
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        owner_id: uuid_column(row, 0)?,
        created_at: timestamp_column(row, 1)?,
        text: row.get(2)?,
        is_palindrome: row.get(3)?,
        last_updated_at: timestamp_column(row, 4)?,
        last_updated_by: uuid_column(row, 5)?,
        deleted: row.get(6)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: uuid_column(row, 0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        api_key_hash: row.get(3)?,
        last_access_at: timestamp_column(row, 4)?,
        created_at: timestamp_column(row, 5)?,
    })
}

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    parse_identifier(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw, TimestampFormat::Rfc3339Nano)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
