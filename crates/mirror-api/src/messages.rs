use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use mirror_db::Database;
use mirror_db::models::{MessageKey, MessageRow};
use mirror_types::api::MessageInput;
use mirror_types::models::Message;

use crate::credentials::CredentialResolver;
use crate::error::{ApiError, parse_body};
use crate::palindrome::is_palindrome;

/// Message lifecycle: `absent -> active` on create, `active -> active` on
/// update, `active -> deleted` on delete. Deleted messages are never
/// visible again and cannot be mutated.
///
/// Update and delete are guarded twice: the caller's `last_updated_date`
/// must equal the stored one when the record is loaded, and the write
/// itself only applies while the stored token is still unchanged, so two
/// writers racing on the same token cannot both succeed.
///
/// Write operations take the raw JSON body. Update and delete decode it only
/// after the record is loaded, so a missing or deleted record answers
/// not found whatever the body holds.
pub struct MessageService {
    db: Arc<Database>,
    credentials: Arc<dyn CredentialResolver>,
}

impl MessageService {
    pub fn new(db: Arc<Database>, credentials: Arc<dyn CredentialResolver>) -> Self {
        Self { db, credentials }
    }

    pub fn list(&self) -> Result<Vec<Message>, ApiError> {
        let rows = self
            .db
            .list_messages()
            .map_err(|e| ApiError::read_failure("list_messages", e))?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    pub fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Message>, ApiError> {
        let rows = self
            .db
            .list_messages_by_owner(owner_id)
            .map_err(|e| ApiError::read_failure("list_messages_by_owner", e))?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    pub fn read(&self, key: MessageKey) -> Result<Message, ApiError> {
        self.load(&key).map(Message::from)
    }

    pub fn create(&self, body: &[u8]) -> Result<Message, ApiError> {
        let input: MessageInput = parse_body(body)?;
        let text = require_text(&input.message)?;
        let caller = self.caller(&input.api_key)?;

        let row = self
            .db
            .insert_message(caller, text, is_palindrome(text))
            .map_err(|e| ApiError::write_failure("insert_message", e))?;

        info!("Message created by {} at {}", row.owner_id, row.created_at);
        Ok(row.into())
    }

    pub fn update(&self, key: MessageKey, body: &[u8]) -> Result<Message, ApiError> {
        let existing = self.load(&key)?;
        let input: MessageInput = parse_body(body)?;
        let version = check_version(&existing, input.last_updated_date)?;
        let caller = self.caller(&input.api_key)?;
        let text = require_text(&input.message)?;

        let row = self
            .db
            .update_message(&key, version, text, is_palindrome(text), caller)
            .map_err(|e| ApiError::write_failure("update_message", e))?
            .ok_or_else(|| lost_race(&key))?;

        info!("Message {}/{} updated by {}", key.owner_id, key.created_at, caller);
        Ok(row.into())
    }

    pub fn delete(&self, key: MessageKey, body: &[u8]) -> Result<Message, ApiError> {
        let existing = self.load(&key)?;
        let input: MessageInput = parse_body(body)?;
        let version = check_version(&existing, input.last_updated_date)?;
        let caller = self.caller(&input.api_key)?;

        let row = self
            .db
            .soft_delete_message(&key, version, caller)
            .map_err(|e| ApiError::write_failure("soft_delete_message", e))?
            .ok_or_else(|| lost_race(&key))?;

        info!("Message {}/{} deleted by {}", key.owner_id, key.created_at, caller);
        Ok(row.into())
    }

    fn load(&self, key: &MessageKey) -> Result<MessageRow, ApiError> {
        self.db
            .get_message(key)
            .map_err(|e| ApiError::read_failure("get_message", e))?
            .ok_or_else(|| {
                debug!("No live message at {}/{}", key.owner_id, key.created_at);
                ApiError::NotFound
            })
    }

    fn caller(&self, api_key: &str) -> Result<Uuid, ApiError> {
        match self.credentials.resolve(api_key) {
            Ok(Some(id)) => Ok(id),
            Ok(None) => {
                warn!("Rejected request with unknown api_key");
                Err(ApiError::Credential)
            }
            Err(e) => {
                error!("Credential lookup failed: {:#}", e);
                Err(ApiError::Credential)
            }
        }
    }
}

fn require_text(text: &str) -> Result<&str, ApiError> {
    if text.is_empty() {
        return Err(ApiError::Validation("you must provide a message".into()));
    }
    Ok(text)
}

/// The caller must present the version they last saw, and it must be current.
fn check_version(
    existing: &MessageRow,
    supplied: Option<DateTime<Utc>>,
) -> Result<DateTime<Utc>, ApiError> {
    match supplied {
        None => Err(ApiError::VersionRequired),
        Some(version) if version != existing.last_updated_at => {
            debug!(
                "Stale version for {}/{}: supplied {}, stored {}",
                existing.owner_id, existing.created_at, version, existing.last_updated_at
            );
            Err(ApiError::Conflict)
        }
        Some(version) => Ok(version),
    }
}

fn lost_race(key: &MessageKey) -> ApiError {
    warn!(
        "Conditional write on {}/{} matched no rows",
        key.owner_id, key.created_at
    );
    ApiError::Conflict
}
