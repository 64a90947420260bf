use std::sync::Arc;

use uuid::Uuid;

use mirror_crypto::keys::hash_api_key;
use mirror_db::Database;

/// Maps a presented API key to the id of the user it belongs to.
///
/// Injected into [`crate::messages::MessageService`] so message handling
/// does not depend on the user service directly. `Ok(None)` means the key
/// matched nobody; `Err` is a lookup failure.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, api_key: &str) -> anyhow::Result<Option<Uuid>>;
}

/// Resolves keys against the `users` table by SHA-256 digest.
pub struct ApiKeyResolver {
    db: Arc<Database>,
}

impl ApiKeyResolver {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl CredentialResolver for ApiKeyResolver {
    fn resolve(&self, api_key: &str) -> anyhow::Result<Option<Uuid>> {
        if api_key.is_empty() {
            return Ok(None);
        }

        let user = self.db.get_user_by_api_key_hash(&hash_api_key(api_key))?;
        Ok(user.map(|u| u.id))
    }
}
