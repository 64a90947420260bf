use std::sync::Arc;

use tracing::info;

use mirror_crypto::keys::generate_api_key;
use mirror_db::Database;
use mirror_types::api::{CreatedUser, UserInput};
use mirror_types::models::User;

use crate::error::ApiError;

pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn list(&self) -> Result<Vec<User>, ApiError> {
        let rows = self
            .db
            .list_users()
            .map_err(|e| ApiError::read_failure("list_users", e))?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Register a user. The raw key in the result is never stored and cannot
    /// be recovered later.
    pub fn create(&self, input: &UserInput) -> Result<CreatedUser, ApiError> {
        if input.full_name.is_empty() {
            return Err(ApiError::Validation("you must provide a full_name".into()));
        }
        if !looks_like_email(&input.email) {
            return Err(ApiError::Validation("you must provide a valid email".into()));
        }

        let key = generate_api_key();
        let row = self
            .db
            .create_user(&input.full_name, &input.email, &key.hash)
            .map_err(|e| ApiError::write_failure("create_user", e))?;

        info!("User {} registered", row.id);
        Ok(CreatedUser {
            user: row.into(),
            api_key: key.raw,
        })
    }
}

/// `local@domain` with no whitespace and a dot somewhere in the domain.
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{ApiKeyResolver, CredentialResolver};

    fn service() -> (UserService, Arc<Database>) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        (UserService::new(db.clone()), db)
    }

    fn input(full_name: &str, email: &str) -> UserInput {
        UserInput {
            full_name: full_name.into(),
            email: email.into(),
        }
    }

    #[test]
    fn created_key_resolves_to_the_user() {
        let (users, db) = service();
        let created = users.create(&input("Ada Lovelace", "ada@example.com")).unwrap();
        assert_eq!(created.user.name, "Ada Lovelace");
        assert!(!created.api_key.is_empty());

        let resolver = ApiKeyResolver::new(db);
        assert_eq!(resolver.resolve(&created.api_key).unwrap(), Some(created.user.id));
    }

    #[test]
    fn list_never_includes_keys() {
        let (users, _db) = service();
        users.create(&input("Ada", "ada@example.com")).unwrap();

        let listed = users.list().unwrap();
        assert_eq!(listed.len(), 1);
        let json = serde_json::to_value(&listed).unwrap();
        assert!(json[0].get("api_key").is_none());
        assert!(json[0].get("email").is_none());
    }

    #[test]
    fn rejects_missing_fields() {
        let (users, _db) = service();
        assert!(matches!(
            users.create(&input("", "ada@example.com")),
            Err(ApiError::Validation(msg)) if msg.contains("full_name")
        ));
        assert!(matches!(
            users.create(&input("Ada", "")),
            Err(ApiError::Validation(msg)) if msg.contains("email")
        ));
        assert!(users.list().unwrap().is_empty());
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("ab.co"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("a@@b.co"));
        assert!(!looks_like_email("a b@c.co"));
    }
}
