use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::domain::{PendingReset, StoredUser};
use super::errors::AuthError;

/// Persistence seam for user documents. Lookups only see active accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new document. Duplicate emails fail with `AuthError::Validation`.
    async fn create(&self, user: StoredUser) -> Result<StoredUser, AuthError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredUser>, AuthError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, AuthError>;
    /// User whose stored reset hash equals `token_hash` and whose expiry is after `now`.
    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<StoredUser>, AuthError>;
    /// Validate and replace the whole document.
    async fn save(&self, user: &StoredUser) -> Result<(), AuthError>;
    /// Write only the reset token pair, unvalidated. `None` clears it.
    async fn set_password_reset(&self, id: Uuid, reset: Option<&PendingReset>) -> Result<(), AuthError>;
}

/// Simple in-memory mock store for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockUserStore {
        users: Mutex<HashMap<Uuid, StoredUser>>, // key: user id
    }

    impl MockUserStore {
        /// Raw document access for assertions, including inactive users.
        pub fn get(&self, id: Uuid) -> Option<StoredUser> {
            self.users.lock().unwrap().get(&id).cloned()
        }

        pub fn insert_raw(&self, user: StoredUser) {
            self.users.lock().unwrap().insert(user.id, user);
        }

        pub fn remove(&self, id: Uuid) -> Option<StoredUser> {
            self.users.lock().unwrap().remove(&id)
        }
    }

    #[async_trait]
    impl UserStore for MockUserStore {
        async fn create(&self, user: StoredUser) -> Result<StoredUser, AuthError> {
            user.validate()?;
            let mut users = self.users.lock().unwrap();
            if users.values().any(|u| u.email == user.email) {
                return Err(AuthError::Validation("Duplicate field value: email. Please use another value!".into()));
            }
            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(&id).filter(|u| u.active).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, AuthError> {
            let email = models::user::normalize_email(email);
            let users = self.users.lock().unwrap();
            Ok(users.values().find(|u| u.active && u.email == email).cloned())
        }

        async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<StoredUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users
                .values()
                .find(|u| u.active && matches!(&u.reset, Some(r) if r.token_hash == token_hash && r.expires_at > now))
                .cloned())
        }

        async fn save(&self, user: &StoredUser) -> Result<(), AuthError> {
            user.validate()?;
            let mut users = self.users.lock().unwrap();
            if !users.contains_key(&user.id) {
                return Err(AuthError::Repository(format!("user {} not found", user.id)));
            }
            users.insert(user.id, user.clone());
            Ok(())
        }

        async fn set_password_reset(&self, id: Uuid, reset: Option<&PendingReset>) -> Result<(), AuthError> {
            let mut users = self.users.lock().unwrap();
            let user = users
                .get_mut(&id)
                .ok_or_else(|| AuthError::Repository(format!("user {id} not found")))?;
            user.reset = reset.cloned();
            Ok(())
        }
    }
}
