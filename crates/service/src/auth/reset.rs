//! Password reset tokens and the two-phase "store token, then mail it" step.
//!
//! The raw token only ever leaves the process in the reset email; storage
//! keeps its sha256 hex digest.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::{error, info};

use super::domain::StoredUser;
use super::errors::AuthError;
use super::notifier::{Email, Notifier};
use super::repository::UserStore;

pub const RESET_TOKEN_BYTES: usize = 32;

pub struct ResetToken {
    pub raw: String,
    pub hashed: String,
}

impl ResetToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; RESET_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let raw = hex::encode(bytes);
        let hashed = hash_reset_token(&raw);
        Self { raw, hashed }
    }
}

pub fn hash_reset_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// A reset token that has been persisted but not yet delivered.
///
/// `notify_or_rollback` is the only way to finish it: on notifier failure the
/// token/expiry pair is cleared and written back before the error surfaces.
pub struct ResetGuard<'a, S: UserStore + ?Sized> {
    store: &'a S,
    user: StoredUser,
    raw: String,
}

impl<'a, S: UserStore + ?Sized> ResetGuard<'a, S> {
    /// Phase one: attach a fresh token to `user` and persist only the token pair.
    pub async fn arm(store: &'a S, mut user: StoredUser, now: DateTime<Utc>, ttl: Duration) -> Result<Self, AuthError> {
        let raw = user.create_password_reset(now, ttl);
        store.set_password_reset(user.id, user.reset.as_ref()).await?;
        Ok(Self { store, user, raw })
    }

    pub fn raw_token(&self) -> &str {
        &self.raw
    }

    pub fn user(&self) -> &StoredUser {
        &self.user
    }

    /// Phase two: deliver the email, or undo phase one.
    pub async fn notify_or_rollback<N: Notifier + ?Sized>(mut self, notifier: &N, email: Email) -> Result<(), AuthError> {
        match notifier.send(&email).await {
            Ok(()) => {
                info!(user_id = %self.user.id, "password_reset_token_sent");
                Ok(())
            }
            Err(send_err) => {
                error!(user_id = %self.user.id, error = %send_err, "password reset email failed; clearing token");
                self.user.clear_password_reset();
                if let Err(e) = self.store.set_password_reset(self.user.id, None).await {
                    error!(user_id = %self.user.id, error = %e, "failed to clear reset token after email failure");
                }
                Err(AuthError::Internal("There was an error sending the email. Try again later!".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_random_hex_and_hash_deterministically() {
        let a = ResetToken::generate();
        let b = ResetToken::generate();
        assert_eq!(a.raw.len(), RESET_TOKEN_BYTES * 2);
        assert!(a.raw.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.raw, b.raw);
        assert_eq!(a.hashed, hash_reset_token(&a.raw));
        assert_ne!(a.hashed, a.raw);
        assert_eq!(a.hashed.len(), 64);
    }

    #[test]
    fn known_digest() {
        assert_eq!(
            hash_reset_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
