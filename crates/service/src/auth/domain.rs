use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::AuthError;
use super::password;
use super::reset;

/// Account role, stored as its kebab-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Guide,
    LeadGuide,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Guide => "guide",
            Role::LeadGuide => "lead-guide",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "guide" => Ok(Role::Guide),
            "lead-guide" => Ok(Role::LeadGuide),
            "admin" => Ok(Role::Admin),
            other => Err(AuthError::Validation(format!("invalid role: {other}"))),
        }
    }
}

/// Signup input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub photo: Option<String>,
}

/// Login input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordInput {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordInput {
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordInput {
    pub password_current: String,
    pub password: String,
    pub password_confirm: String,
}

/// Public view of a user. Carries no credential material, so it is the only
/// user type that gets serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: Role,
}

/// Hashed reset token and its expiry; both present or both absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReset {
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Full user document as persisted.
#[derive(Clone)]
pub struct StoredUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: Role,
    password_hash: String,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub reset: Option<PendingReset>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for StoredUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password_changed_at", &self.password_changed_at)
            .field("reset_pending", &self.reset.is_some())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// Raw columns used to rebuild a `StoredUser` from storage.
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub photo: String,
    pub role: Role,
    pub password_hash: String,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl StoredUser {
    /// Build a fresh `user`-role account from signup input, hashing the password.
    pub fn new(input: &SignupInput, now: DateTime<Utc>) -> Result<Self, AuthError> {
        models::user::validate_name(&input.name)?;
        models::user::validate_email(&input.email)?;
        password::validate_new_password(&input.password, &input.password_confirm)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            email: models::user::normalize_email(&input.email),
            photo: input.photo.clone().filter(|p| !p.trim().is_empty()).unwrap_or_else(|| "default.jpg".into()),
            role: Role::User,
            password_hash: password::hash_password(&input.password)?,
            password_changed_at: None,
            reset: None,
            active: true,
            created_at: now,
        })
    }

    /// Rehydrate from storage. A half-set reset pair is treated as no reset.
    pub fn from_record(r: UserRecord) -> Self {
        let reset = match (r.password_reset_token, r.password_reset_expires) {
            (Some(token_hash), Some(expires_at)) => Some(PendingReset { token_hash, expires_at }),
            _ => None,
        };
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            photo: r.photo,
            role: r.role,
            password_hash: r.password_hash,
            password_changed_at: r.password_changed_at,
            reset,
            active: r.active,
            created_at: r.created_at,
        }
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn correct_password(&self, candidate: &str) -> bool {
        password::verify_password(candidate, &self.password_hash)
    }

    /// The only way to change the hash: validates, hashes and stamps
    /// `password_changed_at` one second back so a token signed right after
    /// the change is not rejected.
    pub fn set_password(&mut self, plain: &str, confirm: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        password::validate_new_password(plain, confirm)?;
        self.password_hash = password::hash_password(plain)?;
        self.password_changed_at = Some(now - Duration::seconds(1));
        Ok(())
    }

    /// True when the password changed after a token issued at `iat` (unix seconds).
    pub fn changed_password_after(&self, iat: i64) -> bool {
        match self.password_changed_at {
            Some(changed) => iat < changed.timestamp(),
            None => false,
        }
    }

    /// Store the hash of a new random reset token; returns the raw token.
    pub fn create_password_reset(&mut self, now: DateTime<Utc>, ttl: Duration) -> String {
        let token = reset::ResetToken::generate();
        self.reset = Some(PendingReset { token_hash: token.hashed, expires_at: now + ttl });
        token.raw
    }

    pub fn clear_password_reset(&mut self) {
        self.reset = None;
    }

    /// Checks applied on a validated save.
    pub fn validate(&self) -> Result<(), AuthError> {
        models::user::validate_name(&self.name)?;
        models::user::validate_email(&self.email)?;
        if self.password_hash.is_empty() {
            return Err(AuthError::Validation("Please provide a password".into()));
        }
        Ok(())
    }

    pub fn to_public(&self) -> AuthUser {
        AuthUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            photo: self.photo.clone(),
            role: self.role,
        }
    }
}

/// Authenticated result: public user plus signed session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub token: String,
}
