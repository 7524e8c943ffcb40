use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{prelude::DateTimeWithTimeZone, DatabaseConnection};
use uuid::Uuid;

use crate::auth::domain::{PendingReset, StoredUser, UserRecord};
use crate::auth::errors::AuthError;
use crate::auth::repository::UserStore;

/// `UserStore` over the `user` table.
pub struct SeaOrmUserStore {
    pub db: DatabaseConnection,
}

impl SeaOrmUserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(m: models::user::Model) -> Result<StoredUser, AuthError> {
    let role = m
        .role
        .parse()
        .map_err(|_| AuthError::Repository(format!("user {} has unknown role {}", m.id, m.role)))?;
    Ok(StoredUser::from_record(UserRecord {
        id: m.id,
        name: m.name,
        email: m.email,
        photo: m.photo,
        role,
        password_hash: m.password_hash,
        password_changed_at: m.password_changed_at.map(|t| t.with_timezone(&Utc)),
        password_reset_token: m.password_reset_token,
        password_reset_expires: m.password_reset_expires.map(|t| t.with_timezone(&Utc)),
        active: m.active,
        created_at: m.created_at.with_timezone(&Utc),
    }))
}

fn to_model(u: &StoredUser) -> models::user::Model {
    let (token, expires): (Option<String>, Option<DateTimeWithTimeZone>) = match &u.reset {
        Some(r) => (Some(r.token_hash.clone()), Some(r.expires_at.into())),
        None => (None, None),
    };
    models::user::Model {
        id: u.id,
        name: u.name.clone(),
        email: u.email.clone(),
        photo: u.photo.clone(),
        role: u.role.as_str().to_string(),
        password_hash: u.password_hash().to_string(),
        password_changed_at: u.password_changed_at.map(Into::into),
        password_reset_token: token,
        password_reset_expires: expires,
        active: u.active,
        created_at: u.created_at.into(),
        updated_at: Utc::now().into(),
    }
}

#[async_trait]
impl UserStore for SeaOrmUserStore {
    async fn create(&self, user: StoredUser) -> Result<StoredUser, AuthError> {
        user.validate()?;
        let created = models::user::insert(&self.db, to_model(&user)).await?;
        to_domain(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredUser>, AuthError> {
        models::user::find_active_by_id(&self.db, id).await?.map(to_domain).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<StoredUser>, AuthError> {
        models::user::find_active_by_email(&self.db, email).await?.map(to_domain).transpose()
    }

    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<StoredUser>, AuthError> {
        models::user::find_by_reset_token(&self.db, token_hash, now.into())
            .await?
            .map(to_domain)
            .transpose()
    }

    async fn save(&self, user: &StoredUser) -> Result<(), AuthError> {
        user.validate()?;
        models::user::save(&self.db, to_model(user)).await?;
        Ok(())
    }

    async fn set_password_reset(&self, id: Uuid, reset: Option<&PendingReset>) -> Result<(), AuthError> {
        let (token, expires): (Option<String>, Option<DateTimeWithTimeZone>) = match reset {
            Some(r) => (Some(r.token_hash.clone()), Some(r.expires_at.into())),
            None => (None, None),
        };
        models::user::set_password_reset(&self.db, id, token, expires).await?;
        Ok(())
    }
}
