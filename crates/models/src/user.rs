use sea_orm::{entity::prelude::*, Set, DatabaseConnection, QueryFilter};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;

pub const ROLES: [&str; 4] = ["user", "guide", "lead-guide", "admin"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub photo: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub password_changed_at: Option<DateTimeWithTimeZone>,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires: Option<DateTimeWithTimeZone>,
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::review::Entity")]
    Review,
}

impl Related<crate::review::Entity> for Entity {
    fn to() -> RelationDef { Relation::Review.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), errors::ModelError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
        None => false,
    };
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(errors::ModelError::Validation("Please provide a valid email".into()));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() {
        return Err(errors::ModelError::Validation("Please tell us your name!".into()));
    }
    if name.len() > 128 {
        return Err(errors::ModelError::Validation("name must be at most 128 characters".into()));
    }
    Ok(())
}

pub fn validate_role(role: &str) -> Result<(), errors::ModelError> {
    if !ROLES.contains(&role) {
        return Err(errors::ModelError::Validation(format!("invalid role: {role}")));
    }
    Ok(())
}

/// Document-level validation run on full saves.
pub fn validate(m: &Model) -> Result<(), errors::ModelError> {
    validate_name(&m.name)?;
    validate_email(&m.email)?;
    validate_role(&m.role)?;
    if m.password_hash.trim().is_empty() {
        return Err(errors::ModelError::Validation("Please provide a password".into()));
    }
    if m.password_reset_token.is_some() != m.password_reset_expires.is_some() {
        return Err(errors::ModelError::Validation("reset token and expiry must be set together".into()));
    }
    Ok(())
}

fn to_active(m: Model) -> ActiveModel {
    ActiveModel {
        id: Set(m.id),
        name: Set(m.name),
        email: Set(m.email),
        photo: Set(m.photo),
        role: Set(m.role),
        password_hash: Set(m.password_hash),
        password_changed_at: Set(m.password_changed_at),
        password_reset_token: Set(m.password_reset_token),
        password_reset_expires: Set(m.password_reset_expires),
        active: Set(m.active),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}

pub async fn insert(db: &DatabaseConnection, m: Model) -> Result<Model, errors::ModelError> {
    to_active(m).insert(db).await.map_err(|e| errors::ModelError::from_db(e, "email"))
}

/// Write every column of the document back, bumping `updated_at`.
pub async fn save(db: &DatabaseConnection, mut m: Model) -> Result<Model, errors::ModelError> {
    m.updated_at = Utc::now().into();
    to_active(m).update(db).await.map_err(|e| errors::ModelError::from_db(e, "email"))
}

/// Update only the reset token pair (and `updated_at`), leaving the rest of the row alone.
pub async fn set_password_reset(
    db: &DatabaseConnection,
    id: Uuid,
    hashed_token: Option<String>,
    expires: Option<DateTimeWithTimeZone>,
) -> Result<(), errors::ModelError> {
    let am = ActiveModel {
        id: Set(id),
        password_reset_token: Set(hashed_token),
        password_reset_expires: Set(expires),
        updated_at: Set(Utc::now().into()),
        ..Default::default()
    };
    am.update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(())
}

pub async fn find_active_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Model>, errors::ModelError> {
    Entity::find_by_id(id)
        .filter(Column::Active.eq(true))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn find_active_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::Email.eq(normalize_email(email)))
        .filter(Column::Active.eq(true))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Active user holding the hashed reset token, with expiry still in the future.
pub async fn find_by_reset_token(
    db: &DatabaseConnection,
    hashed_token: &str,
    now: DateTimeWithTimeZone,
) -> Result<Option<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::PasswordResetToken.eq(hashed_token))
        .filter(Column::PasswordResetExpires.gt(now))
        .filter(Column::Active.eq(true))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn hard_delete(db: &DatabaseConnection, id: Uuid) -> Result<(), errors::ModelError> {
    Entity::delete_by_id(id).exec(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(())
}
