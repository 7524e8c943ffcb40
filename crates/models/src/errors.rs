use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("duplicate field value: {0}")]
    Duplicate(String),
    #[error("database error: {0}")]
    Db(String),
}

impl ModelError {
    /// Unique-index violations surface as `Duplicate` so callers can answer 400.
    pub fn from_db(err: sea_orm::DbErr, field: &str) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => ModelError::Duplicate(field.to_string()),
            _ => ModelError::Db(err.to_string()),
        }
    }
}
