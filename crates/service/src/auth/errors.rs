use thiserror::Error;

/// Business errors for auth workflows.
///
/// Every variant carries the client-facing message; the HTTP status is derived
/// from the variant alone.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl AuthError {
    pub fn bad_request(msg: impl Into<String>) -> Self { Self::BadRequest(msg.into()) }
    pub fn unauthorized(msg: impl Into<String>) -> Self { Self::Unauthorized(msg.into()) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::BadRequest(_) => 1002,
            AuthError::NotFound(_) => 1003,
            AuthError::Unauthorized(_) => 1004,
            AuthError::Forbidden(_) => 1005,
            AuthError::Internal(_) => 1100,
            AuthError::HashError(_) => 1101,
            AuthError::TokenError(_) => 1102,
            AuthError::Repository(_) => 1200,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::BadRequest(_) | AuthError::Validation(_) => 400,
            AuthError::Unauthorized(_) => 401,
            AuthError::Forbidden(_) => 403,
            AuthError::NotFound(_) => 404,
            AuthError::Internal(_)
            | AuthError::HashError(_)
            | AuthError::TokenError(_)
            | AuthError::Repository(_) => 500,
        }
    }

    /// Errors whose message is safe to hand to the client as-is.
    pub fn is_operational(&self) -> bool {
        !matches!(self, AuthError::HashError(_) | AuthError::TokenError(_) | AuthError::Repository(_))
    }
}

impl From<models::errors::ModelError> for AuthError {
    fn from(e: models::errors::ModelError) -> Self {
        use models::errors::ModelError;
        match e {
            ModelError::Validation(msg) => AuthError::Validation(msg),
            ModelError::Duplicate(field) => AuthError::Validation(format!("Duplicate field value: {field}. Please use another value!")),
            ModelError::Db(msg) => AuthError::Repository(msg),
        }
    }
}
