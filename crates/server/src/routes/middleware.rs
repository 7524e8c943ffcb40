use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use service::auth::{
    domain::{AuthUser, Role},
    errors::AuthError,
    restrict_to as check_role,
    service::NOT_LOGGED_IN,
    token::extract_bearer,
};

use super::auth::{ServerState, JWT_COOKIE, LOGGED_OUT};
use crate::errors::ApiError;

/// Authenticated user placed in request extensions by [`protect`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

/// Roles allowed to write reviews.
pub const REVIEW_AUTHORS: &[Role] = &[Role::User];
/// Roles allowed to delete reviews.
pub const REVIEW_MODERATORS: &[Role] = &[Role::User, Role::Admin];

/// Bearer header first, then the `jwt` cookie.
fn session_token(req: &Request, jar: &CookieJar) -> Option<String> {
    if let Some(token) = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer)
    {
        return Some(token.to_string());
    }
    jar.get(JWT_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| v != LOGGED_OUT)
}

/// Reject the request unless it carries a valid session token for a live user.
pub async fn protect(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(&req, &jar);
    let user = state.auth.protect(token.as_deref()).await.map_err(|e| {
        tracing::warn!(path = %req.uri().path(), error = %e, "rejected unauthenticated request");
        e
    })?;
    req.extensions_mut().insert(CurrentUser(user.to_public()));
    Ok(next.run(req).await)
}

/// Role gate; must run after [`protect`].
pub async fn restrict_to(roles: &'static [Role], req: Request, next: Next) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| AuthError::unauthorized(NOT_LOGGED_IN))?;
    check_role(&user.0, roles)?;
    Ok(next.run(req).await)
}
