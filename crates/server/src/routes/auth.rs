use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar, SameSite},
    WithRejection,
};
use serde::Serialize;
use time::OffsetDateTime;

use common::types::StatusMessage;
use service::auth::{
    domain::{
        AuthSession, AuthUser, ForgotPasswordInput, LoginInput, ResetPasswordInput, SignupInput, UpdatePasswordInput,
    },
    notifier::Notifier,
    repository::UserStore,
    service::{AuthConfig, AuthService},
};
use service::reviews::{repository::ReviewRepository, ReviewService};

use super::middleware::CurrentUser;
use crate::errors::ApiError;

pub const JWT_COOKIE: &str = "jwt";
pub const LOGGED_OUT: &str = "loggedout";

/// Session cookie attributes.
#[derive(Clone, Debug)]
pub struct CookieSettings {
    pub expires_in_days: i64,
    pub secure: bool,
}

impl CookieSettings {
    pub fn from_settings(s: &configs::AuthSettings) -> Self {
        Self { expires_in_days: s.jwt_cookie_expires_in_days, secure: s.is_production() }
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(JWT_COOKIE, token);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_expires(OffsetDateTime::now_utc() + time::Duration::days(self.expires_in_days));
        cookie
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService<dyn UserStore, dyn Notifier>>,
    pub reviews: Arc<ReviewService<dyn ReviewRepository>>,
    pub cookie: CookieSettings,
}

impl ServerState {
    pub fn new(
        users: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
        reviews: Arc<dyn ReviewRepository>,
        auth_cfg: AuthConfig,
        cookie: CookieSettings,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(users, notifier, auth_cfg)),
            reviews: Arc::new(ReviewService::new(reviews)),
            cookie,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct UserData {
    pub user: AuthUser,
}

/// `{ status, token, data: { user } }`
#[derive(Serialize, Debug)]
pub struct SessionResponse {
    pub status: &'static str,
    pub token: String,
    pub data: UserData,
}

#[derive(Serialize, Debug)]
pub struct UserResponse {
    pub status: &'static str,
    pub data: UserData,
}

type SessionReply = (StatusCode, CookieJar, Json<SessionResponse>);

fn send_session(state: &ServerState, jar: CookieJar, status: StatusCode, session: AuthSession) -> SessionReply {
    let jar = jar.add(state.cookie.session_cookie(session.token.clone()));
    let body = SessionResponse { status: "success", token: session.token, data: UserData { user: session.user } };
    (status, jar, Json(body))
}

#[utoipa::path(post, path = "/api/v1/users/signup", tag = "auth", request_body = crate::openapi::SignupRequest, responses((status = 201, description = "Signed up"), (status = 400, description = "Validation failed")))]
pub async fn signup(
    State(state): State<ServerState>,
    jar: CookieJar,
    WithRejection(Json(input), _): WithRejection<Json<SignupInput>, ApiError>,
) -> Result<SessionReply, ApiError> {
    let session = state.auth.signup(input).await?;
    Ok(send_session(&state, jar, StatusCode::CREATED, session))
}

#[utoipa::path(post, path = "/api/v1/users/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in"), (status = 400, description = "Missing email or password"), (status = 401, description = "Incorrect email or password")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    WithRejection(Json(input), _): WithRejection<Json<LoginInput>, ApiError>,
) -> Result<SessionReply, ApiError> {
    let session = state.auth.login(input).await?;
    Ok(send_session(&state, jar, StatusCode::OK, session))
}

/// Overwrite the session cookie with a short-lived placeholder.
#[utoipa::path(get, path = "/api/v1/users/logout", tag = "auth", responses((status = 200, description = "Logged out")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let mut cookie = Cookie::new(JWT_COOKIE, LOGGED_OUT);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_expires(OffsetDateTime::now_utc() + time::Duration::seconds(10));
    (jar.add(cookie), Json(serde_json::json!({ "status": "success" })))
}

/// `<proto>://<host>/api/v1/users/resetPassword`, honouring `X-Forwarded-Proto`.
fn reset_url_base(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    format!("{proto}://{host}/api/v1/users/resetPassword")
}

#[utoipa::path(post, path = "/api/v1/users/forgotPassword", tag = "auth", request_body = crate::openapi::ForgotPasswordRequest, responses((status = 200, description = "Token sent"), (status = 404, description = "Unknown email"), (status = 500, description = "Email could not be sent")))]
pub async fn forgot_password(
    State(state): State<ServerState>,
    headers: HeaderMap,
    WithRejection(Json(input), _): WithRejection<Json<ForgotPasswordInput>, ApiError>,
) -> Result<Json<StatusMessage>, ApiError> {
    state.auth.forgot_password(&input.email, &reset_url_base(&headers)).await?;
    Ok(Json(StatusMessage::success("Token sent to email!")))
}

#[utoipa::path(patch, path = "/api/v1/users/resetPassword/{token}", tag = "auth", request_body = crate::openapi::ResetPasswordRequest, params(("token" = String, Path, description = "Raw reset token from the email")), responses((status = 200, description = "Password reset"), (status = 400, description = "Token is invalid or has expired")))]
pub async fn reset_password(
    State(state): State<ServerState>,
    jar: CookieJar,
    Path(token): Path<String>,
    WithRejection(Json(input), _): WithRejection<Json<ResetPasswordInput>, ApiError>,
) -> Result<SessionReply, ApiError> {
    let session = state.auth.reset_password(&token, input).await?;
    Ok(send_session(&state, jar, StatusCode::OK, session))
}

#[utoipa::path(patch, path = "/api/v1/users/updateMyPassword", tag = "auth", request_body = crate::openapi::UpdatePasswordRequest, responses((status = 200, description = "Password changed"), (status = 401, description = "Not logged in or wrong current password")))]
pub async fn update_my_password(
    State(state): State<ServerState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    jar: CookieJar,
    WithRejection(Json(input), _): WithRejection<Json<UpdatePasswordInput>, ApiError>,
) -> Result<SessionReply, ApiError> {
    let session = state.auth.update_password(user.id, input).await?;
    Ok(send_session(&state, jar, StatusCode::OK, session))
}

#[utoipa::path(get, path = "/api/v1/users/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Not logged in")))]
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse { status: "success", data: UserData { user } })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_secure_only_in_production() {
        let dev = CookieSettings { expires_in_days: 90, secure: false };
        let c = dev.session_cookie("tok".into());
        assert_eq!(c.name(), JWT_COOKIE);
        assert_eq!(c.http_only(), Some(true));
        assert_ne!(c.secure(), Some(true));

        let settings = configs::AuthSettings { environment: "production".into(), ..Default::default() };
        let prod = CookieSettings::from_settings(&settings);
        assert_eq!(prod.session_cookie("tok".into()).secure(), Some(true));
    }

    #[test]
    fn reset_url_uses_host_and_forwarded_proto() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "tours.example.com".parse().unwrap());
        assert_eq!(reset_url_base(&headers), "http://tours.example.com/api/v1/users/resetPassword");
        headers.insert("x-forwarded-proto", "https".parse().unwrap());
        assert_eq!(reset_url_base(&headers), "https://tours.example.com/api/v1/users/resetPassword");
    }
}
