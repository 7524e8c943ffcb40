use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::domain::{
    AuthSession, AuthUser, LoginInput, ResetPasswordInput, Role, SignupInput, StoredUser, UpdatePasswordInput,
};
use super::errors::AuthError;
use super::notifier::{Email, Notifier};
use super::repository::UserStore;
use super::reset::{hash_reset_token, ResetGuard};
use super::token::TokenIssuer;

pub const NOT_LOGGED_IN: &str = "You are not logged in! Please log in to get access.";
pub const USER_GONE: &str = "The user belonging to this token does no longer exist.";
pub const PASSWORD_CHANGED: &str = "User recently changed password! Please log in again.";
pub const FORBIDDEN: &str = "You do not have permission to perform this action";
pub const BAD_CREDENTIALS: &str = "Incorrect email or password";

/// `Forbidden` unless the user's role is one of `roles`.
pub fn restrict_to(user: &AuthUser, roles: &[Role]) -> Result<(), AuthError> {
    if roles.contains(&user.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden(FORBIDDEN.into()))
    }
}

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expires_in: Duration,
    pub reset_token_ttl: Duration,
}

impl AuthConfig {
    pub fn from_settings(s: &configs::AuthSettings) -> anyhow::Result<Self> {
        Ok(Self {
            jwt_secret: s.jwt_secret.clone(),
            jwt_expires_in: s.jwt_expiry()?,
            reset_token_ttl: s.password_reset_ttl(),
        })
    }
}

/// Auth business service independent of web framework
pub struct AuthService<S: UserStore + ?Sized, N: Notifier + ?Sized> {
    store: Arc<S>,
    notifier: Arc<N>,
    tokens: TokenIssuer,
    clock: Arc<dyn Clock>,
    cfg: AuthConfig,
}

impl<S: UserStore + ?Sized, N: Notifier + ?Sized> AuthService<S, N> {
    pub fn new(store: Arc<S>, notifier: Arc<N>, cfg: AuthConfig) -> Self {
        Self {
            store,
            notifier,
            tokens: TokenIssuer::new(&cfg.jwt_secret, cfg.jwt_expires_in),
            clock: Arc::new(SystemClock),
            cfg,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        self.tokens.issue_at(user_id, self.clock.now())
    }

    fn session(&self, user: &StoredUser) -> Result<AuthSession, AuthError> {
        Ok(AuthSession { user: user.to_public(), token: self.issue_token(user.id)? })
    }

    /// Create a `user`-role account and log it in.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockUserStore, notifier::mock::MockNotifier};
    /// use service::auth::domain::SignupInput;
    /// use std::{sync::Arc, time::Duration};
    /// let cfg = AuthConfig { jwt_secret: "doc-secret-doc-secret-doc-secret-00".into(), jwt_expires_in: Duration::from_secs(3600), reset_token_ttl: Duration::from_secs(600) };
    /// let svc = AuthService::new(Arc::new(MockUserStore::default()), Arc::new(MockNotifier::default()), cfg);
    /// let input = SignupInput { name: "Test".into(), email: "User@Example.com".into(), password: "Secret123".into(), password_confirm: "Secret123".into(), photo: None };
    /// let session = tokio_test::block_on(svc.signup(input)).unwrap();
    /// assert_eq!(session.user.email, "user@example.com");
    /// assert!(!session.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn signup(&self, input: SignupInput) -> Result<AuthSession, AuthError> {
        let user = StoredUser::new(&input, self.clock.now())?;
        let user = self.store.create(user).await?;
        info!(user_id = %user.id, email = %user.email, "user_registered");
        self.session(&user)
    }

    /// Check credentials and issue a token.
    ///
    /// Unknown email and wrong password produce the same error.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockUserStore, notifier::mock::MockNotifier};
    /// use service::auth::domain::{SignupInput, LoginInput};
    /// use std::{sync::Arc, time::Duration};
    /// let cfg = AuthConfig { jwt_secret: "doc-secret-doc-secret-doc-secret-00".into(), jwt_expires_in: Duration::from_secs(3600), reset_token_ttl: Duration::from_secs(600) };
    /// let svc = AuthService::new(Arc::new(MockUserStore::default()), Arc::new(MockNotifier::default()), cfg);
    /// let _ = tokio_test::block_on(svc.signup(SignupInput { name: "N".into(), email: "u@e.com".into(), password: "Passw0rd".into(), password_confirm: "Passw0rd".into(), photo: None }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::bad_request("Please provide email and password!"));
        }
        let user = match self.store.find_by_email(&input.email).await? {
            Some(u) if u.correct_password(&input.password) => u,
            Some(_) => {
                debug!("password mismatch");
                return Err(AuthError::unauthorized(BAD_CREDENTIALS));
            }
            None => {
                debug!("no such user");
                return Err(AuthError::unauthorized(BAD_CREDENTIALS));
            }
        };
        info!(user_id = %user.id, "user_logged_in");
        self.session(&user)
    }

    /// Resolve a session token to its live user.
    #[instrument(skip_all)]
    pub async fn protect(&self, token: Option<&str>) -> Result<StoredUser, AuthError> {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AuthError::unauthorized(NOT_LOGGED_IN)),
        };
        let claims = self.tokens.verify(token)?;
        let user = self
            .store
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or_else(|| AuthError::unauthorized(USER_GONE))?;
        if user.changed_password_after(claims.iat) {
            warn!(user_id = %user.id, iat = claims.iat, "token predates password change");
            return Err(AuthError::unauthorized(PASSWORD_CHANGED));
        }
        Ok(user)
    }

    pub fn restrict_to(&self, user: &AuthUser, roles: &[Role]) -> Result<(), AuthError> {
        restrict_to(user, roles)
    }

    /// Store a reset token and mail the link `<reset_url_base>/<raw token>`.
    #[instrument(skip(self, reset_url_base))]
    pub async fn forgot_password(&self, email: &str, reset_url_base: &str) -> Result<(), AuthError> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or_else(|| AuthError::NotFound("There is no user with email address.".into()))?;

        let ttl = chrono::Duration::from_std(self.cfg.reset_token_ttl)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let guard = ResetGuard::arm(self.store.as_ref(), user, self.clock.now(), ttl).await?;

        let reset_url = format!("{}/{}", reset_url_base.trim_end_matches('/'), guard.raw_token());
        let mail = Email {
            to: guard.user().email.clone(),
            subject: format!("Your password reset token (valid for {} minutes)", ttl.num_minutes()),
            body: format!(
                "Forgot your password? Submit a PATCH request with your new password and passwordConfirm to: {reset_url}.\nIf you didn't forget your password, please ignore this email!"
            ),
        };
        guard.notify_or_rollback(self.notifier.as_ref(), mail).await
    }

    /// Consume a raw reset token and set a new password.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, raw_token: &str, input: ResetPasswordInput) -> Result<AuthSession, AuthError> {
        let now = self.clock.now();
        let mut user = self
            .store
            .find_by_reset_token(&hash_reset_token(raw_token), now)
            .await?
            .ok_or_else(|| AuthError::bad_request("Token is invalid or has expired"))?;

        user.set_password(&input.password, &input.password_confirm, now)?;
        user.clear_password_reset();
        self.store.save(&user).await?;
        info!(user_id = %user.id, "password_reset");
        self.session(&user)
    }

    /// Change the password of a logged-in user after re-checking the current one.
    #[instrument(skip(self, input))]
    pub async fn update_password(&self, user_id: Uuid, input: UpdatePasswordInput) -> Result<AuthSession, AuthError> {
        let mut user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::unauthorized(USER_GONE))?;
        if !user.correct_password(&input.password_current) {
            return Err(AuthError::unauthorized("Your current password is wrong."));
        }
        user.set_password(&input.password, &input.password_confirm, self.clock.now())?;
        self.store.save(&user).await?;
        info!(user_id = %user.id, "password_updated");
        self.session(&user)
    }
}
