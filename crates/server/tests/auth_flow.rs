use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::Service;
use uuid::Uuid;

use server::routes::{self, auth::{CookieSettings, ServerState}};
use service::auth::{
    domain::Role,
    notifier::mock::MockNotifier,
    repository::mock::MockUserStore,
    service::AuthConfig,
    token::TokenIssuer,
};
use service::reviews::repository::mock::MockReviewRepository;

const SECRET: &str = "router-test-secret-router-test-secret";

struct TestApp {
    router: Router,
    users: Arc<MockUserStore>,
    notifier: Arc<MockNotifier>,
}

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

fn build_app() -> TestApp {
    let users = Arc::new(MockUserStore::default());
    let notifier = Arc::new(MockNotifier::default());
    let cfg = AuthConfig {
        jwt_secret: SECRET.into(),
        jwt_expires_in: Duration::from_secs(3600),
        reset_token_ttl: Duration::from_secs(600),
    };
    let state = ServerState::new(
        users.clone(),
        notifier.clone(),
        Arc::new(MockReviewRepository::default()),
        cfg,
        CookieSettings { expires_in_days: 90, secure: false },
    );
    TestApp { router: routes::build_router(state, cors()), users, notifier }
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn send(app: &TestApp, method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> anyhow::Result<Reply> {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, "tours.test");
    if let Some(token) = auth {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(b) => req.header("content-type", "application/json").body(Body::from(serde_json::to_vec(&b)?))?,
        None => req.body(Body::empty())?,
    };
    let resp = app.router.clone().call(req).await?;
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok(Reply { status, headers, body })
}

fn signup_body(email: &str) -> Value {
    json!({"name": "Tester", "email": email, "password": "pass1234", "passwordConfirm": "pass1234"})
}

async fn signup(app: &TestApp, email: &str) -> anyhow::Result<(Uuid, String)> {
    let r = send(app, "POST", "/api/v1/users/signup", None, Some(signup_body(email))).await?;
    assert_eq!(r.status, StatusCode::CREATED);
    let id: Uuid = r.body["data"]["user"]["id"].as_str().unwrap_or_default().parse()?;
    let token = r.body["token"].as_str().unwrap_or_default().to_string();
    Ok((id, token))
}

fn promote(app: &TestApp, id: Uuid, role: Role) {
    let mut user = app.users.get(id).expect("user exists");
    user.role = role;
    app.users.insert_raw(user);
}

fn raw_reset_token(app: &TestApp) -> String {
    let body = app.notifier.last().expect("reset email").body;
    let url = body.split("to: ").nth(1).unwrap_or_default();
    let url = url.split(".\n").next().unwrap_or_default();
    url.rsplit('/').next().unwrap_or_default().to_string()
}

#[tokio::test]
async fn signup_sets_cookie_and_never_returns_password() -> anyhow::Result<()> {
    let app = build_app();
    let r = send(&app, "POST", "/api/v1/users/signup", None, Some(signup_body("New@Example.com"))).await?;
    assert_eq!(r.status, StatusCode::CREATED);
    assert_eq!(r.body["status"], "success");
    assert!(r.body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(r.body["data"]["user"]["email"], "new@example.com");
    assert_eq!(r.body["data"]["user"]["role"], "user");
    assert!(!r.body.to_string().to_lowercase().contains("password"));

    let cookie = r.headers.get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default();
    assert!(cookie.starts_with("jwt="));
    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie.contains("Secure"));
    Ok(())
}

#[tokio::test]
async fn signup_rejects_duplicates_and_mismatched_confirm() -> anyhow::Result<()> {
    let app = build_app();
    signup(&app, "dup@example.com").await?;
    let dup = send(&app, "POST", "/api/v1/users/signup", None, Some(signup_body("dup@example.com"))).await?;
    assert_eq!(dup.status, StatusCode::BAD_REQUEST);
    assert_eq!(dup.body["status"], "fail");

    let body = json!({"name": "T", "email": "x@example.com", "password": "pass1234", "passwordConfirm": "pass9999"});
    let mismatch = send(&app, "POST", "/api/v1/users/signup", None, Some(body)).await?;
    assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);
    assert_eq!(mismatch.body["message"], "Passwords are not the same!");
    Ok(())
}

#[tokio::test]
async fn login_failures_are_indistinguishable() -> anyhow::Result<()> {
    let app = build_app();
    signup(&app, "known@example.com").await?;

    let wrong = send(&app, "POST", "/api/v1/users/login", None, Some(json!({"email": "known@example.com", "password": "nope12345"}))).await?;
    let unknown = send(&app, "POST", "/api/v1/users/login", None, Some(json!({"email": "ghost@example.com", "password": "pass1234"}))).await?;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status, unknown.status);
    assert_eq!(wrong.body, unknown.body);
    assert_eq!(wrong.body["message"], "Incorrect email or password");

    let missing = send(&app, "POST", "/api/v1/users/login", None, Some(json!({"email": "known@example.com"}))).await?;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["message"], "Please provide email and password!");

    let ok = send(&app, "POST", "/api/v1/users/login", None, Some(json!({"email": "known@example.com", "password": "pass1234"}))).await?;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.headers.get(header::SET_COOKIE).is_some());
    Ok(())
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() -> anyhow::Result<()> {
    let app = build_app();
    let none = send(&app, "GET", "/api/v1/users/me", None, None).await?;
    assert_eq!(none.status, StatusCode::UNAUTHORIZED);
    assert_eq!(none.body["message"], "You are not logged in! Please log in to get access.");

    let bad = send(&app, "GET", "/api/v1/users/me", Some("not-a-token"), None).await?;
    assert_eq!(bad.status, StatusCode::UNAUTHORIZED);
    assert_eq!(bad.body["message"], "Invalid token. Please log in again!");

    let (id, token) = signup(&app, "me@example.com").await?;
    let me = send(&app, "GET", "/api/v1/users/me", Some(&token), None).await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["user"]["id"], id.to_string());

    // cookie works as a fallback
    let req = Request::builder()
        .uri("/api/v1/users/me")
        .header(header::COOKIE, format!("jwt={token}"))
        .body(Body::empty())?;
    let resp = app.router.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn logout_overwrites_cookie() -> anyhow::Result<()> {
    let app = build_app();
    let r = send(&app, "GET", "/api/v1/users/logout", None, None).await?;
    assert_eq!(r.status, StatusCode::OK);
    let cookie = r.headers.get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default();
    assert!(cookie.starts_with("jwt=loggedout"));

    let req = Request::builder()
        .uri("/api/v1/users/me")
        .header(header::COOKIE, "jwt=loggedout")
        .body(Body::empty())?;
    let resp = app.router.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn old_token_fails_after_password_change() -> anyhow::Result<()> {
    let app = build_app();
    let (id, _) = signup(&app, "change@example.com").await?;
    // signed a minute ago so the change lands strictly after it
    let old = TokenIssuer::new(SECRET, Duration::from_secs(3600)).issue_at(id, chrono::Utc::now() - chrono::Duration::seconds(60))?;
    assert_eq!(send(&app, "GET", "/api/v1/users/me", Some(&old), None).await?.status, StatusCode::OK);

    let wrong = json!({"passwordCurrent": "wrong-pass", "password": "newpass123", "passwordConfirm": "newpass123"});
    let r = send(&app, "PATCH", "/api/v1/users/updateMyPassword", Some(&old), Some(wrong)).await?;
    assert_eq!(r.status, StatusCode::UNAUTHORIZED);
    assert_eq!(r.body["message"], "Your current password is wrong.");

    let body = json!({"passwordCurrent": "pass1234", "password": "newpass123", "passwordConfirm": "newpass123"});
    let r = send(&app, "PATCH", "/api/v1/users/updateMyPassword", Some(&old), Some(body)).await?;
    assert_eq!(r.status, StatusCode::OK);
    let fresh = r.body["token"].as_str().unwrap_or_default().to_string();

    let stale = send(&app, "GET", "/api/v1/users/me", Some(&old), None).await?;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);
    assert_eq!(stale.body["message"], "User recently changed password! Please log in again.");
    assert_eq!(send(&app, "GET", "/api/v1/users/me", Some(&fresh), None).await?.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn forgot_and_reset_password_flow() -> anyhow::Result<()> {
    let app = build_app();
    signup(&app, "reset@example.com").await?;

    let unknown = send(&app, "POST", "/api/v1/users/forgotPassword", None, Some(json!({"email": "ghost@example.com"}))).await?;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body["message"], "There is no user with email address.");

    let r = send(&app, "POST", "/api/v1/users/forgotPassword", None, Some(json!({"email": "reset@example.com"}))).await?;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body, json!({"status": "success", "message": "Token sent to email!"}));
    let mail = app.notifier.last().expect("mail");
    assert!(mail.body.contains("http://tours.test/api/v1/users/resetPassword/"));

    let raw = raw_reset_token(&app);
    let body = json!({"password": "resetpass1", "passwordConfirm": "resetpass1"});
    let ok = send(&app, "PATCH", &format!("/api/v1/users/resetPassword/{raw}"), None, Some(body.clone())).await?;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.headers.get(header::SET_COOKIE).is_some());

    let reused = send(&app, "PATCH", &format!("/api/v1/users/resetPassword/{raw}"), None, Some(body)).await?;
    assert_eq!(reused.status, StatusCode::BAD_REQUEST);
    assert_eq!(reused.body["message"], "Token is invalid or has expired");

    let login = send(&app, "POST", "/api/v1/users/login", None, Some(json!({"email": "reset@example.com", "password": "resetpass1"}))).await?;
    assert_eq!(login.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn failed_email_returns_500_and_clears_token() -> anyhow::Result<()> {
    let app = build_app();
    let (id, _) = signup(&app, "mailfail@example.com").await?;
    app.notifier.set_failing(true);
    let r = send(&app, "POST", "/api/v1/users/forgotPassword", None, Some(json!({"email": "mailfail@example.com"}))).await?;
    assert_eq!(r.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(r.body["status"], "error");
    assert_eq!(r.body["message"], "There was an error sending the email. Try again later!");
    assert!(app.users.get(id).is_some_and(|u| u.reset.is_none()));
    Ok(())
}

#[tokio::test]
async fn review_routes_apply_role_gates_and_defaults() -> anyhow::Result<()> {
    let app = build_app();
    let (user_id, user_token) = signup(&app, "reviewer@example.com").await?;
    let (admin_id, admin_token) = signup(&app, "admin@example.com").await?;
    promote(&app, admin_id, Role::Admin);

    let tour = Uuid::new_v4();
    let uri = format!("/api/v1/tours/{tour}/reviews");
    let body = json!({"review": "Wonderful guides", "rating": 5});

    assert_eq!(send(&app, "GET", &uri, None, None).await?.status, StatusCode::UNAUTHORIZED);

    let created = send(&app, "POST", &uri, Some(&user_token), Some(body.clone())).await?;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["data"]["review"]["tour"], tour.to_string());
    assert_eq!(created.body["data"]["review"]["user"], user_id.to_string());
    let review_id = created.body["data"]["review"]["id"].as_str().unwrap_or_default().to_string();

    let forbidden = send(&app, "POST", &uri, Some(&admin_token), Some(body)).await?;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(forbidden.body["message"], "You do not have permission to perform this action");

    let no_tour = send(&app, "POST", "/api/v1/reviews", Some(&user_token), Some(json!({"review": "x"}))).await?;
    assert_eq!(no_tour.status, StatusCode::BAD_REQUEST);

    let listed = send(&app, "GET", &uri, Some(&admin_token), None).await?;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["results"], 1);
    let all = send(&app, "GET", "/api/v1/reviews", Some(&user_token), None).await?;
    assert_eq!(all.body["data"]["reviews"].as_array().map(Vec::len), Some(1));

    let del = send(&app, "DELETE", &format!("/api/v1/reviews/{review_id}"), Some(&admin_token), None).await?;
    assert_eq!(del.status, StatusCode::NO_CONTENT);
    let again = send(&app, "DELETE", &format!("/api/v1/reviews/{review_id}"), Some(&admin_token), None).await?;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let (guide_id, guide_token) = signup(&app, "guide@example.com").await?;
    promote(&app, guide_id, Role::Guide);
    let guide_del = send(&app, "DELETE", &format!("/api/v1/reviews/{}", Uuid::new_v4()), Some(&guide_token), None).await?;
    assert_eq!(guide_del.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn health_and_openapi_are_public() -> anyhow::Result<()> {
    let app = build_app();
    let health = send(&app, "GET", "/health", None, None).await?;
    assert_eq!(health.body, json!({"status": "ok"}));
    let doc = send(&app, "GET", "/api-docs/openapi.json", None, None).await?;
    assert_eq!(doc.status, StatusCode::OK);
    assert!(doc.body["paths"]["/api/v1/users/signup"].is_object());
    Ok(())
}
