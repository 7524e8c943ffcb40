use axum::{
    extract::Request,
    middleware::{from_fn, from_fn_with_state, Next},
    routing::{delete, get, patch, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

pub mod auth;
pub mod middleware;
pub mod reviews;

use self::auth::ServerState;
use self::middleware::{protect, restrict_to, REVIEW_AUTHORS, REVIEW_MODERATORS};
use crate::openapi::ApiDoc;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: public auth endpoints, protected user
/// endpoints and the review resource.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let authors = from_fn(|req: Request, next: Next| restrict_to(REVIEW_AUTHORS, req, next));
    let moderators = from_fn(|req: Request, next: Next| restrict_to(REVIEW_MODERATORS, req, next));
    let require_login = || from_fn_with_state(state.clone(), protect);

    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/api/v1/users/signup", post(auth::signup))
        .route("/api/v1/users/login", post(auth::login))
        .route("/api/v1/users/logout", get(auth::logout))
        .route("/api/v1/users/forgotPassword", post(auth::forgot_password))
        .route("/api/v1/users/resetPassword/:token", patch(auth::reset_password));

    let users = Router::new()
        .route("/api/v1/users/updateMyPassword", patch(auth::update_my_password))
        .route("/api/v1/users/me", get(auth::me))
        .route_layer(require_login());

    let review_routes = Router::new()
        .route(
            "/api/v1/reviews",
            get(reviews::get_all_reviews).merge(post(reviews::create_review).route_layer(authors.clone())),
        )
        .route(
            "/api/v1/tours/:tour_id/reviews",
            get(reviews::get_tour_reviews).merge(post(reviews::create_tour_review).route_layer(authors)),
        )
        .route(
            "/api/v1/reviews/:id",
            delete(reviews::delete_review).route_layer(moderators),
        )
        .route_layer(require_login());

    public
        .merge(users)
        .merge(review_routes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one span per request with method and path
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // status code and latency
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
