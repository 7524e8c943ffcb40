use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use uuid::Uuid;

use service::reviews::domain::{CreateReviewInput, Review};

use super::auth::ServerState;
use super::middleware::CurrentUser;
use crate::errors::ApiError;

#[derive(Serialize, Debug)]
pub struct ReviewList {
    pub reviews: Vec<Review>,
}

#[derive(Serialize, Debug)]
pub struct ReviewOne {
    pub review: Review,
}

#[derive(Serialize, Debug)]
pub struct DataResponse<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    pub data: T,
}

async fn list(state: &ServerState, tour_id: Option<Uuid>) -> Result<Json<DataResponse<ReviewList>>, ApiError> {
    let reviews = state.reviews.get_all_reviews(tour_id).await?;
    Ok(Json(DataResponse { status: "success", results: Some(reviews.len()), data: ReviewList { reviews } }))
}

async fn create(
    state: &ServerState,
    input: CreateReviewInput,
    tour_id: Option<Uuid>,
    user: Uuid,
) -> Result<(StatusCode, Json<DataResponse<ReviewOne>>), ApiError> {
    let review = state.reviews.create_review(input, tour_id, user).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { status: "success", results: None, data: ReviewOne { review } })))
}

#[utoipa::path(get, path = "/api/v1/reviews", tag = "reviews", responses((status = 200, description = "All reviews"), (status = 401, description = "Not logged in")))]
pub async fn get_all_reviews(State(state): State<ServerState>) -> Result<Json<DataResponse<ReviewList>>, ApiError> {
    list(&state, None).await
}

#[utoipa::path(get, path = "/api/v1/tours/{tour_id}/reviews", tag = "reviews", params(("tour_id" = Uuid, Path, description = "Tour id")), responses((status = 200, description = "Reviews of one tour")))]
pub async fn get_tour_reviews(
    State(state): State<ServerState>,
    Path(tour_id): Path<Uuid>,
) -> Result<Json<DataResponse<ReviewList>>, ApiError> {
    list(&state, Some(tour_id)).await
}

#[utoipa::path(post, path = "/api/v1/reviews", tag = "reviews", request_body = crate::openapi::CreateReviewRequest, responses((status = 201, description = "Review created"), (status = 400, description = "Validation failed"), (status = 403, description = "Role not allowed")))]
pub async fn create_review(
    State(state): State<ServerState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    WithRejection(Json(input), _): WithRejection<Json<CreateReviewInput>, ApiError>,
) -> Result<(StatusCode, Json<DataResponse<ReviewOne>>), ApiError> {
    create(&state, input, None, user.id).await
}

#[utoipa::path(post, path = "/api/v1/tours/{tour_id}/reviews", tag = "reviews", request_body = crate::openapi::CreateReviewRequest, params(("tour_id" = Uuid, Path, description = "Tour id")), responses((status = 201, description = "Review created"), (status = 403, description = "Role not allowed")))]
pub async fn create_tour_review(
    State(state): State<ServerState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(tour_id): Path<Uuid>,
    WithRejection(Json(input), _): WithRejection<Json<CreateReviewInput>, ApiError>,
) -> Result<(StatusCode, Json<DataResponse<ReviewOne>>), ApiError> {
    create(&state, input, Some(tour_id), user.id).await
}

#[utoipa::path(delete, path = "/api/v1/reviews/{id}", tag = "reviews", params(("id" = Uuid, Path, description = "Review id")), responses((status = 204, description = "Deleted"), (status = 404, description = "No review with that id")))]
pub async fn delete_review(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    state.reviews.delete_review(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
