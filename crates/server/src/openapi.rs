use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct SignupRequest { pub name: String, pub email: String, pub password: String, pub password_confirm: String, pub photo: Option<String> }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct ForgotPasswordRequest { pub email: String }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct ResetPasswordRequest { pub password: String, pub password_confirm: String }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct UpdatePasswordRequest { pub password_current: String, pub password: String, pub password_confirm: String }

#[derive(ToSchema)]
pub struct CreateReviewRequest {
    pub review: String,
    pub rating: Option<f32>,
    pub tour: Option<Uuid>,
    pub user: Option<Uuid>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::signup,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::forgot_password,
        crate::routes::auth::reset_password,
        crate::routes::auth::update_my_password,
        crate::routes::auth::me,
        crate::routes::reviews::get_all_reviews,
        crate::routes::reviews::get_tour_reviews,
        crate::routes::reviews::create_review,
        crate::routes::reviews::create_tour_review,
        crate::routes::reviews::delete_review,
    ),
    components(
        schemas(
            HealthResponse,
            SignupRequest,
            LoginRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            UpdatePasswordRequest,
            CreateReviewRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "reviews")
    )
)]
pub struct ApiDoc;
