use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub review: String,
    pub rating: Option<f32>,
    pub tour: Uuid,
    pub user: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<models::review::Model> for Review {
    fn from(m: models::review::Model) -> Self {
        Self {
            id: m.id,
            review: m.review,
            rating: m.rating,
            tour: m.tour_id,
            user: m.user_id,
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

/// Request body for creating a review. `tour` and `user` may be left out
/// and are then taken from the route and the session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateReviewInput {
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub tour: Option<Uuid>,
    #[serde(default)]
    pub user: Option<Uuid>,
}

/// Fully resolved review ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub tour_id: Uuid,
    pub user_id: Uuid,
    pub review: String,
    pub rating: Option<f32>,
}
