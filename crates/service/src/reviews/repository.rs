use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{NewReview, Review};
use crate::errors::ServiceError;

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create(&self, review: NewReview) -> Result<Review, ServiceError>;
    /// Newest first; only one tour's reviews when `tour_id` is set.
    async fn list(&self, tour_id: Option<Uuid>) -> Result<Vec<Review>, ServiceError>;
    /// `false` when no review had that id.
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError>;
}

/// Simple in-memory mock repository for tests
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockReviewRepository {
        reviews: Mutex<Vec<Review>>,
    }

    impl MockReviewRepository {
        pub fn all(&self) -> Vec<Review> {
            self.reviews.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReviewRepository for MockReviewRepository {
        async fn create(&self, r: NewReview) -> Result<Review, ServiceError> {
            models::review::validate_review(&r.review)?;
            models::review::validate_rating(r.rating)?;
            let mut reviews = self.reviews.lock().unwrap();
            if reviews.iter().any(|x| x.tour == r.tour_id && x.user == r.user_id) {
                return Err(models::errors::ModelError::Duplicate("tour, user".into()).into());
            }
            let review = Review {
                id: Uuid::new_v4(),
                review: r.review.trim().to_string(),
                rating: r.rating,
                tour: r.tour_id,
                user: r.user_id,
                created_at: Utc::now(),
            };
            reviews.push(review.clone());
            Ok(review)
        }

        async fn list(&self, tour_id: Option<Uuid>) -> Result<Vec<Review>, ServiceError> {
            let reviews = self.reviews.lock().unwrap();
            Ok(reviews
                .iter()
                .rev()
                .filter(|r| tour_id.map_or(true, |t| r.tour == t))
                .cloned()
                .collect())
        }

        async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
            let mut reviews = self.reviews.lock().unwrap();
            let before = reviews.len();
            reviews.retain(|r| r.id != id);
            Ok(reviews.len() != before)
        }
    }
}
