use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{CreateReviewInput, NewReview, Review};
use super::repository::ReviewRepository;
use crate::errors::ServiceError;

pub struct ReviewService<R: ReviewRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: ReviewRepository + ?Sized> ReviewService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn get_all_reviews(&self, tour_id: Option<Uuid>) -> Result<Vec<Review>, ServiceError> {
        self.repo.list(tour_id).await
    }

    /// Persist a review, taking `tour` from the route and `user` from the
    /// session when the body leaves them out.
    #[instrument(skip(self, input))]
    pub async fn create_review(
        &self,
        input: CreateReviewInput,
        tour_id: Option<Uuid>,
        user_id: Uuid,
    ) -> Result<Review, ServiceError> {
        let tour_id = input
            .tour
            .or(tour_id)
            .ok_or_else(|| ServiceError::Validation("Review must belong to a tour.".into()))?;
        let new = NewReview {
            tour_id,
            user_id: input.user.unwrap_or(user_id),
            review: input.review,
            rating: input.rating,
        };
        models::review::validate_review(&new.review)?;
        models::review::validate_rating(new.rating)?;

        let review = self.repo.create(new).await?;
        info!(review_id = %review.id, tour_id = %review.tour, user_id = %review.user, "review_created");
        Ok(review)
    }

    #[instrument(skip(self))]
    pub async fn delete_review(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("document"));
        }
        info!(review_id = %id, "review_deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviews::repository::mock::MockReviewRepository;

    fn svc() -> (ReviewService<MockReviewRepository>, Arc<MockReviewRepository>) {
        let repo = Arc::new(MockReviewRepository::default());
        (ReviewService::new(repo.clone()), repo)
    }

    fn body(text: &str, rating: Option<f32>) -> CreateReviewInput {
        CreateReviewInput { review: text.into(), rating, ..Default::default() }
    }

    #[tokio::test]
    async fn create_fills_tour_and_user_from_context() {
        let (svc, repo) = svc();
        let (tour, user) = (Uuid::new_v4(), Uuid::new_v4());
        let r = svc.create_review(body("Amazing tour", Some(5.0)), Some(tour), user).await.unwrap();
        assert_eq!(r.tour, tour);
        assert_eq!(r.user, user);
        let stored = repo.all();
        assert_eq!(stored.len(), 1);
        assert_eq!((stored[0].tour, stored[0].user), (tour, user));
    }

    #[tokio::test]
    async fn body_values_win_over_context() {
        let (svc, _) = svc();
        let (tour, other_tour, user) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let input = CreateReviewInput { tour: Some(other_tour), ..body("ok", None) };
        let r = svc.create_review(input, Some(tour), user).await.unwrap();
        assert_eq!(r.tour, other_tour);
    }

    #[tokio::test]
    async fn create_validates_input() {
        let (svc, repo) = svc();
        let user = Uuid::new_v4();
        let no_tour = svc.create_review(body("fine", None), None, user).await.unwrap_err();
        assert_eq!(no_tour.status_code(), 400);
        assert!(svc.create_review(body("   ", None), Some(Uuid::new_v4()), user).await.is_err());
        assert!(svc.create_review(body("fine", Some(6.0)), Some(Uuid::new_v4()), user).await.is_err());
        assert!(svc.create_review(body("fine", Some(0.5)), Some(Uuid::new_v4()), user).await.is_err());
        assert!(repo.all().is_empty());
    }

    #[tokio::test]
    async fn one_review_per_tour_and_user() {
        let (svc, _) = svc();
        let (tour, user) = (Uuid::new_v4(), Uuid::new_v4());
        svc.create_review(body("first", Some(4.0)), Some(tour), user).await.unwrap();
        let err = svc.create_review(body("second", Some(3.0)), Some(tour), user).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn list_filters_by_tour() {
        let (svc, _) = svc();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        svc.create_review(body("a1", None), Some(a), Uuid::new_v4()).await.unwrap();
        svc.create_review(body("a2", None), Some(a), Uuid::new_v4()).await.unwrap();
        svc.create_review(body("b1", None), Some(b), Uuid::new_v4()).await.unwrap();
        assert_eq!(svc.get_all_reviews(None).await.unwrap().len(), 3);
        let only_a = svc.get_all_reviews(Some(a)).await.unwrap();
        assert_eq!(only_a.len(), 2);
        assert!(only_a.iter().all(|r| r.tour == a));
    }

    #[tokio::test]
    async fn delete_missing_review_is_not_found() {
        let (svc, _) = svc();
        let r = svc.create_review(body("bye", None), Some(Uuid::new_v4()), Uuid::new_v4()).await.unwrap();
        svc.delete_review(r.id).await.unwrap();
        let err = svc.delete_review(r.id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "No document found with that ID");
    }
}
