use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use super::domain::{NewReview, Review};
use super::repository::ReviewRepository;
use crate::errors::ServiceError;

pub struct SeaOrmReviewRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmReviewRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewRepository for SeaOrmReviewRepository {
    async fn create(&self, r: NewReview) -> Result<Review, ServiceError> {
        let m = models::review::create(&self.db, r.tour_id, r.user_id, &r.review, r.rating).await?;
        Ok(m.into())
    }

    async fn list(&self, tour_id: Option<Uuid>) -> Result<Vec<Review>, ServiceError> {
        let rows = models::review::list(&self.db, tour_id).await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(models::review::delete(&self.db, id).await?)
    }
}
