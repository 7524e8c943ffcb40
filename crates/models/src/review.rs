use sea_orm::{entity::prelude::*, Set, DatabaseConnection, QueryFilter, QueryOrder};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub review: String,
    pub rating: Option<f32>,
    pub tour_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_review(text: &str) -> Result<(), errors::ModelError> {
    if text.trim().is_empty() {
        return Err(errors::ModelError::Validation("Review can not be empty!".into()));
    }
    Ok(())
}

pub fn validate_rating(rating: Option<f32>) -> Result<(), errors::ModelError> {
    match rating {
        Some(r) if !(1.0..=5.0).contains(&r) => {
            Err(errors::ModelError::Validation("Rating must be between 1 and 5".into()))
        }
        _ => Ok(()),
    }
}

pub async fn create(
    db: &DatabaseConnection,
    tour_id: Uuid,
    user_id: Uuid,
    review: &str,
    rating: Option<f32>,
) -> Result<Model, errors::ModelError> {
    validate_review(review)?;
    validate_rating(rating)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        review: Set(review.trim().to_string()),
        rating: Set(rating),
        tour_id: Set(tour_id),
        user_id: Set(user_id),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::from_db(e, "tour, user"))
}

/// All reviews, or only those of one tour when `tour_id` is given.
pub async fn list(db: &DatabaseConnection, tour_id: Option<Uuid>) -> Result<Vec<Model>, errors::ModelError> {
    let mut q = Entity::find();
    if let Some(tid) = tour_id {
        q = q.filter(Column::TourId.eq(tid));
    }
    q.order_by_desc(Column::CreatedAt)
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Returns `false` when no row matched.
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<bool, errors::ModelError> {
    let res = Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}
