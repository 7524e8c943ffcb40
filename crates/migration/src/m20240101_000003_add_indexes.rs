use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reset lookups go by hashed token
        manager
            .create_index(
                Index::create()
                    .name("idx_user_password_reset_token")
                    .table(User::Table)
                    .col(User::PasswordResetToken)
                    .to_owned(),
            )
            .await?;

        // Nested /tours/:tour_id/reviews listing
        manager
            .create_index(
                Index::create()
                    .name("idx_review_tour")
                    .table(Review::Table)
                    .col(Review::TourId)
                    .to_owned(),
            )
            .await?;

        // One review per user and tour
        manager
            .create_index(
                Index::create()
                    .name("uniq_review_tour_user")
                    .table(Review::Table)
                    .col(Review::TourId)
                    .col(Review::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uniq_review_tour_user").table(Review::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_review_tour").table(Review::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_user_password_reset_token").table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum User { Table, PasswordResetToken }

#[derive(DeriveIden)]
enum Review { Table, TourId, UserId }
