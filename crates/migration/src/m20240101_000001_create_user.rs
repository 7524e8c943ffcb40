//! Create `user` table.
//!
//! One row per account document: profile, role, password hash and the
//! nullable reset-token pair.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Name, 128).not_null())
                    .col(string_len(User::Email, 255).unique_key().not_null())
                    .col(string_len(User::Photo, 255).not_null().default("default.jpg"))
                    .col(string_len(User::Role, 32).not_null().default("user"))
                    .col(string_len(User::PasswordHash, 255).not_null())
                    .col(
                        ColumnDef::new(User::PasswordChangedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(User::PasswordResetToken).string_len(64).null())
                    .col(
                        ColumnDef::new(User::PasswordResetExpires)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(boolean(User::Active).not_null().default(true))
                    .col(timestamp_with_time_zone(User::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(User::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(User::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Name,
    Email,
    Photo,
    Role,
    PasswordHash,
    PasswordChangedAt,
    PasswordResetToken,
    PasswordResetExpires,
    Active,
    CreatedAt,
    UpdatedAt,
}
