//! Create `migration_attempt` table.
//!
//! Durable record of every migration; failed rows under the attempt limit
//! form the retry queue.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MigrationAttempt::Table)
                    .if_not_exists()
                    .col(uuid(MigrationAttempt::Id).primary_key())
                    .col(string_len(MigrationAttempt::ResourceKind, 32).not_null())
                    .col(uuid(MigrationAttempt::ResourceId).not_null())
                    .col(ColumnDef::new(MigrationAttempt::SourceCredentialId).uuid().null())
                    .col(uuid(MigrationAttempt::DestCredentialId).not_null())
                    .col(string_len(MigrationAttempt::Status, 16).not_null())
                    .col(integer(MigrationAttempt::AttemptCount).not_null())
                    .col(ColumnDef::new(MigrationAttempt::LastError).string_len(1024).null())
                    .col(timestamp_with_time_zone(MigrationAttempt::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(MigrationAttempt::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MigrationAttempt::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum MigrationAttempt {
    Table,
    Id,
    ResourceKind,
    ResourceId,
    SourceCredentialId,
    DestCredentialId,
    Status,
    AttemptCount,
    LastError,
    CreatedAt,
    UpdatedAt,
}
