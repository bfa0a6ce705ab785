//! Create `credential` table.
//!
//! External API identities with capacity limits and health state.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Credential::Table)
                    .if_not_exists()
                    .col(uuid(Credential::Id).primary_key())
                    .col(string_len(Credential::Name, 128).unique_key().not_null())
                    .col(string_len(Credential::Secret, 256).not_null())
                    .col(boolean(Credential::IsActive).not_null())
                    .col(string_len(Credential::HealthStatus, 32).not_null())
                    .col(integer(Credential::MaxAgents).not_null())
                    .col(integer(Credential::AssignedAgentCount).not_null())
                    .col(integer(Credential::AssignedUserCount).not_null())
                    .col(boolean(Credential::OverCapacity).not_null())
                    .col(
                        ColumnDef::new(Credential::LastHealthCheckAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(timestamp_with_time_zone(Credential::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Credential::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Credential::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Credential {
    Table,
    Id,
    Name,
    Secret,
    IsActive,
    HealthStatus,
    MaxAgents,
    AssignedAgentCount,
    AssignedUserCount,
    OverCapacity,
    LastHealthCheckAt,
    CreatedAt,
    UpdatedAt,
}
