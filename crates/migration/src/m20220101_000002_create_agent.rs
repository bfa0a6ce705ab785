//! Create `agent` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Agent::Table)
                    .if_not_exists()
                    .col(uuid(Agent::Id).primary_key())
                    .col(uuid(Agent::OwnerId).not_null())
                    .col(string_len(Agent::Name, 128).not_null())
                    .col(ColumnDef::new(Agent::RemoteId).string_len(128).null())
                    .col(ColumnDef::new(Agent::CredentialId).uuid().null())
                    .col(timestamp_with_time_zone(Agent::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Agent::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_agent_credential")
                            .from(Agent::Table, Agent::CredentialId)
                            .to(Credential::Table, Credential::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Agent::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Agent { Table, Id, OwnerId, Name, RemoteId, CredentialId, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Credential { Table, Id }
