//! Create `voice` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Voice::Table)
                    .if_not_exists()
                    .col(uuid(Voice::Id).primary_key())
                    .col(uuid(Voice::OwnerId).not_null())
                    .col(string_len(Voice::Name, 128).not_null())
                    .col(ColumnDef::new(Voice::RemoteId).string_len(128).null())
                    .col(ColumnDef::new(Voice::CredentialId).uuid().null())
                    .col(timestamp_with_time_zone(Voice::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Voice::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_voice_credential")
                            .from(Voice::Table, Voice::CredentialId)
                            .to(Credential::Table, Credential::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Voice::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Voice { Table, Id, OwnerId, Name, RemoteId, CredentialId, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Credential { Table, Id }
