//! Create `phone_number` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PhoneNumber::Table)
                    .if_not_exists()
                    .col(uuid(PhoneNumber::Id).primary_key())
                    .col(uuid(PhoneNumber::OwnerId).not_null())
                    .col(string_len(PhoneNumber::E164, 20).unique_key().not_null())
                    .col(ColumnDef::new(PhoneNumber::RemoteId).string_len(128).null())
                    .col(ColumnDef::new(PhoneNumber::CredentialId).uuid().null())
                    .col(timestamp_with_time_zone(PhoneNumber::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(PhoneNumber::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phone_number_credential")
                            .from(PhoneNumber::Table, PhoneNumber::CredentialId)
                            .to(Credential::Table, Credential::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(PhoneNumber::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum PhoneNumber { Table, Id, OwnerId, E164, RemoteId, CredentialId, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Credential { Table, Id }
