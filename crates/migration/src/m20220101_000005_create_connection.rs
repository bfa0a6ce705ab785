//! Create `connection` table.
//!
//! Routes a phone number to an agent; one connection per phone number.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Connection::Table)
                    .if_not_exists()
                    .col(uuid(Connection::Id).primary_key())
                    .col(uuid(Connection::PhoneNumberId).unique_key().not_null())
                    .col(uuid(Connection::AgentId).not_null())
                    .col(timestamp_with_time_zone(Connection::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_connection_phone_number")
                            .from(Connection::Table, Connection::PhoneNumberId)
                            .to(PhoneNumber::Table, PhoneNumber::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_connection_agent")
                            .from(Connection::Table, Connection::AgentId)
                            .to(Agent::Table, Agent::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Connection::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Connection { Table, Id, PhoneNumberId, AgentId, CreatedAt }

#[derive(DeriveIden)]
enum PhoneNumber { Table, Id }

#[derive(DeriveIden)]
enum Agent { Table, Id }
