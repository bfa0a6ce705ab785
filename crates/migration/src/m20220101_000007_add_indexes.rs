use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Agent: index on credential_id (reconciliation counts) and owner_id
        manager
            .create_index(
                Index::create()
                    .name("idx_agent_credential")
                    .table(Agent::Table)
                    .col(Agent::CredentialId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_agent_owner")
                    .table(Agent::Table)
                    .col(Agent::OwnerId)
                    .to_owned(),
            )
            .await?;

        // PhoneNumber / Voice: index on credential_id
        manager
            .create_index(
                Index::create()
                    .name("idx_phone_number_credential")
                    .table(PhoneNumber::Table)
                    .col(PhoneNumber::CredentialId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_voice_credential")
                    .table(Voice::Table)
                    .col(Voice::CredentialId)
                    .to_owned(),
            )
            .await?;

        // Connection: index on agent_id (per-agent phone batches)
        manager
            .create_index(
                Index::create()
                    .name("idx_connection_agent")
                    .table(Connection::Table)
                    .col(Connection::AgentId)
                    .to_owned(),
            )
            .await?;

        // MigrationAttempt: queue scan is (status, created_at); resource lookup for supersede
        manager
            .create_index(
                Index::create()
                    .name("idx_attempt_status_created")
                    .table(MigrationAttempt::Table)
                    .col(MigrationAttempt::Status)
                    .col(MigrationAttempt::CreatedAt)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_attempt_resource")
                    .table(MigrationAttempt::Table)
                    .col(MigrationAttempt::ResourceKind)
                    .col(MigrationAttempt::ResourceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_agent_credential").table(Agent::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_agent_owner").table(Agent::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_phone_number_credential").table(PhoneNumber::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_voice_credential").table(Voice::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_connection_agent").table(Connection::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_attempt_status_created").table(MigrationAttempt::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_attempt_resource").table(MigrationAttempt::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Agent { Table, CredentialId, OwnerId }

#[derive(DeriveIden)]
enum PhoneNumber { Table, CredentialId }

#[derive(DeriveIden)]
enum Voice { Table, CredentialId }

#[derive(DeriveIden)]
enum Connection { Table, AgentId }

#[derive(DeriveIden)]
enum MigrationAttempt { Table, Status, CreatedAt, ResourceKind, ResourceId }
