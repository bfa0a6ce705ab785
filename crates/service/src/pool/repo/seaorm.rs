use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use models::{agent, connection, credential, migration_attempt, phone_number, voice};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::errors::PoolError;
use crate::pool::domain::{AttemptCounts, ResourceKind, ResourceRecord};
use crate::pool::repository::PoolRepository;

/// SeaORM-backed repository implementation.
pub struct SeaOrmPoolRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmPoolRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    fn db_err(e: sea_orm::DbErr) -> PoolError { PoolError::Db(e.to_string()) }

    async fn count_status(&self, status: &str) -> Result<i64, PoolError> {
        let n = migration_attempt::Entity::find()
            .filter(migration_attempt::Column::Status.eq(status))
            .count(&self.db)
            .await
            .map_err(Self::db_err)?;
        Ok(n as i64)
    }
}

fn agent_record(m: agent::Model) -> ResourceRecord {
    ResourceRecord {
        kind: ResourceKind::Agent,
        id: m.id,
        owner_id: m.owner_id,
        label: m.name,
        remote_id: m.remote_id,
        credential_id: m.credential_id,
    }
}

fn phone_record(m: phone_number::Model) -> ResourceRecord {
    ResourceRecord {
        kind: ResourceKind::PhoneNumber,
        id: m.id,
        owner_id: m.owner_id,
        label: m.e164,
        remote_id: m.remote_id,
        credential_id: m.credential_id,
    }
}

fn voice_record(m: voice::Model) -> ResourceRecord {
    ResourceRecord {
        kind: ResourceKind::Voice,
        id: m.id,
        owner_id: m.owner_id,
        label: m.name,
        remote_id: m.remote_id,
        credential_id: m.credential_id,
    }
}

#[async_trait]
impl PoolRepository for SeaOrmPoolRepository {
    async fn list_credentials(&self) -> Result<Vec<credential::Model>, PoolError> {
        credential::Entity::find()
            .order_by_asc(credential::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(Self::db_err)
    }

    async fn get_credential(&self, id: Uuid) -> Result<Option<credential::Model>, PoolError> {
        credential::Entity::find_by_id(id).one(&self.db).await.map_err(Self::db_err)
    }

    async fn set_counts(&self, credential_id: Uuid, agents: i32, users: i32, over_capacity: bool) -> Result<(), PoolError> {
        let mut am: credential::ActiveModel = credential::Entity::find_by_id(credential_id)
            .one(&self.db)
            .await
            .map_err(Self::db_err)?
            .ok_or_else(|| PoolError::not_found("credential"))?
            .into();
        am.assigned_agent_count = Set(agents);
        am.assigned_user_count = Set(users);
        am.over_capacity = Set(over_capacity);
        am.updated_at = Set(Utc::now().into());
        am.update(&self.db).await.map_err(Self::db_err)?;
        Ok(())
    }

    async fn adjust_agent_count(&self, credential_id: Uuid, delta: i32) -> Result<(), PoolError> {
        let current = credential::Entity::find_by_id(credential_id)
            .one(&self.db)
            .await
            .map_err(Self::db_err)?
            .ok_or_else(|| PoolError::not_found("credential"))?;
        let mut am: credential::ActiveModel = current.clone().into();
        am.assigned_agent_count = Set((current.assigned_agent_count + delta).max(0));
        am.updated_at = Set(Utc::now().into());
        am.update(&self.db).await.map_err(Self::db_err)?;
        Ok(())
    }

    async fn adjust_user_count(&self, credential_id: Uuid, delta: i32) -> Result<(), PoolError> {
        let current = credential::Entity::find_by_id(credential_id)
            .one(&self.db)
            .await
            .map_err(Self::db_err)?
            .ok_or_else(|| PoolError::not_found("credential"))?;
        let mut am: credential::ActiveModel = current.clone().into();
        am.assigned_user_count = Set((current.assigned_user_count + delta).max(0));
        am.updated_at = Set(Utc::now().into());
        am.update(&self.db).await.map_err(Self::db_err)?;
        Ok(())
    }

    async fn set_health(&self, credential_id: Uuid, status: &str, checked_at: DateTimeWithTimeZone) -> Result<(), PoolError> {
        let mut am: credential::ActiveModel = credential::Entity::find_by_id(credential_id)
            .one(&self.db)
            .await
            .map_err(Self::db_err)?
            .ok_or_else(|| PoolError::not_found("credential"))?
            .into();
        am.health_status = Set(status.to_string());
        am.last_health_check_at = Set(Some(checked_at));
        am.updated_at = Set(Utc::now().into());
        am.update(&self.db).await.map_err(Self::db_err)?;
        Ok(())
    }

    async fn get_resource(&self, kind: ResourceKind, id: Uuid) -> Result<Option<ResourceRecord>, PoolError> {
        let record = match kind {
            ResourceKind::Agent => agent::Entity::find_by_id(id)
                .one(&self.db)
                .await
                .map_err(Self::db_err)?
                .map(agent_record),
            ResourceKind::PhoneNumber => phone_number::Entity::find_by_id(id)
                .one(&self.db)
                .await
                .map_err(Self::db_err)?
                .map(phone_record),
            ResourceKind::Voice => voice::Entity::find_by_id(id)
                .one(&self.db)
                .await
                .map_err(Self::db_err)?
                .map(voice_record),
        };
        Ok(record)
    }

    async fn set_resource_assignment(
        &self,
        kind: ResourceKind,
        id: Uuid,
        credential_id: Option<Uuid>,
        remote_id: Option<String>,
    ) -> Result<(), PoolError> {
        let now = Utc::now().into();
        match kind {
            ResourceKind::Agent => {
                let mut am: agent::ActiveModel = agent::Entity::find_by_id(id)
                    .one(&self.db)
                    .await
                    .map_err(Self::db_err)?
                    .ok_or_else(|| PoolError::not_found("agent"))?
                    .into();
                am.credential_id = Set(credential_id);
                if let Some(rid) = remote_id { am.remote_id = Set(Some(rid)); }
                am.updated_at = Set(now);
                am.update(&self.db).await.map_err(Self::db_err)?;
            }
            ResourceKind::PhoneNumber => {
                let mut am: phone_number::ActiveModel = phone_number::Entity::find_by_id(id)
                    .one(&self.db)
                    .await
                    .map_err(Self::db_err)?
                    .ok_or_else(|| PoolError::not_found("phone number"))?
                    .into();
                am.credential_id = Set(credential_id);
                if let Some(rid) = remote_id { am.remote_id = Set(Some(rid)); }
                am.updated_at = Set(now);
                am.update(&self.db).await.map_err(Self::db_err)?;
            }
            ResourceKind::Voice => {
                let mut am: voice::ActiveModel = voice::Entity::find_by_id(id)
                    .one(&self.db)
                    .await
                    .map_err(Self::db_err)?
                    .ok_or_else(|| PoolError::not_found("voice"))?
                    .into();
                am.credential_id = Set(credential_id);
                if let Some(rid) = remote_id { am.remote_id = Set(Some(rid)); }
                am.updated_at = Set(now);
                am.update(&self.db).await.map_err(Self::db_err)?;
            }
        }
        Ok(())
    }

    async fn list_agents_by_owner(&self, owner_id: Uuid) -> Result<Vec<ResourceRecord>, PoolError> {
        let rows = agent::Entity::find()
            .filter(agent::Column::OwnerId.eq(owner_id))
            .order_by_asc(agent::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(Self::db_err)?;
        Ok(rows.into_iter().map(agent_record).collect())
    }

    async fn count_agents_on(&self, credential_id: Uuid) -> Result<i64, PoolError> {
        let n = agent::Entity::find()
            .filter(agent::Column::CredentialId.eq(credential_id))
            .count(&self.db)
            .await
            .map_err(Self::db_err)?;
        Ok(n as i64)
    }

    async fn count_distinct_owners_on(&self, credential_id: Uuid) -> Result<i64, PoolError> {
        let mut owners: HashSet<Uuid> = HashSet::new();
        let agent_owners: Vec<Uuid> = agent::Entity::find()
            .select_only()
            .column(agent::Column::OwnerId)
            .filter(agent::Column::CredentialId.eq(credential_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(Self::db_err)?;
        owners.extend(agent_owners);
        let phone_owners: Vec<Uuid> = phone_number::Entity::find()
            .select_only()
            .column(phone_number::Column::OwnerId)
            .filter(phone_number::Column::CredentialId.eq(credential_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(Self::db_err)?;
        owners.extend(phone_owners);
        let voice_owners: Vec<Uuid> = voice::Entity::find()
            .select_only()
            .column(voice::Column::OwnerId)
            .filter(voice::Column::CredentialId.eq(credential_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(Self::db_err)?;
        owners.extend(voice_owners);
        Ok(owners.len() as i64)
    }

    async fn count_owner_resources_on(&self, credential_id: Uuid, owner_id: Uuid) -> Result<i64, PoolError> {
        let agents = agent::Entity::find()
            .filter(agent::Column::CredentialId.eq(credential_id))
            .filter(agent::Column::OwnerId.eq(owner_id))
            .count(&self.db)
            .await
            .map_err(Self::db_err)?;
        let phones = phone_number::Entity::find()
            .filter(phone_number::Column::CredentialId.eq(credential_id))
            .filter(phone_number::Column::OwnerId.eq(owner_id))
            .count(&self.db)
            .await
            .map_err(Self::db_err)?;
        let voices = voice::Entity::find()
            .filter(voice::Column::CredentialId.eq(credential_id))
            .filter(voice::Column::OwnerId.eq(owner_id))
            .count(&self.db)
            .await
            .map_err(Self::db_err)?;
        Ok((agents + phones + voices) as i64)
    }

    async fn list_connections(&self) -> Result<Vec<connection::Model>, PoolError> {
        connection::Entity::find()
            .order_by_asc(connection::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(Self::db_err)
    }

    async fn connections_for_agent(&self, agent_id: Uuid) -> Result<Vec<connection::Model>, PoolError> {
        connection::Entity::find()
            .filter(connection::Column::AgentId.eq(agent_id))
            .all(&self.db)
            .await
            .map_err(Self::db_err)
    }

    async fn list_unconnected_phones(&self) -> Result<Vec<ResourceRecord>, PoolError> {
        let connected: Vec<Uuid> = connection::Entity::find()
            .select_only()
            .column(connection::Column::PhoneNumberId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(Self::db_err)?;
        let connected: HashSet<Uuid> = connected.into_iter().collect();
        let phones = phone_number::Entity::find()
            .order_by_asc(phone_number::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(Self::db_err)?;
        Ok(phones
            .into_iter()
            .filter(|p| !connected.contains(&p.id))
            .map(phone_record)
            .collect())
    }

    async fn insert_attempt(
        &self,
        kind: ResourceKind,
        resource_id: Uuid,
        source_credential_id: Option<Uuid>,
        dest_credential_id: Uuid,
    ) -> Result<migration_attempt::Model, PoolError> {
        Ok(migration_attempt::create(&self.db, kind.as_str(), resource_id, source_credential_id, dest_credential_id).await?)
    }

    async fn update_attempt(&self, id: Uuid, status: &str, attempt_count: i32, last_error: Option<String>) -> Result<(), PoolError> {
        let mut am: migration_attempt::ActiveModel = migration_attempt::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(Self::db_err)?
            .ok_or_else(|| PoolError::not_found("migration attempt"))?
            .into();
        am.status = Set(status.to_string());
        am.attempt_count = Set(attempt_count);
        am.last_error = Set(last_error);
        am.updated_at = Set(Utc::now().into());
        am.update(&self.db).await.map_err(Self::db_err)?;
        Ok(())
    }

    async fn actionable_attempts(&self, max_attempts: i32, limit: u64) -> Result<Vec<migration_attempt::Model>, PoolError> {
        migration_attempt::Entity::find()
            .filter(migration_attempt::Column::Status.eq("failed"))
            .filter(migration_attempt::Column::AttemptCount.lt(max_attempts))
            .order_by_asc(migration_attempt::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(Self::db_err)
    }

    async fn supersede_attempts(&self, kind: ResourceKind, resource_id: Uuid, keep: Uuid) -> Result<u64, PoolError> {
        let res = migration_attempt::Entity::update_many()
            .filter(migration_attempt::Column::ResourceKind.eq(kind.as_str()))
            .filter(migration_attempt::Column::ResourceId.eq(resource_id))
            .filter(migration_attempt::Column::Id.ne(keep))
            .filter(migration_attempt::Column::Status.eq("failed"))
            .col_expr(migration_attempt::Column::Status, Expr::value("dead"))
            .col_expr(migration_attempt::Column::LastError, Expr::value("superseded by newer attempt"))
            .col_expr(migration_attempt::Column::UpdatedAt, Expr::value(DateTimeWithTimeZone::from(Utc::now())))
            .exec(&self.db)
            .await
            .map_err(Self::db_err)?;
        Ok(res.rows_affected)
    }

    async fn attempt_counts(&self) -> Result<AttemptCounts, PoolError> {
        Ok(AttemptCounts {
            pending: self.count_status("pending").await?,
            succeeded: self.count_status("succeeded").await?,
            failed: self.count_status("failed").await?,
            dead: self.count_status("dead").await?,
        })
    }

    async fn oldest_actionable_at(&self, max_attempts: i32) -> Result<Option<DateTimeWithTimeZone>, PoolError> {
        let row = migration_attempt::Entity::find()
            .filter(migration_attempt::Column::Status.eq("failed"))
            .filter(migration_attempt::Column::AttemptCount.lt(max_attempts))
            .order_by_asc(migration_attempt::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(Self::db_err)?;
        Ok(row.map(|a| a.created_at))
    }
}
