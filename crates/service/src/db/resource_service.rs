use models::{agent, phone_number, voice};
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::errors::PoolError;
use common::pagination::Pagination;

/// Create an agent for a tenant user. Unassigned until allocation.
pub async fn create_agent(db: &DatabaseConnection, owner_id: Uuid, name: &str) -> Result<agent::Model, PoolError> {
    Ok(agent::create(db, owner_id, name).await?)
}

pub async fn get_agent(db: &DatabaseConnection, id: Uuid) -> Result<Option<agent::Model>, PoolError> {
    Ok(agent::Entity::find_by_id(id).one(db).await.map_err(|e| PoolError::Db(e.to_string()))?)
}

pub async fn create_phone_number(db: &DatabaseConnection, owner_id: Uuid, e164: &str) -> Result<phone_number::Model, PoolError> {
    Ok(phone_number::create(db, owner_id, e164).await?)
}

pub async fn get_phone_number(db: &DatabaseConnection, id: Uuid) -> Result<Option<phone_number::Model>, PoolError> {
    Ok(phone_number::Entity::find_by_id(id).one(db).await.map_err(|e| PoolError::Db(e.to_string()))?)
}

pub async fn create_voice(db: &DatabaseConnection, owner_id: Uuid, name: &str) -> Result<voice::Model, PoolError> {
    Ok(voice::create(db, owner_id, name).await?)
}

pub async fn get_voice(db: &DatabaseConnection, id: Uuid) -> Result<Option<voice::Model>, PoolError> {
    Ok(voice::Entity::find_by_id(id).one(db).await.map_err(|e| PoolError::Db(e.to_string()))?)
}

/// List one owner's agents with pagination.
pub async fn list_agents_by_owner_paginated(db: &DatabaseConnection, owner_id: Uuid, opts: Pagination) -> Result<Vec<agent::Model>, PoolError> {
    use sea_orm::{ColumnTrait, PaginatorTrait, QueryFilter};
    let (page_idx, per_page) = opts.normalize();
    let rows = agent::Entity::find()
        .filter(agent::Column::OwnerId.eq(owner_id))
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await
        .map_err(|e| PoolError::Db(e.to_string()))?;
    Ok(rows)
}
