use chrono::Utc;
use models::credential;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use crate::errors::PoolError;
use common::pagination::Pagination;

/// Create a credential. New credentials start unknown-health and active.
pub async fn create_credential(db: &DatabaseConnection, name: &str, secret: &str, max_agents: i32) -> Result<credential::Model, PoolError> {
    Ok(credential::create(db, name, secret, max_agents).await?)
}

/// Get credential by id.
pub async fn get_credential(db: &DatabaseConnection, id: Uuid) -> Result<Option<credential::Model>, PoolError> {
    Ok(credential::Entity::find_by_id(id).one(db).await.map_err(|e| PoolError::Db(e.to_string()))?)
}

/// Update threshold and/or active flag. Deactivation stops new assignments
/// but does not migrate existing resources.
pub async fn update_credential(
    db: &DatabaseConnection,
    id: Uuid,
    max_agents: Option<i32>,
    is_active: Option<bool>,
) -> Result<credential::Model, PoolError> {
    let mut am: credential::ActiveModel = credential::Entity::find_by_id(id)
        .one(db).await.map_err(|e| PoolError::Db(e.to_string()))?
        .ok_or_else(|| PoolError::not_found("credential"))?
        .into();
    if let Some(m) = max_agents {
        credential::validate_max_agents(m)?;
        am.max_agents = Set(m);
    }
    if let Some(a) = is_active { am.is_active = Set(a); }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await.map_err(|e| PoolError::Db(e.to_string()))?;
    Ok(updated)
}

/// Delete a credential. Refuses while resources are still assigned; the
/// operator must drain first.
pub async fn delete_credential(db: &DatabaseConnection, id: Uuid) -> Result<(), PoolError> {
    let cred = credential::Entity::find_by_id(id)
        .one(db).await.map_err(|e| PoolError::Db(e.to_string()))?
        .ok_or_else(|| PoolError::not_found("credential"))?;
    if cred.assigned_agent_count > 0 {
        return Err(PoolError::Validation(format!(
            "credential {} still has {} assigned agents; drain before deleting",
            cred.name, cred.assigned_agent_count
        )));
    }
    credential::Entity::delete_by_id(id).exec(db).await.map_err(|e| PoolError::Db(e.to_string()))?;
    Ok(())
}

/// List credentials with optional active filter and pagination.
pub async fn list_credentials_paginated(db: &DatabaseConnection, active: Option<bool>, opts: Pagination) -> Result<Vec<credential::Model>, PoolError> {
    use sea_orm::{ColumnTrait, PaginatorTrait, QueryFilter, QueryOrder};
    let (page_idx, per_page) = opts.normalize();
    let mut select = credential::Entity::find().order_by_asc(credential::Column::CreatedAt);
    if let Some(a) = active { select = select.filter(credential::Column::IsActive.eq(a)); }
    let rows = select
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await
        .map_err(|e| PoolError::Db(e.to_string()))?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn credential_crud_service() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let cred = create_credential(&db, &format!("svc_cred_{}", Uuid::new_v4()), "secret-0123456789", 8).await?;
        let found = get_credential(&db, cred.id).await?.unwrap();
        assert_eq!(found.id, cred.id);
        assert_eq!(found.max_agents, 8);

        let updated = update_credential(&db, cred.id, Some(12), Some(false)).await?;
        assert_eq!(updated.max_agents, 12);
        assert!(!updated.is_active);

        delete_credential(&db, cred.id).await?;
        let after = get_credential(&db, cred.id).await?;
        assert!(after.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn delete_refuses_undrained_credential() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let cred = create_credential(&db, &format!("svc_busy_{}", Uuid::new_v4()), "secret-0123456789", 8).await?;
        // simulate one assigned agent
        let mut am: credential::ActiveModel = cred.clone().into();
        am.assigned_agent_count = Set(1);
        am.update(&db).await?;

        let res = delete_credential(&db, cred.id).await;
        assert!(matches!(res, Err(PoolError::Validation(_))));

        let mut am: credential::ActiveModel = get_credential(&db, cred.id).await?.unwrap().into();
        am.assigned_agent_count = Set(0);
        am.update(&db).await?;
        delete_credential(&db, cred.id).await?;
        Ok(())
    }
}
