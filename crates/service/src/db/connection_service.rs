use models::{agent, connection, phone_number};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::errors::PoolError;

/// Route a phone number to an agent. One connection per phone number.
pub async fn connect_phone_to_agent(db: &DatabaseConnection, phone_number_id: Uuid, agent_id: Uuid) -> Result<connection::Model, PoolError> {
    phone_number::Entity::find_by_id(phone_number_id)
        .one(db).await.map_err(|e| PoolError::Db(e.to_string()))?
        .ok_or_else(|| PoolError::not_found("phone number"))?;
    agent::Entity::find_by_id(agent_id)
        .one(db).await.map_err(|e| PoolError::Db(e.to_string()))?
        .ok_or_else(|| PoolError::not_found("agent"))?;
    let existing = connection::Entity::find()
        .filter(connection::Column::PhoneNumberId.eq(phone_number_id))
        .one(db).await.map_err(|e| PoolError::Db(e.to_string()))?;
    if existing.is_some() {
        return Err(PoolError::Validation("phone number is already connected; disconnect first".into()));
    }
    Ok(connection::create(db, phone_number_id, agent_id).await?)
}

pub async fn disconnect(db: &DatabaseConnection, connection_id: Uuid) -> Result<(), PoolError> {
    connection::Entity::delete_by_id(connection_id)
        .exec(db).await.map_err(|e| PoolError::Db(e.to_string()))?;
    Ok(())
}

pub async fn list_connections(db: &DatabaseConnection) -> Result<Vec<connection::Model>, PoolError> {
    connection::Entity::find().all(db).await.map_err(|e| PoolError::Db(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn connection_crud_service() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let owner = Uuid::new_v4();
        let ag = agent::create(&db, owner, "conn-bot").await?;
        let pn = phone_number::create(&db, owner, "+14155550191").await?;

        let conn = connect_phone_to_agent(&db, pn.id, ag.id).await?;
        assert_eq!(conn.phone_number_id, pn.id);

        // one connection per phone
        let dup = connect_phone_to_agent(&db, pn.id, ag.id).await;
        assert!(matches!(dup, Err(PoolError::Validation(_))));

        disconnect(&db, conn.id).await?;
        phone_number::Entity::delete_by_id(pn.id).exec(&db).await?;
        agent::Entity::delete_by_id(ag.id).exec(&db).await?;
        Ok(())
    }
}
