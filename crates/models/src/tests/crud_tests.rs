use anyhow::Result;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

use crate::{agent, connection, credential, db, migration_attempt, phone_number, voice};

#[test]
fn e164_validation_rejects_garbage() {
    assert!(phone_number::validate_e164("+14155550100").is_ok());
    assert!(phone_number::validate_e164("14155550100").is_err());
    assert!(phone_number::validate_e164("+1-415-555").is_err());
    assert!(phone_number::validate_e164("+1").is_err());
}

#[test]
fn max_agents_validation() {
    assert!(credential::validate_max_agents(1).is_ok());
    assert!(credential::validate_max_agents(0).is_err());
    assert!(credential::validate_max_agents(-5).is_err());
}

#[tokio::test]
async fn credential_and_resource_crud() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }

    let db = db::connect().await?;
    migration::Migrator::up(&db, None).await?;

    let cred = credential::create(&db, &format!("cred_{}", Uuid::new_v4()), "secret-0123456789", 10).await?;
    assert_eq!(cred.health_status, "unknown");
    assert_eq!(cred.assigned_agent_count, 0);
    assert!(cred.is_active);

    let owner = Uuid::new_v4();
    let ag = agent::create(&db, owner, "support-bot").await?;
    assert!(ag.credential_id.is_none());
    assert!(ag.remote_id.is_none());

    let pn = phone_number::create(&db, owner, "+14155550123").await?;
    let vc = voice::create(&db, owner, "warm-narrator").await?;
    let conn = connection::create(&db, pn.id, ag.id).await?;

    // assign the agent and verify the update round-trips
    let mut am: agent::ActiveModel = ag.clone().into();
    am.credential_id = Set(Some(cred.id));
    am.remote_id = Set(Some("ra_123".into()));
    am.update(&db).await?;
    let found = agent::Entity::find_by_id(ag.id).one(&db).await?.unwrap();
    assert_eq!(found.credential_id, Some(cred.id));

    let attempt = migration_attempt::create(&db, "phone_number", pn.id, None, cred.id).await?;
    assert_eq!(attempt.status, "pending");
    assert_eq!(attempt.attempt_count, 0);

    // cleanup in reverse dependency order
    migration_attempt::Entity::delete_by_id(attempt.id).exec(&db).await?;
    connection::Entity::delete_by_id(conn.id).exec(&db).await?;
    voice::Entity::delete_by_id(vc.id).exec(&db).await?;
    phone_number::Entity::delete_by_id(pn.id).exec(&db).await?;
    agent::Entity::delete_by_id(ag.id).exec(&db).await?;
    credential::Entity::delete_by_id(cred.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn credential_create_rejects_short_secret() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let db = db::connect().await?;
    migration::Migrator::up(&db, None).await?;
    let res = credential::create(&db, "short-secret-cred", "abc", 5).await;
    assert!(matches!(res, Err(crate::errors::ModelError::Validation(_))));
    Ok(())
}
