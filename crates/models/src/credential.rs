use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;

/// One external API identity against which resources are registered.
/// The secret never leaves this subsystem; it is skipped on serialization.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credential")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub secret: String,
    pub is_active: bool,
    pub health_status: String,
    pub max_agents: i32,
    pub assigned_agent_count: i32,
    pub assigned_user_count: i32,
    pub over_capacity: bool,
    pub last_health_check_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation { fn def(&self) -> RelationDef { panic!("no relations") } }

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_max_agents(max_agents: i32) -> Result<(), errors::ModelError> {
    if max_agents < 1 {
        return Err(errors::ModelError::Validation("max_agents must be >= 1".into()));
    }
    Ok(())
}

pub async fn create(db: &DatabaseConnection, name: &str, secret: &str, max_agents: i32) -> Result<Model, errors::ModelError> {
    if name.trim().is_empty() { return Err(errors::ModelError::Validation("name is empty".into())); }
    if secret.len() < 12 { return Err(errors::ModelError::Validation("secret too short".into())); }
    validate_max_agents(max_agents)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        secret: Set(secret.to_string()),
        is_active: Set(true),
        health_status: Set("unknown".into()),
        max_agents: Set(max_agents),
        assigned_agent_count: Set(0),
        assigned_user_count: Set(0),
        over_capacity: Set(false),
        last_health_check_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
