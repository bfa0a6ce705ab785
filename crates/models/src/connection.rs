use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::agent;
use crate::errors;
use crate::phone_number;

/// Routes a phone number to an agent. Consistency goal: the phone's
/// credential must match the connected agent's credential; a mismatch is
/// drift and the trigger for migration.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "connection")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub phone_number_id: Uuid,
    pub agent_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { PhoneNumber, Agent }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::PhoneNumber => Entity::belongs_to(phone_number::Entity).from(Column::PhoneNumberId).to(phone_number::Column::Id).into(),
            Relation::Agent => Entity::belongs_to(agent::Entity).from(Column::AgentId).to(agent::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(db: &DatabaseConnection, phone_number_id: Uuid, agent_id: Uuid) -> Result<Model, errors::ModelError> {
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        phone_number_id: Set(phone_number_id),
        agent_id: Set(agent_id),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
