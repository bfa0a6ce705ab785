use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::credential;
use crate::errors;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "phone_number")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub e164: String,
    pub remote_id: Option<String>,
    pub credential_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Credential }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Credential => Entity::belongs_to(credential::Entity).from(Column::CredentialId).to(credential::Column::Id).into() }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_e164(e164: &str) -> Result<(), errors::ModelError> {
    let ok = e164.starts_with('+')
        && e164.len() >= 8
        && e164.len() <= 16
        && e164[1..].chars().all(|c| c.is_ascii_digit());
    if !ok {
        return Err(errors::ModelError::Validation(format!("invalid E.164 number: {e164}")));
    }
    Ok(())
}

pub async fn create(db: &DatabaseConnection, owner_id: Uuid, e164: &str) -> Result<Model, errors::ModelError> {
    validate_e164(e164)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner_id),
        e164: Set(e164.to_string()),
        remote_id: Set(None),
        credential_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
