use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;

/// One migration of a resource between credentials. Rows with status
/// "failed" and attempt_count below the configured maximum form the retry
/// queue; "dead" rows are retained for audit only.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "migration_attempt")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub resource_kind: String,
    pub resource_id: Uuid,
    pub source_credential_id: Option<Uuid>,
    pub dest_credential_id: Uuid,
    pub status: String,
    pub attempt_count: i32,
    pub last_error: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation { fn def(&self) -> RelationDef { panic!("no relations") } }

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(
    db: &DatabaseConnection,
    resource_kind: &str,
    resource_id: Uuid,
    source_credential_id: Option<Uuid>,
    dest_credential_id: Uuid,
) -> Result<Model, errors::ModelError> {
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        resource_kind: Set(resource_kind.to_string()),
        resource_id: Set(resource_id),
        source_credential_id: Set(source_credential_id),
        dest_credential_id: Set(dest_credential_id),
        status: Set("pending".into()),
        attempt_count: Set(0),
        last_error: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
