use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(utoipa::ToSchema)]
pub struct CreateCredentialInputDoc {
    pub name: String,
    pub secret: String,
    pub max_agents: i32,
}

#[derive(utoipa::ToSchema)]
pub struct UpdateCredentialInputDoc {
    pub max_agents: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(utoipa::ToSchema)]
pub struct SelectCredentialInputDoc {
    pub exclude_credential_id: Option<Uuid>,
}

#[derive(utoipa::ToSchema)]
pub struct MigrateResourceInputDoc {
    pub resource_kind: String,
    pub resource_id: Uuid,
    pub dest_credential_id: Uuid,
    pub dry_run: bool,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::credentials::list,
        crate::routes::credentials::create,
        crate::routes::credentials::get,
        crate::routes::credentials::update,
        crate::routes::credentials::delete,
        crate::routes::pool::select,
        crate::routes::pool::allocate_for_agent,
        crate::routes::pool::drift_report,
        crate::routes::pool::reconcile,
        crate::routes::migrations::migrate_resource,
        crate::routes::migrations::migrate_all_mismatched,
        crate::routes::migrations::migrate_agent_phone_numbers,
        crate::routes::migrations::queue_status,
        crate::routes::migrations::process_queue,
        crate::routes::health_checks::run_health_checks,
    ),
    components(
        schemas(
            HealthResponse,
            CreateCredentialInputDoc,
            UpdateCredentialInputDoc,
            SelectCredentialInputDoc,
            MigrateResourceInputDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "credentials"),
        (name = "pool"),
        (name = "migrations")
    )
)]
pub struct ApiDoc;
