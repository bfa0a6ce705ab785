use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use service::db::credential_service;
use tracing::info;
use uuid::Uuid;

use common::pagination::Pagination;

use crate::errors::JsonApiError;
use crate::routes::ServerState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    pub active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateCredentialInput {
    pub name: String,
    pub secret: String,
    pub max_agents: i32,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateCredentialInput {
    pub max_agents: Option<i32>,
    pub is_active: Option<bool>,
}

#[utoipa::path(
    get, path = "/admin/credentials", tag = "credentials",
    params(ListQuery),
    responses(
        (status = 200, description = "List OK"),
        (status = 500, description = "List Failed")
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<models::credential::Model>>, JsonApiError> {
    let opts = Pagination {
        page: q.page.unwrap_or(1),
        per_page: q.per_page.unwrap_or(20),
    };
    let list = credential_service::list_credentials_paginated(&state.db, q.active, opts).await?;
    info!(count = list.len(), "list credentials");
    Ok(Json(list))
}

#[utoipa::path(
    post, path = "/admin/credentials", tag = "credentials",
    request_body = crate::openapi::CreateCredentialInputDoc,
    responses(
        (status = 200, description = "Created"),
        (status = 400, description = "Validation Error")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Json(input): Json<CreateCredentialInput>,
) -> Result<Json<models::credential::Model>, JsonApiError> {
    let created = credential_service::create_credential(&state.db, &input.name, &input.secret, input.max_agents).await?;
    info!(id = %created.id, name = %created.name, max_agents = created.max_agents, "created credential");
    Ok(Json(created))
}

#[utoipa::path(
    get, path = "/admin/credentials/{id}", tag = "credentials",
    params(("id" = Uuid, Path, description = "Credential ID")),
    responses(
        (status = 200, description = "OK"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::credential::Model>, StatusCode> {
    match credential_service::get_credential(&state.db, id).await {
        Ok(Some(m)) => Ok(Json(m)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

#[utoipa::path(
    put, path = "/admin/credentials/{id}", tag = "credentials",
    params(("id" = Uuid, Path, description = "Credential ID")),
    request_body = crate::openapi::UpdateCredentialInputDoc,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCredentialInput>,
) -> Result<Json<models::credential::Model>, JsonApiError> {
    let updated = credential_service::update_credential(&state.db, id, input.max_agents, input.is_active).await?;
    info!(id = %updated.id, "updated credential");
    Ok(Json(updated))
}

#[utoipa::path(
    delete, path = "/admin/credentials/{id}", tag = "credentials",
    params(("id" = Uuid, Path, description = "Credential ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Not Drained"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    credential_service::delete_credential(&state.db, id).await?;
    info!(id = %id, "deleted credential");
    Ok(StatusCode::NO_CONTENT)
}
