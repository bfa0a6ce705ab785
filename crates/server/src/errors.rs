use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::errors::PoolError;
use tracing::error;

/// JSON error envelope for the admin API.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: String,
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &str, detail: Option<String>) -> Self {
        Self { status, title: title.to_string(), detail }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(title = %self.title, detail = ?self.detail, "admin api error");
        }
        let body = serde_json::json!({
            "error": self.title,
            "detail": self.detail,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<PoolError> for JsonApiError {
    fn from(e: PoolError) -> Self {
        let detail = Some(e.to_string());
        match e {
            PoolError::Validation(_) | PoolError::Model(_) => {
                JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", detail)
            }
            PoolError::NotFound(_) => JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", detail),
            PoolError::CapacityExhausted => {
                JsonApiError::new(StatusCode::CONFLICT, "Capacity Exhausted", detail)
            }
            PoolError::NoTargetCredential(_) => {
                JsonApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "No Target Credential", detail)
            }
            PoolError::Remote(_) => JsonApiError::new(StatusCode::BAD_GATEWAY, "Remote Platform Error", detail),
            PoolError::Db(_) => JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Database Error", detail),
        }
    }
}
