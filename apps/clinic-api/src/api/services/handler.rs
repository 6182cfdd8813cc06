use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use vetpos_core::Service;
use vetpos_db::NewService;

use crate::auth::AdminUser;
use crate::error::{created, ok, ApiResponse, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

/// GET /api/services - active services
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<Service>>>> {
    let services = state.db.services().list_active().await?;
    Ok(ok(services))
}

/// POST /api/services
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(payload): ApiJson<NewService>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Service>>)> {
    let service = state.db.services().insert(&payload).await?;
    Ok(created(service))
}
