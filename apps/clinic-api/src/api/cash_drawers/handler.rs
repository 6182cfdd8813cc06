//! Cash Drawer API Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use vetpos_core::drawer::DrawerReconciliation;
use vetpos_core::{CashDrawer, CashTransaction, TransactionType};
use vetpos_db::DrawerSummary;

use crate::auth::CurrentUser;
use crate::error::{created, ok, ApiError, ApiResponse, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDrawer {
    pub initial_amount_cents: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseDrawer {
    pub final_amount_cents: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub transaction_type: TransactionType,
    pub amount_cents: i64,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClosedDrawer {
    pub drawer: CashDrawer,
    pub reconciliation: DrawerReconciliation,
}

/// GET /api/cash-drawers
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<CashDrawer>>>> {
    let limit = query.limit.clamp(1, 200);
    let offset = query.offset.max(0);
    let drawers = state.db.cash_drawers().list(limit, offset).await?;
    Ok(ok(drawers))
}

/// GET /api/cash-drawers/current - `data` is null when no drawer is open
pub async fn get_current(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Option<DrawerSummary>>>> {
    let current = state.db.cash_drawers().current().await?;
    Ok(ok(current))
}

/// GET /api/cash-drawers/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<CashDrawer>>> {
    let drawer = state
        .db
        .cash_drawers()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Cash drawer not found: {id}")))?;
    Ok(ok(drawer))
}

/// POST /api/cash-drawers/open
pub async fn open(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<OpenDrawer>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CashDrawer>>)> {
    let drawer = state
        .db
        .cash_drawers()
        .open(payload.initial_amount_cents, Some(&user.id), payload.notes)
        .await?;
    Ok(created(drawer))
}

/// POST /api/cash-drawers/{id}/close
pub async fn close(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<CloseDrawer>,
) -> ApiResult<Json<ApiResponse<ClosedDrawer>>> {
    let (drawer, reconciliation) = state
        .db
        .cash_drawers()
        .close(&id, payload.final_amount_cents, Some(&user.id), payload.notes)
        .await?;
    Ok(ok(ClosedDrawer {
        drawer,
        reconciliation,
    }))
}

/// POST /api/cash-drawers/current/transactions - deposit or withdrawal
pub async fn record_transaction(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<NewTransaction>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CashTransaction>>)> {
    let transaction = state
        .db
        .cash_drawers()
        .record_transaction(
            payload.transaction_type,
            payload.amount_cents,
            payload.description,
            Some(&user.id),
        )
        .await?;
    Ok(created(transaction))
}
