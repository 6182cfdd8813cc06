//! Inventory API Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use vetpos_core::inventory::LedgerReconciliation;
use vetpos_core::pricing::{ItemFilter, PriceAdjustment, PriceAdjustmentSummary};
use vetpos_core::{InventoryItem, InventoryMovement, InventoryStatus, MovementType};
use vetpos_db::NewInventoryItem;

use crate::auth::{AdminUser, CurrentUser};
use crate::error::{created, ok, ApiError, ApiResponse, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub category: Option<String>,
    pub status: Option<InventoryStatus>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMovement {
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct MovementRecorded {
    pub item: InventoryItem,
    pub movement: InventoryMovement,
}

/// Body of the preview/apply endpoints. An absent filter selects every
/// active item.
#[derive(Debug, Deserialize)]
pub struct AdjustmentRequest {
    #[serde(default)]
    pub filter: ItemFilter,
    pub adjustment: PriceAdjustment,
}

/// GET /api/inventory
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<InventoryItem>>>> {
    let filter = ItemFilter {
        category: query.category,
        status: query.status,
        search: query.search,
        item_ids: Vec::new(),
    };
    let items = state
        .db
        .inventory()
        .list(&filter, !query.include_inactive)
        .await?;
    Ok(ok(items))
}

/// POST /api/inventory
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<NewInventoryItem>,
) -> ApiResult<(StatusCode, Json<ApiResponse<InventoryItem>>)> {
    let item = state.db.inventory().insert(&payload, Some(&user.id)).await?;
    Ok(created(item))
}

/// GET /api/inventory/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<InventoryItem>>> {
    let item = state
        .db
        .inventory()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Inventory item not found: {id}")))?;
    Ok(ok(item))
}

/// GET /api/inventory/{id}/movements
pub async fn list_movements(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<InventoryMovement>>>> {
    let inventory = state.db.inventory();
    if inventory.get_by_id(&id).await?.is_none() {
        return Err(ApiError::not_found(format!("Inventory item not found: {id}")));
    }
    let movements = inventory.movements(&id).await?;
    Ok(ok(movements))
}

/// POST /api/inventory/{id}/movements
pub async fn record_movement(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<NewMovement>,
) -> ApiResult<(StatusCode, Json<ApiResponse<MovementRecorded>>)> {
    let (item, movement) = state
        .db
        .inventory()
        .record_movement(
            &id,
            payload.movement_type,
            payload.quantity,
            &payload.reason,
            Some(&user.id),
        )
        .await?;
    Ok(created(MovementRecorded { item, movement }))
}

/// GET /api/inventory/{id}/reconcile
pub async fn reconcile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<LedgerReconciliation>>> {
    let report = state.db.inventory().reconcile(&id).await?;
    Ok(ok(report))
}

/// POST /api/inventory/price-adjustments/preview
pub async fn preview_adjustment(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AdjustmentRequest>,
) -> ApiResult<Json<ApiResponse<PriceAdjustmentSummary>>> {
    let summary = state
        .db
        .inventory()
        .preview_price_adjustment(&payload.filter, &payload.adjustment)
        .await?;
    Ok(ok(summary))
}

/// POST /api/inventory/price-adjustments/apply (admin only)
pub async fn apply_adjustment(
    State(state): State<AppState>,
    AdminUser(user): AdminUser,
    ApiJson(payload): ApiJson<AdjustmentRequest>,
) -> ApiResult<Json<ApiResponse<PriceAdjustmentSummary>>> {
    tracing::info!(user_id = %user.id, "Applying price adjustment");
    let summary = state
        .db
        .inventory()
        .apply_price_adjustment(&payload.filter, &payload.adjustment)
        .await?;
    Ok(ok(summary))
}
