//! Sales API Handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;
use vetpos_core::sale::{NewSale, SaleLineInput};
use vetpos_core::{PaymentMethod, Sale, SaleWithItems};

use crate::auth::CurrentUser;
use crate::error::{created, ok, ApiError, ApiResponse, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSale {
    pub client_id: Option<String>,
    pub pet_id: Option<String>,
    pub items: Vec<SaleLineInput>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// `YYYY-MM-DD`, defaults to today (UTC)
    pub date: Option<String>,
}

/// POST /api/sales
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<CreateSale>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SaleWithItems>>)> {
    let new_sale = NewSale {
        client_id: payload.client_id,
        pet_id: payload.pet_id,
        lines: payload.items,
        payment_method: payload.payment_method,
        notes: payload.notes,
        user_id: Some(user.id),
    };

    let sale = state
        .db
        .sales()
        .create_sale(&new_sale, state.tax_rate())
        .await?;
    Ok(created(sale))
}

/// GET /api/sales?date=YYYY-MM-DD
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Sale>>>> {
    let day = match query.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::validation(format!("Invalid date '{raw}', expected YYYY-MM-DD")))?,
        None => Utc::now().date_naive(),
    };
    debug!(%day, "Listing sales");

    let sales = state.db.sales().list_for_day(day).await?;
    Ok(ok(sales))
}

/// GET /api/sales/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<SaleWithItems>>> {
    let sale = state
        .db
        .sales()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Sale not found: {id}")))?;
    Ok(ok(sale))
}

/// POST /api/sales/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<SaleWithItems>>> {
    let sale = state.db.sales().cancel_sale(&id, Some(&user.id)).await?;
    Ok(ok(sale))
}
