//! HTTP API routes

pub mod cash_drawers;
pub mod health;
pub mod inventory;
pub mod sales;
pub mod services;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(cash_drawers::router())
        .merge(sales::router())
        .merge(inventory::router())
        .merge(services::router())
}
