//! Inventory API (items, movements, price adjustments)

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/inventory", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/price-adjustments/preview", post(handler::preview_adjustment))
        .route("/price-adjustments/apply", post(handler::apply_adjustment))
        .route("/{id}", get(handler::get_by_id))
        .route(
            "/{id}/movements",
            get(handler::list_movements).post(handler::record_movement),
        )
        .route("/{id}/reconcile", get(handler::reconcile))
}
