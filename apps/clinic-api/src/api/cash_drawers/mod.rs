//! Cash drawer API (register sessions)

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/cash-drawers", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/current", get(handler::get_current))
        .route("/current/transactions", post(handler::record_transaction))
        .route("/open", post(handler::open))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/close", post(handler::close))
}
