//! Service catalog API

mod handler;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/services", routes())
}

fn routes() -> Router<AppState> {
    Router::new().route("/", get(handler::list).post(handler::create))
}
