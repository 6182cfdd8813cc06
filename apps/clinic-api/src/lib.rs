//! # VetPOS Clinic API
//!
//! HTTP front for the clinic point of sale: cash drawer sessions, atomic
//! sales, inventory movements and bulk price adjustments.
//!
//! Every JSON response uses the same envelope:
//!
//! ```text
//! { "success": true,  "data": ... }
//! { "success": false, "error": { "code": "NO_OPEN_DRAWER", "message": "..." } }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::ClinicConfig;
pub use state::AppState;

/// Builds the application router with its middleware stack.
pub fn build_router(state: AppState) -> Router {
    api::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
