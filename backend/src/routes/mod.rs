//! Route definitions for the stock backend

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Stock balances (read-only)
        .nest("/stock", stock_routes())
}

/// Stock balance routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/bulk", post(handlers::bulk_stock))
        .route("/bins/:bin_id", post(handlers::get_bin_stock))
        .route("/sites/:site_id", post(handlers::get_site_stock))
        .route("/sufficiency", post(handlers::check_sufficiency))
        .route("/dispatch-check", post(handlers::check_dispatch))
        .route("/items/:item_id/bins/:bin_id", get(handlers::get_current_stock))
}
