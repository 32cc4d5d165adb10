//! Route definitions for the kombucha batch tracker

use axum::{
    routing::{delete, get},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/batches", batch_routes())
        .route("/reminders/active", get(handlers::list_active_reminders))
        .nest("/calculator", calculator_routes())
}

/// Batch routes, including nested snapshots and analyses
fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_batches).post(handlers::create_batch))
        .route(
            "/:batch_id",
            get(handlers::get_batch)
                .put(handlers::update_batch)
                .delete(handlers::delete_batch),
        )
        .route("/:batch_id/state", get(handlers::get_batch_state))
        .route(
            "/:batch_id/intervals",
            get(handlers::list_intervals).post(handlers::create_interval),
        )
        .route(
            "/:batch_id/intervals/:interval_id",
            delete(handlers::delete_interval),
        )
        .route(
            "/:batch_id/analyses",
            get(handlers::list_analyses).post(handlers::request_analysis),
        )
        .route("/:batch_id/health", get(handlers::get_health_summary))
        .route("/:batch_id/reminders", get(handlers::list_batch_reminders))
}

/// Calculator routes; stateless
fn calculator_routes() -> Router<AppState> {
    Router::new()
        .route("/ratios", get(handlers::get_brew_ratios))
        .route("/carbonation", get(handlers::get_carbonation_settings))
        .route("/alcohol", get(handlers::get_alcohol_estimate))
}
