//! HTTP route definitions and handlers.
//!
//! Exposes the session read model, its mutators and gate evaluation to
//! local consumers, plus a health check.

mod gate_routes;
mod health_routes;
mod session_routes;

use crate::state::AppState;
use axum::Router;

/// Creates the application router with all configured routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(session_routes::routes())
        .merge(gate_routes::routes())
        .merge(health_routes::routes())
        .with_state(state)
}
