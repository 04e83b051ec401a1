//! Gate evaluation against the live session.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::gate::{AccessGate, GateDecision};
use crate::models::AccountType;
use crate::state::AppState;

/// Registers gate routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/session/gate", get(evaluate_gate))
}

#[derive(Deserialize, Debug)]
struct GateQuery {
    role: Option<String>,
}

/// `GET /session/gate?role=admin` answers what a view requiring `role` would
/// do for the current session. Without `role` any logged-in session renders.
async fn evaluate_gate(
    State(state): State<AppState>,
    Query(query): Query<GateQuery>,
) -> Json<GateDecision> {
    let mut gate = AccessGate::new(state.routes.clone());
    if let Some(role) = query.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        gate = gate.require(AccountType::from(role));
    }
    Json(gate.decide(&state.session.snapshot()))
}
