//! Session read model and mutators.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::models::{AccountType, Profile, SessionIdentity};
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;
use crate::utils::value::value_to_string;

/// Registers session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(read_session))
        .route("/session/login", post(login))
        .route("/session/logout", post(logout))
        .route("/session/profile", put(set_profile))
}

/// Body of `POST /session/login`, as sent by the sign-in form once the
/// backend accepted the credentials.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    user_id: Value,
    account_type: String,
}

async fn read_session(State(state): State<AppState>) -> Json<SessionIdentity> {
    Json(state.session.snapshot())
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionIdentity>, HTTPError> {
    let user_id = value_to_string(request.user_id);
    if user_id.is_empty() {
        return Err(HTTPError::bad_request("userId must not be empty"));
    }
    if request.account_type.trim().is_empty() {
        return Err(HTTPError::bad_request("accountType must not be empty"));
    }

    info!("Login recorded for user '{}'", user_id);
    state
        .session
        .login(user_id, AccountType::from(request.account_type.trim()));
    Ok(Json(state.session.snapshot()))
}

async fn logout(State(state): State<AppState>) -> Json<SessionIdentity> {
    state.session.logout();
    Json(state.session.snapshot())
}

/// `null` clears the profile; any other JSON replaces it. Refused while
/// logged out so a logged-out session never carries a profile.
async fn set_profile(
    State(state): State<AppState>,
    Json(profile): Json<Value>,
) -> Result<Json<SessionIdentity>, HTTPError> {
    let profile = match profile {
        Value::Null => None,
        other => Some(Profile::new(other)),
    };
    if !state.session.set_session_profile(profile) {
        return Err(HTTPError::new(
            StatusCode::CONFLICT,
            "no active session to attach a profile to",
        ));
    }
    Ok(Json(state.session.snapshot()))
}
