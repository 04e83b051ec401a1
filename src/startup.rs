//! Application startup and server initialization.
//!
//! Mounts the session store (durable storage plus identity backend), starts
//! its verification sequence and serves the session API.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::backend::create_backend;
use crate::config::ConfigV1;
use crate::routes;
use crate::session::SessionStore;
use crate::state::AppState;
use crate::storage::create_storage;

/// Builds the application state: creates the storage and backend from
/// config and mounts a session store whose initialization is already
/// running in the background.
///
/// # Errors
///
/// Returns an error if the storage or backend cannot be created.
pub fn build_state(config: Arc<ConfigV1>) -> Result<AppState, Box<dyn std::error::Error>> {
    let storage = create_storage(&config.storage)?;
    let backend = create_backend(&config.backend)?;
    let (session, _initialization) = SessionStore::mount(backend, storage);

    Ok(AppState {
        routes: Arc::new(config.routes.clone()),
        config,
        session,
    })
}

/// Initializes and runs the application server.
///
/// # Errors
///
/// Returns an error if the state cannot be built, the server fails to bind
/// to the configured address, or it encounters a runtime error.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(config.clone())?;

    info!("Starting server on {}", config.bind_address);
    let app = routes::create_router(state);
    let listener = TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
