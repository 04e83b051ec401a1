//! Shared application state.
//!
//! Holds the one session store mounted for this process together with the
//! configuration it was built from.

use crate::config::ConfigV1;
use crate::gate::RoleRoutes;
use crate::session::SessionStore;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// The mounted session store.
    pub session: Arc<SessionStore>,
    /// Redirect targets used by every gate evaluation.
    pub routes: Arc<RoleRoutes>,
}
