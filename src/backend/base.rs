use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::http_backend::HttpIdentityBackend;
use crate::config::BackendConfig;
use crate::models::{Profile, SessionCheck};

/// Ways a backend call can fail. The session store treats all of them the
/// same (fail closed); the variants exist for diagnostics.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("error sending request: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("backend reported failure: {0}")]
    Rejected(String),
    #[error("request timed out after {0} ms")]
    Timeout(u64),
    #[error("backend call panicked")]
    Panicked,
    #[error("invalid backend url '{0}'")]
    InvalidUrl(String),
}

/// The identity backend as seen by the session store. Implementations carry
/// the ambient credential themselves; neither call takes parameters.
#[async_trait::async_trait]
pub trait IdentityBackend: Send + Sync {
    fn get_name(&self) -> &str;
    async fn verify_session(&self) -> Result<SessionCheck, BackendError>;
    async fn fetch_profile(&self) -> Result<Profile, BackendError>;
}

/// Create the HTTP identity backend described by `config`.
pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn IdentityBackend>, BackendError> {
    let backend = HttpIdentityBackend::new(config)?;
    info!(
        "Created identity backend '{}' at '{}'",
        config.name, config.base_url
    );
    Ok(Arc::new(backend))
}
