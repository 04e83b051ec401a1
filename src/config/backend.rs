use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Connection settings for the dealership identity backend.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct BackendConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_session_path")]
    pub session_path: String,
    #[serde(default = "default_profile_path")]
    pub profile_path: String,
    /// Unset means requests may hang for as long as the backend does.
    #[serde(default)]
    pub timeout_in_ms: Option<u64>,
    /// Seeds the cookie jar, e.g. `PHPSESSID=...`.
    #[serde(default)]
    pub cookie: Option<String>,
}

fn default_name() -> String {
    "dealership-api".to_string()
}

fn default_session_path() -> String {
    "/check_session.php".to_string()
}

fn default_profile_path() -> String {
    "/get_profile.php".to_string()
}
