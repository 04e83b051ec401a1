use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::backend::BackendConfig;
use super::logging::LoggingConfig;
use super::storage::StorageConfig;
use crate::gate::RoleRoutes;

/// Environment variables with this prefix override file values;
/// `__` separates nested keys (`DEALER_SESSION_BACKEND__BASE_URL`).
pub const ENV_PREFIX: &str = "DEALER_SESSION_";

/// Path of the YAML file, overridable through `DEALER_SESSION_CONFIG_FILE`.
pub const CONFIG_FILE_VAR: &str = "DEALER_SESSION_CONFIG_FILE";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub logging: LoggingConfig,
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub routes: RoleRoutes,
    pub bind_address: String,
}

/// Extract a [`ConfigV1`] from any figment; used by [`load_config`] and tests.
pub fn extract_config(figment: Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Load config from the YAML file (default `./config.yaml`) merged with
/// `DEALER_SESSION_*` environment overrides. Exits the process on error.
pub fn load_config() -> ConfigV1 {
    let path = std::env::var(CONFIG_FILE_VAR).unwrap_or_else(|_| "./config.yaml".to_string());
    let figment = Figment::new()
        .merge(Yaml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    match extract_config(figment) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration from '{}': {}", path, e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(Config);
    match serde_json::to_string_pretty(&schema) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => {
            eprintln!("Error rendering configuration schema: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;
    use crate::models::AccountType;

    const MINIMAL: &str = r#"
version: "1.0.0"
logging:
  level: info
  format: console
backend:
  base_url: http://dealer.test/api
storage:
  enabled: true
  type: memory
bind_address: 127.0.0.1:8090
"#;

    #[test]
    fn test_defaults_are_applied() {
        let config = extract_config(Figment::new().merge(Yaml::string(MINIMAL))).unwrap();
        assert_eq!(config.backend.session_path, "/check_session.php");
        assert_eq!(config.backend.profile_path, "/get_profile.php");
        assert!(config.backend.timeout_in_ms.is_none());
        assert!(matches!(
            config.storage.backend,
            Some(StorageBackend::Memory)
        ));
        assert_eq!(config.routes.login, "/login");
        assert_eq!(config.routes.home_for(Some(&AccountType::Admin)), "/admin/dashboard");
        assert_eq!(config.logging.service_name, "dealer-session");
    }

    #[test]
    fn test_role_homes_from_yaml() {
        let yaml = format!(
            "{}\nroutes:\n  login: /signin\n  public_home: /home\n  role_homes:\n    finance: /finance\n",
            MINIMAL
        );
        let config = extract_config(Figment::new().merge(Yaml::string(&yaml))).unwrap();
        assert_eq!(config.routes.login, "/signin");
        assert_eq!(
            config.routes.home_for(Some(&AccountType::from("finance"))),
            "/finance"
        );
        // Only the listed roles get a home; admin now falls through.
        assert_eq!(config.routes.home_for(Some(&AccountType::Admin)), "/home");
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let yaml = MINIMAL.replace("1.0.0", "9.9.9");
        assert!(extract_config(Figment::new().merge(Yaml::string(&yaml))).is_err());
    }

    #[test]
    fn test_env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("DEALER_SESSION_BACKEND__TIMEOUT_IN_MS", "2500");
            let figment = Figment::new()
                .merge(Yaml::string(MINIMAL))
                .merge(Env::prefixed(ENV_PREFIX).split("__"));
            let config = extract_config(figment)?;
            assert_eq!(config.backend.timeout_in_ms, Some(2500));
            Ok(())
        });
    }

    #[test]
    fn test_schema_mentions_sections() {
        let schema = serde_json::to_value(schema_for!(Config)).unwrap();
        let rendered = schema.to_string();
        assert!(rendered.contains("bind_address"));
        assert!(rendered.contains("role_homes"));
    }
}
