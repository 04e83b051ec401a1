use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::base::{BackendError, IdentityBackend};
use crate::config::BackendConfig;
use crate::models::{Profile, SessionCheck, SessionCheckPayload};

/// Identity backend reached over HTTP. Every request goes through one
/// client with a shared cookie jar, so the session cookie set by the backend
/// (or seeded from config) rides along on both calls.
pub struct HttpIdentityBackend {
    config: BackendConfig,
    client: reqwest::Client,
    session_url: Url,
    profile_url: Url,
}

fn endpoint(base_url: &str, path: &str) -> Result<Url, BackendError> {
    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|_| BackendError::InvalidUrl(joined))
}

impl HttpIdentityBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let session_url = endpoint(&config.base_url, &config.session_path)?;
        let profile_url = endpoint(&config.base_url, &config.profile_path)?;

        let jar = Arc::new(Jar::default());
        if let Some(cookie) = &config.cookie {
            jar.add_cookie_str(cookie, &session_url);
        }

        let mut builder = reqwest::Client::builder().cookie_provider(jar);
        if let Some(ms) = config.timeout_in_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder.build()?;

        info!(
            "Identity backend '{}': session={}, profile={}, timeout={:?}",
            config.name, session_url, profile_url, config.timeout_in_ms
        );

        Ok(Self {
            config: config.clone(),
            client,
            session_url,
            profile_url,
        })
    }

    fn classify(&self, error: reqwest::Error) -> BackendError {
        match self.config.timeout_in_ms {
            Some(ms) if error.is_timeout() => BackendError::Timeout(ms),
            _ => BackendError::Transport(error),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, BackendError> {
        debug!("Sending GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait::async_trait]
impl IdentityBackend for HttpIdentityBackend {
    fn get_name(&self) -> &str {
        &self.config.name
    }

    async fn verify_session(&self) -> Result<SessionCheck, BackendError> {
        let payload: SessionCheckPayload = self.get_json(&self.session_url).await?;
        if !payload.success {
            return Err(BackendError::Rejected(
                payload
                    .message
                    .unwrap_or_else(|| "success=false".to_string()),
            ));
        }
        Ok(payload.into())
    }

    async fn fetch_profile(&self) -> Result<Profile, BackendError> {
        self.get_json(&self.profile_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountType;
    use mockito::Server;
    use serde_json::json;

    fn config_for(base_url: String) -> BackendConfig {
        BackendConfig {
            name: "test-backend".to_string(),
            base_url,
            session_path: "/check_session.php".to_string(),
            profile_path: "/get_profile.php".to_string(),
            timeout_in_ms: None,
            cookie: None,
        }
    }

    #[test]
    fn test_endpoint_joins_slashes() {
        let url = endpoint("http://dealer.test/api/", "/check_session.php").unwrap();
        assert_eq!(url.as_str(), "http://dealer.test/api/check_session.php");
        assert!(matches!(
            endpoint("not a url", "x"),
            Err(BackendError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_session_logged_in() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/check_session.php")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"isLoggedIn": true, "userId": 12, "accountType": "admin"}"#)
            .create_async()
            .await;

        let backend = HttpIdentityBackend::new(&config_for(server.url())).unwrap();
        let check = backend.verify_session().await.unwrap();
        m.assert_async().await;
        assert_eq!(check, SessionCheck::logged_in("12", AccountType::Admin));
    }

    #[tokio::test]
    async fn test_verify_session_logged_out() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/check_session.php")
            .with_status(200)
            .with_body(r#"{"isLoggedIn": false}"#)
            .create_async()
            .await;

        let backend = HttpIdentityBackend::new(&config_for(server.url())).unwrap();
        let check = backend.verify_session().await.unwrap();
        assert!(!check.is_logged_in);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/check_session.php")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let backend = HttpIdentityBackend::new(&config_for(server.url())).unwrap();
        let result = backend.verify_session().await;
        assert!(matches!(result, Err(BackendError::Status(500))));
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/check_session.php")
            .with_status(200)
            .with_body("<b>Warning</b>: session_start()")
            .create_async()
            .await;

        let backend = HttpIdentityBackend::new(&config_for(server.url())).unwrap();
        let result = backend.verify_session().await;
        assert!(matches!(result, Err(BackendError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_success_false_is_rejected() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/check_session.php")
            .with_status(200)
            .with_body(r#"{"success": false, "message": "Session expired"}"#)
            .create_async()
            .await;

        let backend = HttpIdentityBackend::new(&config_for(server.url())).unwrap();
        match backend.verify_session().await {
            Err(BackendError::Rejected(message)) => assert_eq!(message, "Session expired"),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_seeded_cookie_is_sent_on_both_calls() {
        let mut server = Server::new_async().await;
        let session = server
            .mock("GET", "/check_session.php")
            .match_header("cookie", "PHPSESSID=abc123")
            .with_status(200)
            .with_body(r#"{"isLoggedIn": true, "userId": "u1", "accountType": "customer"}"#)
            .create_async()
            .await;
        let profile = server
            .mock("GET", "/get_profile.php")
            .match_header("cookie", "PHPSESSID=abc123")
            .with_status(200)
            .with_body(r#"{"name": "Ana Ruiz", "email": "ana@example.com"}"#)
            .create_async()
            .await;

        let mut config = config_for(server.url());
        config.cookie = Some("PHPSESSID=abc123".to_string());
        let backend = HttpIdentityBackend::new(&config).unwrap();

        backend.verify_session().await.unwrap();
        let fetched = backend.fetch_profile().await.unwrap();
        session.assert_async().await;
        profile.assert_async().await;
        assert_eq!(fetched.get_str("name"), Some("Ana Ruiz"));
    }

    #[tokio::test]
    async fn test_cookie_set_by_backend_is_replayed() {
        let mut server = Server::new_async().await;
        let _session = server
            .mock("GET", "/check_session.php")
            .with_status(200)
            .with_header("set-cookie", "PHPSESSID=fresh; Path=/")
            .with_body(r#"{"isLoggedIn": true, "userId": "u1", "accountType": "staff"}"#)
            .create_async()
            .await;
        let profile = server
            .mock("GET", "/get_profile.php")
            .match_header("cookie", "PHPSESSID=fresh")
            .with_status(200)
            .with_body(json!({"name": "Luis"}).to_string())
            .create_async()
            .await;

        let backend = HttpIdentityBackend::new(&config_for(server.url())).unwrap();
        backend.verify_session().await.unwrap();
        backend.fetch_profile().await.unwrap();
        profile.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_transport_error() {
        // Grab a free port, then close it so nothing is listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = HttpIdentityBackend::new(&config_for(format!("http://{}", addr))).unwrap();
        let result = backend.verify_session().await;
        assert!(matches!(result, Err(BackendError::Transport(_))));
    }

    #[tokio::test]
    async fn test_configured_timeout_applies() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold the connection without ever answering.
        let holder = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let mut config = config_for(format!("http://{}", addr));
        config.timeout_in_ms = Some(100);
        let backend = HttpIdentityBackend::new(&config).unwrap();
        let result = backend.verify_session().await;
        holder.abort();
        assert!(matches!(result, Err(BackendError::Timeout(100))));
    }
}
