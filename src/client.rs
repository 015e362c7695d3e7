use crate::agents::AgentsApi;
use crate::auth::AuthApi;
use crate::credentials::{CredentialStore, FileCredentials, MemoryCredentials, default_token_path};
use crate::error::ClientResult;
use crate::preferences::PreferencesApi;
use crate::transport::Transport;
use reqwest::Client as HttpClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            connect_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Picks the credential store: an explicit token stays in memory, otherwise
/// the token file (default `~/.mealworm/access.token`) is used.
pub fn resolve_credentials(
    explicit: Option<String>,
    token_file: Option<PathBuf>,
) -> Arc<dyn CredentialStore> {
    if let Some(token) = explicit {
        return Arc::new(MemoryCredentials::with_token(token));
    }

    Arc::new(FileCredentials::new(
        token_file.unwrap_or_else(default_token_path),
    ))
}

/// Entry point wiring one transport into every API group.
#[derive(Clone)]
pub struct MealwormClient {
    transport: Transport,
}

impl MealwormClient {
    pub fn new(config: ClientConfig, credentials: Arc<dyn CredentialStore>) -> ClientResult<Self> {
        // Cookies set by the auth endpoints ride along as a fallback to the
        // bearer token.
        let mut builder = HttpClient::builder().cookie_store(true);
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            transport: Transport::new(config.base_url, http, credentials),
        })
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        self.transport.credentials()
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.transport.clone())
    }

    pub fn preferences(&self) -> PreferencesApi {
        PreferencesApi::new(self.transport.clone())
    }

    pub fn agents(&self) -> AgentsApi {
        AgentsApi::new(self.transport.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RunRequest;
    use crate::test_support;
    use axum::Json;
    use axum::http::HeaderMap;
    use axum::http::header::{COOKIE, SET_COOKIE};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use serde_json::json;

    #[test]
    fn explicit_token_wins_over_file() {
        let store = resolve_credentials(
            Some("from-flag".to_string()),
            Some(PathBuf::from("/nonexistent/token")),
        );
        assert_eq!(store.get().as_deref(), Some("from-flag"));
    }

    #[test]
    fn missing_token_file_means_no_credential() {
        let store = resolve_credentials(None, Some(PathBuf::from("/nonexistent/token")));
        assert_eq!(store.get(), None);
    }

    #[tokio::test]
    async fn cookie_from_login_is_sent_back() {
        let app = axum::Router::new()
            .route(
                "/v1/auth/login",
                post(|| async {
                    (
                        [(SET_COOKIE, "access_token=cookie-jwt; Path=/; HttpOnly")],
                        Json(json!({
                            "user": {"id": 1, "email": "a@b.c", "created_at": "2025-01-01"},
                            "access_token": "jwt",
                        })),
                    )
                        .into_response()
                }),
            )
            .route(
                "/v1/agents/:agent_id/runs",
                post(|headers: HeaderMap| async move {
                    let cookie = headers
                        .get(COOKIE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("none")
                        .to_string();
                    Json(json!({"content": cookie}))
                }),
            );
        let base = test_support::serve(app).await;

        let config = ClientConfig {
            base_url: format!("{}/", base),
            ..Default::default()
        };
        let client = MealwormClient::new(config, Arc::new(MemoryCredentials::new())).unwrap();
        assert_eq!(client.base_url(), base);

        client
            .auth()
            .login(&crate::protocol::Credentials {
                email: "a@b.c".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(client.credentials().get().as_deref(), Some("jwt"));

        let outcome = client
            .agents()
            .run("meal_planning_agent", &RunRequest::new("hi"), |_| async {})
            .await
            .unwrap();
        assert_eq!(
            outcome,
            crate::agents::RunOutcome::Content("access_token=cookie-jwt".to_string())
        );
    }
}
