use crate::credentials::CredentialStore;
use crate::error::{ClientResult, TransportError};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client as HttpClient, Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

/// Issues one authenticated HTTP call per request against the API base URL.
#[derive(Clone)]
pub struct Transport {
    base_url: String,
    http: HttpClient,
    credentials: Arc<dyn CredentialStore>,
}

impl Transport {
    pub fn new(
        base_url: impl Into<String>,
        http: HttpClient,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            http,
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Sends the request and returns the raw response on a 2xx status.
    ///
    /// Headers are layered: JSON content type, then the bearer token if the
    /// store holds one, then `overrides`, which replace any earlier value for
    /// the same name.
    pub async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        overrides: HeaderMap,
    ) -> ClientResult<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let headers = self.headers(overrides)?;

        let mut request = self.http.request(method.clone(), &url).headers(headers);
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        debug!(%method, %url, "issuing request");
        let response = request.send().await?;
        let status = response.status();
        debug!(%method, %url, status = status.as_u16(), "response received");

        if !status.is_success() {
            return Err(error_from_response(response).await.into());
        }

        Ok(response)
    }

    /// Sends a request and parses the 2xx body as JSON.
    pub async fn json<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, HeaderMap::new()).await?;
        Ok(response.json().await?)
    }

    fn headers(&self, overrides: HeaderMap) -> ClientResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.credentials.get() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        headers.extend(overrides);
        Ok(headers)
    }
}

async fn error_from_response(response: Response) -> TransportError {
    let status = response.status().as_u16();
    let body = response.bytes().await.unwrap_or_default();
    let err = TransportError::from_body(status, &body);
    warn!(status, message = %err.message, "request failed");
    err
}

pub(crate) fn normalize_base_url(value: &str) -> String {
    value.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentials;
    use crate::error::ClientError;
    use crate::test_support;
    use axum::Json;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use serde_json::{Value, json};

    async fn echo_headers(headers: AxumHeaders) -> Json<Value> {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(ToOwned::to_owned)
        };
        Json(json!({
            "authorization": get("authorization"),
            "content_type": get("content-type"),
            "x_trace": get("x-trace"),
        }))
    }

    async fn echo_body(Json(body): Json<Value>) -> Json<Value> {
        Json(body)
    }

    fn transport(base_url: &str, credentials: MemoryCredentials) -> Transport {
        Transport::new(base_url, HttpClient::new(), Arc::new(credentials))
    }

    #[tokio::test]
    async fn attaches_bearer_token_and_json_content_type() {
        let app = axum::Router::new().route("/headers", get(echo_headers));
        let base = test_support::serve(app).await;

        let transport = transport(&base, MemoryCredentials::with_token("jwt-1"));
        let seen: Value = transport
            .json::<(), _>(Method::GET, "/headers", None)
            .await
            .unwrap();

        assert_eq!(seen["authorization"], "Bearer jwt-1");
        assert_eq!(seen["content_type"], "application/json");
    }

    #[tokio::test]
    async fn omits_authorization_without_token() {
        let app = axum::Router::new().route("/headers", get(echo_headers));
        let base = test_support::serve(app).await;

        let transport = transport(&base, MemoryCredentials::new());
        let seen: Value = transport
            .json::<(), _>(Method::GET, "/headers", None)
            .await
            .unwrap();

        assert_eq!(seen["authorization"], Value::Null);
    }

    #[tokio::test]
    async fn caller_overrides_win() {
        let app = axum::Router::new().route("/headers", get(echo_headers));
        let base = test_support::serve(app).await;

        let mut overrides = HeaderMap::new();
        overrides.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        overrides.insert(AUTHORIZATION, HeaderValue::from_static("Bearer override"));
        overrides.insert("x-trace", HeaderValue::from_static("abc"));

        let transport = transport(&base, MemoryCredentials::with_token("jwt-1"));
        let response = transport
            .send::<()>(Method::GET, "/headers", None, overrides)
            .await
            .unwrap();
        let seen: Value = response.json().await.unwrap();

        assert_eq!(seen["content_type"], "text/plain");
        assert_eq!(seen["authorization"], "Bearer override");
        assert_eq!(seen["x_trace"], "abc");
    }

    #[tokio::test]
    async fn sends_json_body() {
        let app = axum::Router::new().route("/echo", post(echo_body));
        let base = test_support::serve(app).await;

        let transport = transport(&base, MemoryCredentials::new());
        let body = json!({"message": "hi", "stream": false});
        let echoed: Value = transport
            .json(Method::POST, "/echo", Some(&body))
            .await
            .unwrap();

        assert_eq!(echoed, body);
    }

    #[tokio::test]
    async fn non_success_with_detail_is_transport_error() {
        let app = axum::Router::new().route(
            "/fail",
            get(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({"detail": "Not allowed"})),
                )
                    .into_response()
            }),
        );
        let base = test_support::serve(app).await;

        let transport = transport(&base, MemoryCredentials::new());
        let err = transport
            .json::<(), Value>(Method::GET, "/fail", None)
            .await
            .unwrap_err();

        match err {
            ClientError::Transport(err) => {
                assert_eq!(err, TransportError::new(403, "Not allowed"));
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_success_with_garbage_body_uses_default_message() {
        let app = axum::Router::new().route(
            "/fail",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream exploded").into_response() }),
        );
        let base = test_support::serve(app).await;

        let transport = transport(&base, MemoryCredentials::new());
        let err = transport
            .json::<(), Value>(Method::GET, "/fail", None)
            .await
            .unwrap_err();

        match err {
            ClientError::Transport(err) => {
                assert_eq!(err.status, 502);
                assert_eq!(err.message, "An error occurred");
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn base_url_is_normalized() {
        let transport = transport("http://localhost:8000//", MemoryCredentials::new());
        assert_eq!(transport.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn rejects_token_that_is_not_a_header_value() {
        let transport = transport("http://127.0.0.1:9", MemoryCredentials::with_token("bad\ntoken"));
        let err = transport
            .send::<()>(Method::GET, "/", None, HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidCredential(_)));
    }
}
