use crate::error::ClientResult;
use crate::protocol::{AuthResponse, Credentials, MessageResponse, User};
use crate::transport::Transport;
use reqwest::Method;
use tracing::info;

#[derive(Clone)]
pub struct AuthApi {
    transport: Transport,
}

impl AuthApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Creates the account and stores the returned access token.
    pub async fn register(&self, credentials: &Credentials) -> ClientResult<User> {
        self.authenticate("/v1/auth/register", credentials).await
    }

    /// Signs in and stores the returned access token.
    pub async fn login(&self, credentials: &Credentials) -> ClientResult<User> {
        self.authenticate("/v1/auth/login", credentials).await
    }

    /// Ends the server session, then forgets the stored token.
    pub async fn logout(&self) -> ClientResult<MessageResponse> {
        let response: MessageResponse = self
            .transport
            .json::<(), _>(Method::POST, "/v1/auth/logout", None)
            .await?;
        self.transport.credentials().clear()?;
        info!("logged out");
        Ok(response)
    }

    pub async fn me(&self) -> ClientResult<User> {
        self.transport
            .json::<(), _>(Method::GET, "/v1/auth/me", None)
            .await
    }

    async fn authenticate(&self, path: &str, credentials: &Credentials) -> ClientResult<User> {
        let response: AuthResponse = self
            .transport
            .json(Method::POST, path, Some(credentials))
            .await?;
        self.transport
            .credentials()
            .set(&response.access_token)?;
        info!(user = response.user.id, email = %response.user.email, "authenticated");
        Ok(response.user)
    }
}
