use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;

use crate::auth::{AuthChange, AuthEvent, AuthProvider, Session, User};
use crate::client::ApiClient;
use crate::error::AppError;
use crate::storage::SecureStore;

pub const SESSION_KEY: &str = "auth_session";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let now = chrono::Utc::now().timestamp();
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self.expires_at.or(self.expires_in.map(|secs| now + secs)),
            user: self.user,
        }
    }
}

/// Auth service client. The current session is cached in memory and
/// persisted to the secure store so it survives restarts.
pub struct RestAuth {
    api: ApiClient,
    store: Arc<dyn SecureStore>,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthChange>,
}

impl RestAuth {
    pub async fn restore(api: ApiClient, store: Arc<dyn SecureStore>) -> Result<Self, AppError> {
        let session = match store.get(SESSION_KEY).await? {
            Some(raw) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!("Discarding unreadable stored session: {}", e);
                    store.delete(SESSION_KEY).await?;
                    None
                }
            },
            None => None,
        };
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            api,
            store,
            session: RwLock::new(session),
            events,
        })
    }

    pub fn access_token(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.access_token.clone())
    }

    async fn install(&self, event: AuthEvent, session: Option<Session>) -> Result<(), AppError> {
        match &session {
            Some(session) => {
                self.store
                    .set(SESSION_KEY, &serde_json::to_string(session)?)
                    .await?
            }
            None => self.store.delete(SESSION_KEY).await?,
        }
        *self.session.write() = session.clone();
        // No receivers is fine.
        let _ = self.events.send(AuthChange { event, session });
        Ok(())
    }

    async fn token_request(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Session, AppError> {
        let response = self
            .api
            .request(Method::POST, self.api.config().auth_url(path), None)
            .json(&body)
            .send()
            .await?;
        let response = ApiClient::check(response).await?;
        Ok(response.json::<TokenResponse>().await?.into_session())
    }
}

#[async_trait]
impl AuthProvider for RestAuth {
    async fn get_session(&self) -> Result<Option<Session>, AppError> {
        Ok(self.session.read().clone())
    }

    async fn get_user(&self) -> Result<Option<User>, AppError> {
        let Some(token) = self.access_token() else {
            return Ok(None);
        };
        let response = self
            .api
            .request(Method::GET, self.api.config().auth_url("user"), Some(&token))
            .send()
            .await?;
        let response = ApiClient::check(response).await?;
        Ok(Some(response.json::<User>().await?))
    }

    async fn sign_in_with_otp(&self, email: &str) -> Result<(), AppError> {
        let response = self
            .api
            .request(Method::POST, self.api.config().auth_url("otp"), None)
            .json(&json!({ "email": email, "create_user": true }))
            .send()
            .await?;
        ApiClient::check(response).await?;
        tracing::info!("One-time code requested");
        Ok(())
    }

    async fn verify_otp(&self, email: &str, code: &str) -> Result<Session, AppError> {
        let session = self
            .token_request(
                "verify",
                json!({ "type": "email", "email": email, "token": code }),
            )
            .await?;
        self.install(AuthEvent::SignedIn, Some(session.clone()))
            .await?;
        tracing::info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    async fn refresh_session(&self) -> Result<Option<Session>, AppError> {
        let refresh_token = self
            .session
            .read()
            .as_ref()
            .and_then(|s| s.refresh_token.clone());
        let Some(refresh_token) = refresh_token else {
            return Ok(None);
        };
        let session = self
            .token_request(
                "token?grant_type=refresh_token",
                json!({ "refresh_token": refresh_token }),
            )
            .await?;
        self.install(AuthEvent::TokenRefreshed, Some(session.clone()))
            .await?;
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        if let Some(token) = self.access_token() {
            let result = self
                .api
                .request(Method::POST, self.api.config().auth_url("logout"), Some(&token))
                .send()
                .await;
            let result = match result {
                Ok(response) => ApiClient::check(response).await.map(|_| ()),
                Err(e) => Err(e.into()),
            };
            // The local session is dropped even when the server call fails.
            if let Err(e) = result {
                tracing::warn!("Remote sign-out failed: {}", e);
            }
        }
        self.install(AuthEvent::SignedOut, None).await?;
        tracing::info!("Signed out");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}
