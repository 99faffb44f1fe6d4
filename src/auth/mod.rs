//! Auth surface: one-time-code sign-in, sessions and session change events.

pub mod memory;
pub mod rest;

pub use memory::MemoryAuth;
pub use rest::RestAuth;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::AppError;

/// Refresh sessions that expire within this many seconds.
pub const REFRESH_MARGIN_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl Session {
    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at - now <= margin_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

#[derive(Debug, Clone)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn get_session(&self) -> Result<Option<Session>, AppError>;

    async fn get_user(&self) -> Result<Option<User>, AppError>;

    /// Sends a one-time code to `email`, creating the account on first use.
    async fn sign_in_with_otp(&self, email: &str) -> Result<(), AppError>;

    async fn verify_otp(&self, email: &str, code: &str) -> Result<Session, AppError>;

    async fn refresh_session(&self) -> Result<Option<Session>, AppError>;

    async fn sign_out(&self) -> Result<(), AppError>;

    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}

/// Keeps the session fresh in the background, checking every `every`.
pub fn spawn_refresher(auth: Arc<dyn AuthProvider>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let session = match auth.get_session().await {
                Ok(Some(session)) => session,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Session lookup failed: {}", e);
                    continue;
                }
            };
            let now = chrono::Utc::now().timestamp();
            if session.refresh_token.is_none()
                || !session.expires_within(now, REFRESH_MARGIN_SECS)
            {
                continue;
            }
            match auth.refresh_session().await {
                Ok(_) => tracing::debug!("Session refreshed"),
                Err(e) => tracing::error!("Session refresh failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: Option<i64>) -> Session {
        Session {
            access_token: "tok".to_string(),
            refresh_token: Some("ref".to_string()),
            expires_at,
            user: User {
                id: "u1".to_string(),
                email: None,
                role: None,
            },
        }
    }

    #[test]
    fn expiry_window() {
        assert!(session(Some(1_000)).expires_within(900, 300));
        assert!(!session(Some(10_000)).expires_within(900, 300));
        assert!(!session(None).expires_within(900, 300));
    }
}
