use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::{AuthChange, AuthEvent, AuthProvider, Session, User};
use crate::error::AppError;

#[derive(Default)]
struct State {
    session: Option<Session>,
    pending: HashSet<String>,
    users: HashMap<String, String>,
}

/// In-process auth provider that accepts a single fixed one-time code.
pub struct MemoryAuth {
    code: String,
    state: Mutex<State>,
    events: broadcast::Sender<AuthChange>,
}

impl MemoryAuth {
    pub fn new(code: &str) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            code: code.to_string(),
            state: Mutex::new(State::default()),
            events,
        }
    }

    /// Installs a session for a known user id without the code exchange.
    pub fn sign_in_as(&self, user_id: &str, email: &str) -> Session {
        let session = new_session(user_id, email);
        {
            let mut state = self.state.lock();
            state.users.insert(email.to_string(), user_id.to_string());
            state.session = Some(session.clone());
        }
        self.publish(AuthEvent::SignedIn, Some(session.clone()));
        session
    }

    fn publish(&self, event: AuthEvent, session: Option<Session>) {
        let _ = self.events.send(AuthChange { event, session });
    }
}

fn new_session(user_id: &str, email: &str) -> Session {
    Session {
        access_token: Uuid::new_v4().to_string(),
        refresh_token: Some(Uuid::new_v4().to_string()),
        expires_at: None,
        user: User {
            id: user_id.to_string(),
            email: Some(email.to_string()),
            role: Some("authenticated".to_string()),
        },
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn get_session(&self) -> Result<Option<Session>, AppError> {
        Ok(self.state.lock().session.clone())
    }

    async fn get_user(&self) -> Result<Option<User>, AppError> {
        Ok(self.state.lock().session.as_ref().map(|s| s.user.clone()))
    }

    async fn sign_in_with_otp(&self, email: &str) -> Result<(), AppError> {
        self.state.lock().pending.insert(email.to_string());
        Ok(())
    }

    async fn verify_otp(&self, email: &str, code: &str) -> Result<Session, AppError> {
        let session = {
            let mut state = self.state.lock();
            if code != self.code || !state.pending.remove(email) {
                return Err(AppError::Auth("Token has expired or is invalid".to_string()));
            }
            let user_id = state
                .users
                .entry(email.to_string())
                .or_insert_with(|| Uuid::new_v4().to_string())
                .clone();
            let session = new_session(&user_id, email);
            state.session = Some(session.clone());
            session
        };
        self.publish(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn refresh_session(&self) -> Result<Option<Session>, AppError> {
        let session = {
            let mut state = self.state.lock();
            let Some(current) = state.session.as_mut() else {
                return Ok(None);
            };
            current.access_token = Uuid::new_v4().to_string();
            current.clone()
        };
        self.publish(AuthEvent::TokenRefreshed, Some(session.clone()));
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        self.state.lock().session = None;
        self.publish(AuthEvent::SignedOut, None);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn code_exchange_requires_a_pending_request() {
        let auth = MemoryAuth::new("123456");
        assert!(auth.verify_otp("a@example.com", "123456").await.is_err());

        auth.sign_in_with_otp("a@example.com").await.unwrap();
        assert!(auth.verify_otp("a@example.com", "000000").await.is_err());
        auth.sign_in_with_otp("a@example.com").await.unwrap();
        let session = auth.verify_otp("a@example.com", "123456").await.unwrap();
        assert_eq!(session.user.email.as_deref(), Some("a@example.com"));
    }

    #[tokio::test]
    async fn refresh_keeps_the_user() {
        let auth = MemoryAuth::new("123456");
        let mut events = auth.subscribe();
        let first = auth.sign_in_as("u1", "u1@example.com");
        let refreshed = auth.refresh_session().await.unwrap().unwrap();
        assert_eq!(refreshed.user.id, "u1");
        assert_ne!(refreshed.access_token, first.access_token);

        assert_eq!(events.recv().await.unwrap().event, AuthEvent::SignedIn);
        assert_eq!(events.recv().await.unwrap().event, AuthEvent::TokenRefreshed);
    }
}
