use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::auth::{AuthChange, AuthProvider, Session};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// The initial session lookup has completed.
    pub ready: bool,
    pub session: Option<Session>,
}

impl SessionSnapshot {
    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }
}

/// Tracks the current authenticated session, fed by the auth provider's
/// change notifications.
pub struct SessionState {
    tx: watch::Sender<SessionSnapshot>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionSnapshot::default());
        Self { tx }
    }

    /// Resolves the initial session and keeps following auth events.
    ///
    /// The subscription is taken before the lookup so no change is missed in
    /// between. A failed lookup counts as signed out.
    pub async fn start(self: &Arc<Self>, auth: Arc<dyn AuthProvider>) -> JoinHandle<()> {
        let mut events = auth.subscribe();
        let session = match auth.get_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Initial session lookup failed: {}", e);
                None
            }
        };
        self.tx.send_modify(|snapshot| {
            snapshot.ready = true;
            snapshot.session = session;
        });

        let state = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(change) => state.apply(change),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Missed auth events, re-reading session");
                        match auth.get_session().await {
                            Ok(session) => state.replace(session),
                            Err(e) => tracing::error!("Session lookup failed: {}", e),
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    pub fn apply(&self, change: AuthChange) {
        tracing::debug!(event = ?change.event, "auth change");
        self.replace(change.session);
    }

    fn replace(&self, session: Option<Session>) {
        self.tx.send_modify(|snapshot| {
            snapshot.ready = true;
            snapshot.session = session;
        });
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn user_id(&self) -> Option<String> {
        self.tx
            .borrow()
            .session
            .as_ref()
            .map(|session| session.user.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryAuth;

    #[tokio::test]
    async fn becomes_ready_without_a_session() {
        let auth = Arc::new(MemoryAuth::new("123456"));
        let state = Arc::new(SessionState::new());
        assert!(!state.snapshot().ready);

        let task = state.start(auth).await;
        let snapshot = state.snapshot();
        assert!(snapshot.ready);
        assert!(!snapshot.is_signed_in());
        task.abort();
    }

    #[tokio::test]
    async fn follows_sign_in_and_sign_out() {
        let auth = Arc::new(MemoryAuth::new("123456"));
        let state = Arc::new(SessionState::new());
        let task = state.start(auth.clone()).await;
        let mut rx = state.subscribe();

        auth.sign_in_as("u1", "u1@example.com");
        rx.changed().await.unwrap();
        assert_eq!(state.user_id().as_deref(), Some("u1"));

        auth.sign_out().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(state.user_id(), None);
        task.abort();
    }
}
