use std::fmt;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::state::session::SessionSnapshot;
use crate::state::wedding::WeddingSnapshot;

/// Top-level navigation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    /// Email sign-in and one-time-code verification.
    Auth,
    /// Pick, create or join a wedding.
    Onboarding,
    /// Tabbed planning screens for the active wedding.
    Main,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Flow::Auth => "auth",
            Flow::Onboarding => "onboarding",
            Flow::Main => "main",
        };
        f.write_str(name)
    }
}

/// Main-flow tabs, in display order.
pub const MAIN_TABS: [&str; 6] = ["Dashboard", "Guests", "Tasks", "Vendors", "Budget", "Design"];

/// Picks the flow to show. `None` until both the session lookup and the
/// wedding store read have completed, so the wrong flow never flashes.
pub fn select_flow(session: &SessionSnapshot, wedding: &WeddingSnapshot) -> Option<Flow> {
    if !session.ready || !wedding.ready {
        return None;
    }
    Some(match (session.is_signed_in(), wedding.wedding_id.is_some()) {
        (false, _) => Flow::Auth,
        (true, false) => Flow::Onboarding,
        (true, true) => Flow::Main,
    })
}

/// Re-evaluates [`select_flow`] on every session or wedding change and
/// publishes only when the selected flow actually differs. A token refresh
/// keeps the session present and therefore never switches flows.
pub struct NavigationGate {
    rx: watch::Receiver<Option<Flow>>,
    task: JoinHandle<()>,
}

impl NavigationGate {
    pub fn spawn(
        mut sessions: watch::Receiver<SessionSnapshot>,
        mut weddings: watch::Receiver<WeddingSnapshot>,
    ) -> Self {
        let initial = select_flow(&sessions.borrow_and_update(), &weddings.borrow_and_update());
        let (tx, rx) = watch::channel(initial);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = sessions.changed() => if changed.is_err() { break },
                    changed = weddings.changed() => if changed.is_err() { break },
                }
                let flow = select_flow(&sessions.borrow_and_update(), &weddings.borrow_and_update());
                tx.send_if_modified(|current| {
                    if *current == flow {
                        return false;
                    }
                    tracing::info!(from = ?current, to = ?flow, "navigation flow changed");
                    *current = flow;
                    true
                });
            }
        });

        Self { rx, task }
    }

    pub fn current(&self) -> Option<Flow> {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Flow>> {
        self.rx.clone()
    }

    /// Waits until a flow has been selected.
    pub async fn ready(&self) -> Option<Flow> {
        let mut rx = self.rx.clone();
        let flow = match rx.wait_for(Option::is_some).await {
            Ok(flow) => *flow,
            Err(_) => None,
        };
        flow
    }
}

impl Drop for NavigationGate {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Session, User};
    use proptest::prelude::*;

    fn session(token: &str) -> Session {
        Session {
            access_token: token.to_string(),
            refresh_token: None,
            expires_at: None,
            user: User {
                id: "u1".to_string(),
                email: None,
                role: None,
            },
        }
    }

    fn snapshots(
        token: Option<&str>,
        wedding: Option<&str>,
        ready: bool,
    ) -> (SessionSnapshot, WeddingSnapshot) {
        (
            SessionSnapshot {
                ready,
                session: token.map(session),
            },
            WeddingSnapshot {
                ready,
                wedding_id: wedding.map(str::to_string),
            },
        )
    }

    #[test]
    fn truth_table() {
        let (s, w) = snapshots(None, None, true);
        assert_eq!(select_flow(&s, &w), Some(Flow::Auth));
        let (s, w) = snapshots(Some("tok"), None, true);
        assert_eq!(select_flow(&s, &w), Some(Flow::Onboarding));
        let (s, w) = snapshots(Some("tok"), Some("w1"), true);
        assert_eq!(select_flow(&s, &w), Some(Flow::Main));
        let (s, w) = snapshots(None, Some("w1"), true);
        assert_eq!(select_flow(&s, &w), Some(Flow::Auth));
    }

    #[test]
    fn waits_for_both_sources() {
        let (mut s, w) = snapshots(Some("tok"), Some("w1"), true);
        s.ready = false;
        assert_eq!(select_flow(&s, &w), None);

        let (s, mut w) = snapshots(Some("tok"), Some("w1"), true);
        w.ready = false;
        assert_eq!(select_flow(&s, &w), None);
    }

    proptest! {
        #[test]
        fn flow_depends_only_on_presence(
            token in proptest::option::of("[a-z]{1,8}"),
            wedding in proptest::option::of("[a-z0-9]{1,8}"),
            ready in any::<bool>(),
        ) {
            let (s, w) = snapshots(token.as_deref(), wedding.as_deref(), ready);
            let flow = select_flow(&s, &w);
            if !ready {
                prop_assert_eq!(flow, None);
            } else {
                let expected = match (token.is_some(), wedding.is_some()) {
                    (false, _) => Flow::Auth,
                    (true, false) => Flow::Onboarding,
                    (true, true) => Flow::Main,
                };
                prop_assert_eq!(flow, Some(expected));
            }
        }
    }

    #[tokio::test]
    async fn token_refresh_does_not_republish() {
        let (s, w) = snapshots(Some("tok-1"), Some("w1"), true);
        let (session_tx, session_rx) = watch::channel(s);
        let (_wedding_tx, wedding_rx) = watch::channel(w);
        let gate = NavigationGate::spawn(session_rx, wedding_rx);
        let mut flows = gate.subscribe();
        assert_eq!(*flows.borrow_and_update(), Some(Flow::Main));

        session_tx.send_modify(|snapshot| {
            if let Some(session) = snapshot.session.as_mut() {
                session.access_token = "tok-2".to_string();
            }
        });
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!flows.has_changed().unwrap());

        session_tx.send_modify(|snapshot| snapshot.session = None);
        flows.changed().await.unwrap();
        assert_eq!(*flows.borrow(), Some(Flow::Auth));
    }

    #[tokio::test]
    async fn ready_waits_for_the_first_flow() {
        let (mut s, w) = snapshots(Some("tok"), None, true);
        s.ready = false;
        let (session_tx, session_rx) = watch::channel(s);
        let (_wedding_tx, wedding_rx) = watch::channel(w);
        let gate = NavigationGate::spawn(session_rx, wedding_rx);
        assert_eq!(gate.current(), None);

        session_tx.send_modify(|snapshot| snapshot.ready = true);
        let flow = tokio::time::timeout(std::time::Duration::from_secs(2), gate.ready())
            .await
            .unwrap();
        assert_eq!(flow, Some(Flow::Onboarding));
    }
}
