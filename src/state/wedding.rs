use std::sync::Arc;

use tokio::sync::watch;

use crate::error::AppError;
use crate::storage::SecureStore;

pub const ACTIVE_WEDDING_KEY: &str = "current_wedding_id";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeddingSnapshot {
    /// The durable store has been read once.
    pub ready: bool,
    pub wedding_id: Option<String>,
}

/// The wedding the user is currently working in, persisted in the secure store.
///
/// One instance is shared by every screen. It is only mutated through
/// [`ActiveWedding::set`].
pub struct ActiveWedding {
    store: Arc<dyn SecureStore>,
    tx: watch::Sender<WeddingSnapshot>,
}

impl ActiveWedding {
    pub fn new(store: Arc<dyn SecureStore>) -> Self {
        let (tx, _) = watch::channel(WeddingSnapshot::default());
        Self { store, tx }
    }

    /// Reads the stored id once. Readiness flips even when nothing was stored
    /// or the read failed; a failed read is returned after that.
    pub async fn init(&self) -> Result<(), AppError> {
        let result = self.store.get(ACTIVE_WEDDING_KEY).await;
        let wedding_id = match &result {
            Ok(value) => value.clone().filter(|id| !id.is_empty()),
            Err(_) => None,
        };
        tracing::debug!(?wedding_id, "active wedding restored");
        self.tx.send_modify(|snapshot| {
            snapshot.ready = true;
            snapshot.wedding_id = wedding_id;
        });
        result.map(|_| ())
    }

    /// Persists `wedding_id` and then publishes it. `None` (or an empty id)
    /// deletes the stored value.
    pub async fn set(&self, wedding_id: Option<&str>) -> Result<(), AppError> {
        let wedding_id = wedding_id.filter(|id| !id.is_empty());
        match wedding_id {
            Some(id) => self.store.set(ACTIVE_WEDDING_KEY, id).await?,
            None => self.store.delete(ACTIVE_WEDDING_KEY).await?,
        }
        tracing::info!(?wedding_id, "active wedding changed");
        self.tx.send_modify(|snapshot| {
            snapshot.ready = true;
            snapshot.wedding_id = wedding_id.map(str::to_string);
        });
        Ok(())
    }

    pub fn current(&self) -> Option<String> {
        self.tx.borrow().wedding_id.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.tx.borrow().ready
    }

    pub fn snapshot(&self) -> WeddingSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WeddingSnapshot> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn ready_after_init_even_when_empty() {
        let wedding = ActiveWedding::new(Arc::new(MemoryStore::new()));
        assert!(!wedding.is_ready());
        wedding.init().await.unwrap();
        assert!(wedding.is_ready());
        assert_eq!(wedding.current(), None);
    }

    #[tokio::test]
    async fn set_round_trips_through_the_store() {
        let store = Arc::new(MemoryStore::new());
        let wedding = ActiveWedding::new(store.clone());
        wedding.init().await.unwrap();

        wedding.set(Some("w1")).await.unwrap();
        assert_eq!(store.get(ACTIVE_WEDDING_KEY).await.unwrap().as_deref(), Some("w1"));

        let fresh = ActiveWedding::new(store.clone());
        fresh.init().await.unwrap();
        assert_eq!(fresh.current().as_deref(), Some("w1"));

        wedding.set(None).await.unwrap();
        assert!(!store.contains(ACTIVE_WEDDING_KEY));
        assert_eq!(store.get(ACTIVE_WEDDING_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_id_is_treated_as_clearing() {
        let store = Arc::new(MemoryStore::new());
        let wedding = ActiveWedding::new(store.clone());
        wedding.set(Some("w1")).await.unwrap();
        wedding.set(Some("")).await.unwrap();
        assert!(!store.contains(ACTIVE_WEDDING_KEY));
        assert_eq!(wedding.current(), None);
    }
}
