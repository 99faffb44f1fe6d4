//! Durable local key-value storage for small secrets and pointers
//! (the active wedding id, the persisted auth session).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::AppError;

#[async_trait]
pub trait SecureStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    /// Removes the key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// One file per key inside a private directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700)).await?;
        }
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> Result<PathBuf, AppError> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            || key.starts_with('.')
        {
            return Err(AppError::Storage(format!("Invalid storage key: {key:?}")));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl SecureStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match tokio::fs::read_to_string(self.path(key)?).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.path(key)?;
        let tmp = self.dir.join(format!(".{key}.tmp"));
        tokio::fs::write(&tmp, value).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600)).await?;
        }
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        match tokio::fs::remove_file(self.path(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().contains_key(key)
    }
}

#[async_trait]
impl SecureStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).await.unwrap();
            store.set("current_wedding_id", "w1").await.unwrap();
        }
        let store = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get("current_wedding_id").await.unwrap().as_deref(), Some("w1"));
    }

    #[tokio::test]
    async fn file_store_delete_leaves_no_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.set("current_wedding_id", "w1").await.unwrap();
        store.delete("current_wedding_id").await.unwrap();
        store.delete("current_wedding_id").await.unwrap();
        assert_eq!(store.get("current_wedding_id").await.unwrap(), None);
        assert!(!dir.path().join("current_wedding_id").exists());
    }

    #[tokio::test]
    async fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        assert!(store.set("../escape", "x").await.is_err());
        assert!(store.get("").await.is_err());
    }
}
