/// Durable client-side key-value storage
///
/// Stands in for the browser's localStorage: a flat string-to-string map
/// holding the session triple (access token, serialized profile, refresh
/// token) and independent preference keys. Two backends - an in-process map
/// for mock mode and tests, and a single JSON file for real runs.
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Well-known storage keys
pub mod keys {
    pub const AUTH_TOKEN: &str = "auth_token";
    pub const USER_DATA: &str = "user_data";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const LANGUAGE: &str = "language";
    pub const THEME: &str = "theme";
}

/// Key-value storage backend
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;
    async fn remove(&self, key: &str) -> AppResult<()>;

    /// Remove the whole session triple. Callers treat this as atomic: there
    /// is no point at which a token survives without its profile.
    async fn clear_session(&self) -> AppResult<()> {
        self.remove(keys::AUTH_TOKEN).await?;
        self.remove(keys::USER_DATA).await?;
        self.remove(keys::REFRESH_TOKEN).await?;
        Ok(())
    }
}

/// In-process storage backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// File-backed storage backend
///
/// The whole map is rewritten on every mutation; entries are few and small
/// so this stays simple rather than clever.
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Open (or create) the backing file and load existing entries.
    /// A corrupt file is treated as empty rather than fatal - losing cached
    /// session state is recoverable, refusing to start is not.
    pub async fn open(path: PathBuf) -> AppResult<Self> {
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!("Discarding corrupt state file {:?}: {}", path, e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(AppError::Io(e)),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let contents = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {:?}: {}", self.path, e)))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries).await
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();

        store.set(keys::AUTH_TOKEN, "tok").await.unwrap();
        assert_eq!(
            store.get(keys::AUTH_TOKEN).await.unwrap(),
            Some("tok".to_string())
        );

        store.remove(keys::AUTH_TOKEN).await.unwrap();
        assert_eq!(store.get(keys::AUTH_TOKEN).await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_session_removes_all_three_keys() {
        let store = MemoryStore::new();
        store.set(keys::AUTH_TOKEN, "a").await.unwrap();
        store.set(keys::USER_DATA, "b").await.unwrap();
        store.set(keys::REFRESH_TOKEN, "c").await.unwrap();
        store.set(keys::LANGUAGE, "yo").await.unwrap();

        store.clear_session().await.unwrap();

        assert_eq!(store.get(keys::AUTH_TOKEN).await.unwrap(), None);
        assert_eq!(store.get(keys::USER_DATA).await.unwrap(), None);
        assert_eq!(store.get(keys::REFRESH_TOKEN).await.unwrap(), None);
        // Preference keys are independent of the session
        assert_eq!(
            store.get(keys::LANGUAGE).await.unwrap(),
            Some("yo".to_string())
        );
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonFileStore::open(path.clone()).await.unwrap();
        store.set(keys::THEME, "dark").await.unwrap();
        drop(store);

        let reopened = JsonFileStore::open(path).await.unwrap();
        assert_eq!(
            reopened.get(keys::THEME).await.unwrap(),
            Some("dark".to_string())
        );
    }

    #[tokio::test]
    async fn corrupt_file_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, "not json{{").await.unwrap();

        let store = JsonFileStore::open(path).await.unwrap();
        assert_eq!(store.get(keys::AUTH_TOKEN).await.unwrap(), None);
    }
}
