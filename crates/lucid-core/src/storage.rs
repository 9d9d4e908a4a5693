use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{LucidError, LucidResult};
use crate::models::AuthToken;

pub const AUTH_KEY: &str = "lucid.auth";

type Result<T> = LucidResult<T>;

enum Backend {
    File(PathBuf),
    Memory(Mutex<BTreeMap<String, Value>>),
}

/// Small persistent key/value store. The auth token lives under `AUTH_KEY`;
/// a missing key means logged out.
pub struct TokenStore {
    backend: Backend,
    /// Held across every read-modify-write.
    writer: tokio::sync::Mutex<()>,
}

impl TokenStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::File(path.into()),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(BTreeMap::new())),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.backend {
            Backend::File(p) => Some(p),
            Backend::Memory(_) => None,
        }
    }

    async fn read_all(&self) -> Result<BTreeMap<String, Value>> {
        match &self.backend {
            Backend::File(path) => match tokio::fs::read(path).await {
                Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
                Ok(bytes) => serde_json::from_slice(&bytes).or_else(|e| {
                    warn!("Discarding unreadable store {}: {}", path.display(), e);
                    Ok(BTreeMap::new())
                }),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
                Err(e) => Err(LucidError::Storage(format!("{}: {}", path.display(), e))),
            },
            Backend::Memory(map) => {
                let entries = lock(map)?.clone();
                Ok(entries)
            }
        }
    }

    async fn write_all(&self, entries: BTreeMap<String, Value>) -> Result<()> {
        match &self.backend {
            Backend::File(path) => {
                let bytes = serde_json::to_vec_pretty(&entries)?;
                let path = path.clone();
                tokio::task::spawn_blocking(move || replace_file(&path, &bytes))
                    .await
                    .map_err(|e| LucidError::Storage(e.to_string()))?
            }
            Backend::Memory(map) => {
                let mut guard = lock(map)?;
                *guard = entries;
                drop(guard);
                Ok(())
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let entries = self.read_all().await?;
        match entries.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
        let _guard = self.writer.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), serde_json::to_value(data)?);
        self.write_all(entries).await
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.writer.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(entries).await?;
        }
        Ok(())
    }

    /// A stored value that no longer parses is treated as logged out.
    pub async fn load_auth(&self) -> Result<Option<AuthToken>> {
        match self.get::<AuthToken>(AUTH_KEY).await {
            Ok(token) => Ok(token),
            Err(LucidError::Json(e)) => {
                warn!("Ignoring malformed stored auth: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn save_auth(&self, token: &AuthToken) -> Result<()> {
        debug!("Persisting auth token");
        self.set(AUTH_KEY, token).await
    }

    pub async fn clear_auth(&self) -> Result<()> {
        debug!("Clearing auth token");
        self.remove(AUTH_KEY).await
    }
}

/// Writes through a uniquely named sibling temp file and renames it over
/// `path`, so readers never see a partial file.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let storage = |e: std::io::Error| LucidError::Storage(format!("{}: {}", path.display(), e));
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(storage)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(storage)?;
    tmp.write_all(bytes).map_err(storage)?;
    tmp.as_file().sync_all().map_err(storage)?;
    tmp.persist(path).map_err(|e| storage(e.error))?;
    Ok(())
}

fn lock<T>(m: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>> {
    m.lock()
        .map_err(|_| LucidError::Storage("store lock poisoned".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_means_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::open(dir.path().join("storage.json"));
        assert!(store.load_auth().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_load_clear_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        let store = TokenStore::open(&path);

        store.save_auth(&AuthToken::new("abc")).await.unwrap();
        assert!(path.exists());

        let reopened = TokenStore::open(&path);
        let token = reopened.load_auth().await.unwrap().unwrap();
        assert_eq!(token.access_token, "abc");

        reopened.clear_auth().await.unwrap();
        assert!(store.load_auth().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_other_keys_survive_auth_clear() {
        let store = TokenStore::in_memory();
        store.set("theme", &"dark").await.unwrap();
        store.save_auth(&AuthToken::new("abc")).await.unwrap();
        store.clear_auth().await.unwrap();

        let theme: Option<String> = store.get("theme").await.unwrap();
        assert_eq!(theme.as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn test_malformed_auth_is_ignored() {
        let store = TokenStore::in_memory();
        store.set(AUTH_KEY, &serde_json::json!({"nope": true})).await.unwrap();
        assert!(store.load_auth().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = TokenStore::open(&path);
        assert!(store.load_auth().await.unwrap().is_none());
        store.save_auth(&AuthToken::new("fresh")).await.unwrap();
        assert_eq!(
            store.load_auth().await.unwrap().unwrap().access_token,
            "fresh"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(TokenStore::open(dir.path().join("storage.json")));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.set(&format!("key-{}", i), &i).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for i in 0..16 {
            let value: Option<i32> = store.get(&format!("key-{}", i)).await.unwrap();
            assert_eq!(value, Some(i));
        }
    }
}
