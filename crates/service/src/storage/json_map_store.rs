use std::{
    collections::HashMap,
    hash::Hash,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::RwLock};
use tracing::{debug, warn};

use crate::errors::ServiceError;

/// Generic JSON file-backed key-value map store.
///
/// Keeps a `HashMap<K, V>` in memory and rewrites the whole JSON file after
/// every successful mutation. Writes go to a sibling `*.tmp` file that is
/// renamed over the data file, so readers never observe a half-written
/// document.
pub struct JsonMapStore<K, V> {
    inner: RwLock<HashMap<K, V>>,
    file_path: PathBuf,
}

/// Result of [`JsonMapStore::insert_if_absent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Insert<V> {
    Inserted,
    /// The key was already taken; carries the stored value untouched.
    Existing(V),
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone + std::fmt::Debug,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Load the store from a path. A missing file yields an empty map (and the
    /// file is created); a file that exists but does not parse is an error.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_err("create directory", parent, e))?;
        }

        let (map, fresh) = match fs::read(&file_path).await {
            // a zero-length file (e.g. `touch`ed by an operator) counts as empty
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => (HashMap::new(), true),
            Ok(bytes) => {
                let map: HashMap<K, V> = serde_json::from_slice(&bytes)
                    .map_err(|e| storage_err("parse", &file_path, e))?;
                (map, false)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => (HashMap::new(), true),
            Err(e) => return Err(storage_err("read", &file_path, e)),
        };

        let store = Self { inner: RwLock::new(map), file_path };
        if fresh {
            let map = store.inner.read().await;
            store.persist(&map).await?;
        }
        Ok(Arc::new(store))
    }

    async fn persist(&self, map: &HashMap<K, V>) -> Result<(), ServiceError> {
        let data = serde_json::to_vec_pretty(map)
            .map_err(|e| storage_err("serialize", &self.file_path, e))?;
        let tmp = self.tmp_path();
        if let Err(e) = fs::write(&tmp, &data).await {
            return Err(storage_err("write", &tmp, e));
        }
        if let Err(e) = fs::rename(&tmp, &self.file_path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(storage_err("replace", &self.file_path, e));
        }
        debug!(path = %self.file_path.display(), entries = map.len(), "store persisted");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .file_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.file_path.with_file_name(name)
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// List all entries as `(key, value)` pairs.
    pub async fn list(&self) -> Vec<(K, V)> {
        let map = self.inner.read().await;
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    pub async fn contains_key(&self, key: &K) -> bool {
        self.inner.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Insert `value` under `key` unless the key is already present, then
    /// persist. The write lock is held across check, insert and persist; if
    /// persisting fails the insert is undone before the lock is released.
    pub async fn insert_if_absent(&self, key: K, value: V) -> Result<Insert<V>, ServiceError> {
        let mut map = self.inner.write().await;
        if let Some(existing) = map.get(&key) {
            return Ok(Insert::Existing(existing.clone()));
        }
        map.insert(key.clone(), value);
        if let Err(e) = self.persist(&map).await {
            map.remove(&key);
            warn!(?key, error = %e, "persist failed; in-memory insert rolled back");
            return Err(e);
        }
        Ok(Insert::Inserted)
    }
}

fn storage_err(action: &str, path: &Path, e: impl std::fmt::Display) -> ServiceError {
    ServiceError::Storage(format!("{action} {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_file(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("json_map_store_{tag}_{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn json_map_store_insert_and_reload() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("crud");
        let store = JsonMapStore::<String, String>::new(&tmp).await?;

        // initially empty, and the file exists
        assert!(store.is_empty().await);
        assert!(fs::metadata(&tmp).await.is_ok());

        assert_eq!(store.insert_if_absent("a".into(), "1".into()).await?, Insert::Inserted);
        assert_eq!(store.insert_if_absent("b".into(), "2".into()).await?, Insert::Inserted);
        assert!(store.contains_key(&"a".into()).await);
        assert_eq!(store.get(&"a".into()).await.as_deref(), Some("1"));

        // second insert keeps the first value
        let again = store.insert_if_absent("a".into(), "10".into()).await?;
        assert_eq!(again, Insert::Existing("1".to_string()));

        let reloaded = JsonMapStore::<String, String>::new(&tmp).await?;
        assert_eq!(reloaded.len().await, 2);
        assert_eq!(reloaded.get(&"a".into()).await.as_deref(), Some("1"));
        assert!(fs::metadata(reloaded.tmp_path()).await.is_err());

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn malformed_file_is_rejected() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("malformed");
        fs::write(&tmp, b"{ not json").await?;
        let res = JsonMapStore::<String, String>::new(&tmp).await;
        assert!(matches!(res, Err(ServiceError::Storage(_))));

        // wrong shape is malformed too
        fs::write(&tmp, b"[1, 2, 3]").await?;
        let res = JsonMapStore::<String, String>::new(&tmp).await;
        assert!(matches!(res, Err(ServiceError::Storage(_))));

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn blank_file_loads_empty() -> Result<(), anyhow::Error> {
        let tmp = tmp_file("blank");
        fs::write(&tmp, b"").await?;
        let store = JsonMapStore::<String, String>::new(&tmp).await?;
        assert!(store.is_empty().await);
        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn creates_missing_directories_and_file() -> Result<(), anyhow::Error> {
        let root = std::env::temp_dir().join(format!("json_map_store_nested_{}", uuid::Uuid::new_v4()));
        let path = root.join("a").join("b").join("map.json");
        let store = JsonMapStore::<String, String>::new(&path).await?;
        assert!(store.is_empty().await);
        assert_eq!(fs::read_to_string(&path).await?.trim(), "{}");
        let _ = fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_persist_rolls_back() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("json_map_store_dir_{}", uuid::Uuid::new_v4()));
        let path = dir.join("map.json");
        let store = JsonMapStore::<String, String>::new(&path).await?;

        // pull the directory out from under the store
        fs::remove_dir_all(&dir).await?;
        let res = store.insert_if_absent("k".into(), "v".into()).await;
        assert!(matches!(res, Err(ServiceError::Storage(_))));
        assert!(!store.contains_key(&"k".into()).await);
        assert!(store.is_empty().await);
        Ok(())
    }
}
