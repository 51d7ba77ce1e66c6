use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tracing::info;

use super::domain::{CredentialRecord, PutOutcome};
use super::repository::CredentialRepository;
use crate::errors::ServiceError;
use crate::storage::json_map_store::{Insert, JsonMapStore};

/// File-backed credential store.
/// Keeps a map of `credential id -> record` persisted as one JSON document.
pub struct CredentialStore {
    store: Arc<JsonMapStore<String, CredentialRecord>>,
}

impl CredentialStore {
    /// Load every persisted record. Creates the file if missing; fails if it
    /// exists but is not a valid collection of records.
    pub async fn load<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonMapStore::<String, CredentialRecord>::new(path).await?;
        // the key is the record's id; anything else means two keys can hold one id
        if let Some((key, record)) = store.list().await.into_iter().find(|(k, r)| *k != r.id) {
            return Err(ServiceError::Storage(format!(
                "{}: entry {key:?} holds a record with id {:?}",
                store.file_path().display(),
                record.id
            )));
        }
        info!(path = %store.file_path().display(), records = store.len().await, "credential store loaded");
        Ok(Arc::new(Self { store }))
    }

    pub async fn exists(&self, id: &str) -> bool {
        self.store.contains_key(&id.to_string()).await
    }

    pub async fn get(&self, id: &str) -> Option<CredentialRecord> {
        self.store.get(&id.to_string()).await
    }

    /// Insert a new record and persist the collection before returning.
    /// An id that is already present is left untouched and its record is
    /// returned as [`PutOutcome::Existing`].
    pub async fn put(&self, record: CredentialRecord) -> Result<PutOutcome, ServiceError> {
        match self.store.insert_if_absent(record.id.clone(), record.clone()).await? {
            Insert::Inserted => Ok(PutOutcome::Inserted(record)),
            Insert::Existing(existing) => Ok(PutOutcome::Existing(existing)),
        }
    }

    pub async fn len(&self) -> usize {
        self.store.len().await
    }

    /// All records, oldest issuance first.
    pub async fn list(&self) -> Vec<CredentialRecord> {
        let mut records: Vec<_> = self.store.list().await.into_iter().map(|(_, v)| v).collect();
        records.sort_by(|a, b| a.issued_at.cmp(&b.issued_at).then_with(|| a.id.cmp(&b.id)));
        records
    }
}

#[async_trait]
impl CredentialRepository for CredentialStore {
    async fn exists(&self, id: &str) -> bool { self.exists(id).await }
    async fn get(&self, id: &str) -> Option<CredentialRecord> { self.get(id).await }
    async fn put(&self, record: CredentialRecord) -> Result<PutOutcome, ServiceError> { self.put(record).await }
    async fn count(&self) -> usize { self.len().await }
}
