use async_trait::async_trait;

use super::domain::{CredentialRecord, PutOutcome};
use crate::errors::ServiceError;

/// Repository abstraction for issued-credential persistence.
///
/// `put` must be atomic with respect to other `put` calls: check, insert and
/// persist happen as one step, and a failed persist leaves nothing behind.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn exists(&self, id: &str) -> bool;
    async fn get(&self, id: &str) -> Option<CredentialRecord>;
    async fn put(&self, record: CredentialRecord) -> Result<PutOutcome, ServiceError>;
    async fn count(&self) -> usize;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockCredentialRepository {
        records: Mutex<HashMap<String, CredentialRecord>>,
        fail_writes: AtomicBool,
    }

    impl MockCredentialRepository {
        /// Make every subsequent `put` fail as if the disk were gone.
        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl CredentialRepository for MockCredentialRepository {
        async fn exists(&self, id: &str) -> bool {
            self.records.lock().unwrap().contains_key(id)
        }

        async fn get(&self, id: &str) -> Option<CredentialRecord> {
            self.records.lock().unwrap().get(id).cloned()
        }

        async fn put(&self, record: CredentialRecord) -> Result<PutOutcome, ServiceError> {
            let mut records = self.records.lock().unwrap();
            if let Some(existing) = records.get(&record.id) {
                return Ok(PutOutcome::Existing(existing.clone()));
            }
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(ServiceError::Storage("mock write failure".into()));
            }
            records.insert(record.id.clone(), record.clone());
            Ok(PutOutcome::Inserted(record))
        }

        async fn count(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }
}
