use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument};

use super::domain::{CredentialId, CredentialRecord, IssueResult, IssueStatus, PutOutcome, VerifyResult};
use super::repository::CredentialRepository;
use crate::errors::ServiceError;

/// Issuance and verification logic, independent of the web framework.
pub struct CredentialService {
    repo: Arc<dyn CredentialRepository>,
    worker_id: String,
}

impl CredentialService {
    pub fn new(repo: Arc<dyn CredentialRepository>, worker_id: impl Into<String>) -> Self {
        Self { repo, worker_id: worker_id.into() }
    }

    /// Identity stamped on records issued by this instance.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub async fn count(&self) -> usize {
        self.repo.count().await
    }

    /// Issue a credential, at most once per id.
    ///
    /// # Examples
    /// ```
    /// use service::credential::{repository::mock::MockCredentialRepository, CredentialService};
    /// use service::credential::domain::IssueStatus;
    /// use std::sync::Arc;
    /// let svc = CredentialService::new(Arc::new(MockCredentialRepository::default()), "worker-1");
    /// let first = tokio_test::block_on(svc.issue(Some("cred-101"))).unwrap();
    /// assert_eq!(first.status, IssueStatus::Issued);
    /// let again = tokio_test::block_on(svc.issue(Some("cred-101"))).unwrap();
    /// assert_eq!(again.status, IssueStatus::AlreadyIssued);
    /// assert_eq!(again.record, first.record);
    /// ```
    #[instrument(skip(self), fields(worker = %self.worker_id))]
    pub async fn issue(&self, raw_id: Option<&str>) -> Result<IssueResult, ServiceError> {
        let id = CredentialId::parse(raw_id)?;

        if let Some(existing) = self.repo.get(id.as_str()).await {
            debug!(credential_id = %id, issued_by = %existing.worker_id, "already issued");
            return Ok(IssueResult { status: IssueStatus::AlreadyIssued, record: existing });
        }

        let record = CredentialRecord {
            id: id.into_inner(),
            worker_id: self.worker_id.clone(),
            issued_at: Utc::now(),
        };
        match self.repo.put(record).await {
            Ok(PutOutcome::Inserted(record)) => {
                info!(credential_id = %record.id, issued_at = %record.issued_at, "credential_issued");
                Ok(IssueResult { status: IssueStatus::Issued, record })
            }
            // lost the race to a concurrent issuance of the same id
            Ok(PutOutcome::Existing(existing)) => {
                debug!(credential_id = %existing.id, issued_by = %existing.worker_id, "already issued");
                Ok(IssueResult { status: IssueStatus::AlreadyIssued, record: existing })
            }
            Err(e) => {
                error!(error = %e, "credential issuance not persisted");
                Err(e)
            }
        }
    }

    /// Look up a credential. An unknown id is a normal `Unknown` result.
    ///
    /// # Examples
    /// ```
    /// use service::credential::{repository::mock::MockCredentialRepository, CredentialService};
    /// use std::sync::Arc;
    /// let svc = CredentialService::new(Arc::new(MockCredentialRepository::default()), "worker-1");
    /// let res = tokio_test::block_on(svc.verify(Some("cred-999"))).unwrap();
    /// assert!(!res.is_valid());
    /// ```
    #[instrument(skip(self))]
    pub async fn verify(&self, raw_id: Option<&str>) -> Result<VerifyResult, ServiceError> {
        let id = CredentialId::parse(raw_id)?;
        Ok(match self.repo.get(id.as_str()).await {
            Some(record) => VerifyResult::Valid(record),
            None => VerifyResult::Unknown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::repository::mock::MockCredentialRepository;
    use crate::credential::store::CredentialStore;

    fn service(repo: Arc<dyn CredentialRepository>) -> CredentialService {
        CredentialService::new(repo, "worker-1")
    }

    #[tokio::test]
    async fn issue_then_reissue_reports_original() -> anyhow::Result<()> {
        let svc = service(Arc::new(MockCredentialRepository::default()));

        let first = svc.issue(Some("cred-101")).await?;
        assert_eq!(first.status, IssueStatus::Issued);
        assert_eq!(first.record.id, "cred-101");
        assert_eq!(first.record.worker_id, "worker-1");

        let second = svc.issue(Some("cred-101")).await?;
        assert_eq!(second.status, IssueStatus::AlreadyIssued);
        assert_eq!(second.record.worker_id, first.record.worker_id);
        assert_eq!(second.record.issued_at, first.record.issued_at);
        assert_eq!(svc.count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn reissue_keeps_worker_of_original_issuer() -> anyhow::Result<()> {
        let repo = Arc::new(MockCredentialRepository::default());
        let a = CredentialService::new(repo.clone(), "worker-1");
        let b = CredentialService::new(repo, "worker-2");

        let issued = a.issue(Some("cred-7")).await?;
        let again = b.issue(Some("cred-7")).await?;
        assert_eq!(again.status, IssueStatus::AlreadyIssued);
        assert_eq!(again.record, issued.record);
        assert_eq!(again.record.worker_id, "worker-1");
        Ok(())
    }

    #[tokio::test]
    async fn verify_matches_issue() -> anyhow::Result<()> {
        let svc = service(Arc::new(MockCredentialRepository::default()));
        let issued = svc.issue(Some("cred-101")).await?;

        let verified = svc.verify(Some("cred-101")).await?;
        assert_eq!(verified, VerifyResult::Valid(issued.record));

        let unknown = svc.verify(Some("cred-999")).await?;
        assert!(!unknown.is_valid());
        assert!(unknown.record().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn ids_are_trimmed_before_lookup() -> anyhow::Result<()> {
        let svc = service(Arc::new(MockCredentialRepository::default()));
        svc.issue(Some("  cred-5\n")).await?;
        assert!(svc.verify(Some("cred-5")).await?.is_valid());
        assert_eq!(svc.issue(Some("cred-5")).await?.status, IssueStatus::AlreadyIssued);
        Ok(())
    }

    #[tokio::test]
    async fn blank_or_missing_id_is_rejected_without_side_effects() -> anyhow::Result<()> {
        let svc = service(Arc::new(MockCredentialRepository::default()));
        for raw in [None, Some(""), Some("   ")] {
            assert!(matches!(svc.issue(raw).await, Err(ServiceError::Validation(_))));
            assert!(matches!(svc.verify(raw).await, Err(ServiceError::Validation(_))));
        }
        assert_eq!(svc.count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn storage_failure_propagates_and_nothing_is_visible() -> anyhow::Result<()> {
        let repo = Arc::new(MockCredentialRepository::default());
        repo.fail_writes(true);
        let svc = service(repo.clone());

        assert!(matches!(svc.issue(Some("cred-1")).await, Err(ServiceError::Storage(_))));
        assert!(!svc.verify(Some("cred-1")).await?.is_valid());

        // caller may retry once storage recovers
        repo.fail_writes(false);
        assert_eq!(svc.issue(Some("cred-1")).await?.status, IssueStatus::Issued);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_issuance_creates_one_record() -> anyhow::Result<()> {
        let tmp = std::env::temp_dir().join(format!("svc_concurrent_{}.json", uuid::Uuid::new_v4()));
        let store = CredentialStore::load(&tmp).await?;
        let svc = Arc::new(service(store.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.issue(Some("cred-race")).await })
            })
            .collect();

        let mut results = Vec::new();
        for h in handles {
            results.push(h.await??);
        }
        let issued = results.iter().filter(|r| r.status == IssueStatus::Issued).count();
        assert_eq!(issued, 1);
        assert!(results.iter().all(|r| r.record == results[0].record));
        assert_eq!(store.len().await, 1);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn records_survive_restart() -> anyhow::Result<()> {
        let tmp = std::env::temp_dir().join(format!("svc_restart_{}.json", uuid::Uuid::new_v4()));
        let before = {
            let svc = service(CredentialStore::load(&tmp).await?);
            vec![svc.issue(Some("a")).await?.record, svc.issue(Some("b")).await?.record]
        };

        let svc = CredentialService::new(CredentialStore::load(&tmp).await?, "worker-2");
        for rec in before {
            assert_eq!(svc.verify(Some(rec.id.as_str())).await?, VerifyResult::Valid(rec.clone()));
            let again = svc.issue(Some(rec.id.as_str())).await?;
            assert_eq!(again.status, IssueStatus::AlreadyIssued);
            assert_eq!(again.record, rec);
        }

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
