use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// One issued credential, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub id: String,
    pub worker_id: String,
    pub issued_at: DateTime<Utc>,
}

/// A caller-supplied identifier that passed validation: present and
/// non-empty once surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialId(String);

impl CredentialId {
    pub fn parse(raw: Option<&str>) -> Result<Self, ServiceError> {
        match raw.map(str::trim) {
            Some(id) if !id.is_empty() => Ok(Self(id.to_string())),
            _ => Err(ServiceError::missing_identifier()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueStatus {
    Issued,
    AlreadyIssued,
}

impl IssueStatus {
    pub fn message(&self) -> &'static str {
        match self {
            IssueStatus::Issued => "Credential issued",
            IssueStatus::AlreadyIssued => "Credential already issued",
        }
    }
}

/// Outcome of an issuance; `record` is always the one on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueResult {
    pub status: IssueStatus,
    pub record: CredentialRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid(CredentialRecord),
    Unknown,
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid(_))
    }

    pub fn record(&self) -> Option<&CredentialRecord> {
        match self {
            VerifyResult::Valid(r) => Some(r),
            VerifyResult::Unknown => None,
        }
    }
}

/// What the repository did with a `put`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted(CredentialRecord),
    /// Another record already held this id; nothing was written.
    Existing(CredentialRecord),
}
