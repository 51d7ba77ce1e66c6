//! Service layer for credential issuance and verification.
//! - Separates issuance rules from data access (`credential::repository`).
//! - Ships a JSON-file store; other backends plug in behind the same trait.
//! - Provides clear error types and documented interfaces.

pub mod credential;
pub mod errors;
pub mod runtime;
pub mod storage;
