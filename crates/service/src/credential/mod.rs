//! Credential module: three-layer architecture (domain, repository, service).
//!
//! `store` holds the JSON-file implementation of the repository; the service
//! only sees the [`repository::CredentialRepository`] trait.

pub mod domain;
pub mod repository;
pub mod service;
pub mod store;

pub use service::CredentialService;
pub use store::CredentialStore;
