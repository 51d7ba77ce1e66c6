//! Shared plumbing for the credential issuer crates: logging setup,
//! runtime directory checks and small response types.

pub mod env;
pub mod types;
pub mod utils;
