//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` to keep binary crates importing
//! `service::runtime::ensure_env` without depending directly on `common`.

/// Warn on a missing frontend directory.
pub async fn ensure_env(frontend_dir: &str) -> bool {
    common::env::ensure_env(frontend_dir).await
}
