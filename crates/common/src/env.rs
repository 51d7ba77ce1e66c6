//! Environment/runtime helpers
//!
//! Sanity checks run once at startup. The data file's directory is created
//! by the store that owns it.

use tracing::warn;

/// Warn when the frontend directory is missing. Returns whether it exists.
pub async fn ensure_env(frontend_dir: &str) -> bool {
    let present = tokio::fs::metadata(frontend_dir).await.map(|m| m.is_dir()).unwrap_or(false);
    if !present {
        warn!(%frontend_dir, "frontend assets directory not found; static assets may 404");
    }
    present
}
