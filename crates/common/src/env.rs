//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::info;

/// Ensure the media directory (and the car cover sub-directory) exists.
pub async fn ensure_media_dir(media_dir: &str) -> anyhow::Result<()> {
    let covers = format!("{media_dir}/garage/car_covers");
    if tokio::fs::metadata(&covers).await.is_err() {
        info!(%covers, "creating media directory");
    }
    tokio::fs::create_dir_all(&covers)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {covers}: {e}"))?;
    Ok(())
}
