//! Manifest extractor interface

use crate::ExtractError;
use async_trait::async_trait;

/// Finds the media manifest URL behind a source page
///
/// Implementations are shared across workers, so they must be `Send + Sync`.
/// The batch runner calls [`reset_session_cache`](Self::reset_session_cache)
/// between sub-batches to let the implementation release per-session state.
#[async_trait]
pub trait ManifestExtractor: Send + Sync {
    /// Looks up the manifest URL for `url`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(manifest))` - A manifest URL was found
    /// * `Ok(None)` - The page has no manifest; the runner counts this as a failed attempt
    /// * `Err(ExtractError)` - The attempt failed
    async fn extract_manifest_url(&self, url: &str) -> Result<Option<String>, ExtractError>;

    /// Drops any state cached during the current session
    fn reset_session_cache(&self);
}
