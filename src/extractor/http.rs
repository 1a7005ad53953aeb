//! HTTP page scanner
//!
//! Fetches the source page with a plain GET and scans the returned markup for
//! a manifest reference. Pages that only reveal their manifest after running
//! scripts in a browser are reported as "not found".

use crate::config::ExtractorConfig;
use crate::extractor::scan::find_manifest_url;
use crate::extractor::ManifestExtractor;
use crate::ExtractError;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with the configured user agent and timeout
pub fn build_http_client(config: &ExtractorConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`ManifestExtractor`] backed by `reqwest` and `scraper`
///
/// Found manifests are cached per page URL until the next
/// [`reset_session_cache`](ManifestExtractor::reset_session_cache).
pub struct HttpManifestExtractor {
    client: Client,
    cache: Mutex<HashMap<String, String>>,
}

impl HttpManifestExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self, ExtractError> {
        let client = build_http_client(config).map_err(ExtractError::Client)?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of pages currently cached
    pub fn cached_pages(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    fn cached(&self, url: &str) -> Option<String> {
        self.cache.lock().ok()?.get(url).cloned()
    }

    fn remember(&self, url: &str, manifest: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(url.to_string(), manifest.to_string());
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<(Url, String), ExtractError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ExtractError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Relative references resolve against where redirects ended up
        let final_url = response.url().clone();
        let body = response.text().await.map_err(|source| ExtractError::Http {
            url: url.to_string(),
            source,
        })?;

        Ok((final_url, body))
    }
}

#[async_trait]
impl ManifestExtractor for HttpManifestExtractor {
    async fn extract_manifest_url(&self, url: &str) -> Result<Option<String>, ExtractError> {
        Url::parse(url).map_err(|source| ExtractError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        if let Some(manifest) = self.cached(url) {
            tracing::debug!("Cache hit for {}", url);
            return Ok(Some(manifest));
        }

        let (final_url, body) = self.fetch_page(url).await?;
        let manifest = find_manifest_url(&body, &final_url);

        if let Some(manifest) = &manifest {
            self.remember(url, manifest);
        }
        Ok(manifest)
    }

    fn reset_session_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            tracing::debug!("Clearing {} cached pages", cache.len());
            cache.clear();
        }
    }
}
