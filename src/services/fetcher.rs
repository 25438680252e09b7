//! Content fetcher for menu sources.
//!
//! Downloads a source, fingerprints it with SHA-256 and hands the bytes to
//! a content store. Transport failures are retried with exponential
//! backoff; rejecting statuses are not.

use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::{DownloadResult, FetcherConfig};
use crate::storage::{ContentStore, object_key};
use crate::utils::http::{HttpResponse, Transport};

/// Content type recorded when the server sends none.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Retry schedule for transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub jitter_step: Duration,
}

impl RetryPolicy {
    /// Delay before the attempt following attempt number `attempt` (0-based):
    /// `base * 2^attempt + jitter_step * attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.backoff_base
            .saturating_mul(factor)
            .saturating_add(self.jitter_step.saturating_mul(attempt))
    }

    /// Policy that retries immediately.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff_base: Duration::ZERO,
            jitter_step: Duration::ZERO,
        }
    }
}

impl From<&FetcherConfig> for RetryPolicy {
    fn from(config: &FetcherConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            jitter_step: Duration::from_millis(config.jitter_step_ms),
        }
    }
}

/// Downloads menu sources into a content store.
pub struct ContentFetcher<'a> {
    transport: &'a dyn Transport,
    store: &'a dyn ContentStore,
    retry: RetryPolicy,
}

impl<'a> ContentFetcher<'a> {
    /// Create a new content fetcher.
    pub fn new(
        transport: &'a dyn Transport,
        store: &'a dyn ContentStore,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            store,
            retry,
        }
    }

    /// Download `url` and store it for `source_id`.
    ///
    /// Statuses of 400 and above fail without a retry. Transport failures
    /// are retried up to the policy's budget and then returned.
    pub async fn fetch(&self, source_id: &str, url: &str) -> Result<DownloadResult> {
        let response = self.get_with_retry(url).await?;
        if response.status >= 400 {
            return Err(AppError::status(url, response.status));
        }

        let checksum = checksum(&response.body);
        let media_type = response.media_type();
        let key = object_key(source_id, &checksum, media_type.as_deref());
        let content_type = media_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);

        let locator = self.store.put(&key, &response.body, content_type).await?;
        log::debug!("Downloaded {} ({} bytes) to {}", url, response.body.len(), locator);

        Ok(DownloadResult {
            source_id: source_id.to_string(),
            checksum,
            locator,
        })
    }

    async fn get_with_retry(&self, url: &str) -> Result<HttpResponse> {
        let mut attempt = 0;
        loop {
            match self.transport.fetch(url).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    log::debug!(
                        "GET {} failed (attempt {}): {}. Retrying in {:?}",
                        url,
                        attempt + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::debug!("Giving up on {} after {} attempts: {}", url, attempt + 1, e);
                    return Err(e);
                }
            }
        }
    }
}

/// Lowercase hex SHA-256 digest.
pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalContentStore;
    use crate::testing::FakeTransport;
    use tempfile::TempDir;

    const URL: &str = "http://r.test/kaart.pdf";

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::from(&FetcherConfig::default());
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2200));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::from(&FetcherConfig::default());
        assert!(policy.delay_for(40) >= policy.delay_for(20));
    }

    #[test]
    fn test_checksum_is_sha256_hex() {
        assert_eq!(
            checksum(b"test"),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[tokio::test]
    async fn test_fetch_stores_content() {
        let tmp = TempDir::new().unwrap();
        let store = LocalContentStore::new(tmp.path());
        let transport = FakeTransport::new().respond(URL, 200, "application/pdf", b"test");
        let fetcher = ContentFetcher::new(&transport, &store, RetryPolicy::immediate(3));

        let result = fetcher.fetch("12", URL).await.unwrap();

        assert_eq!(result.source_id, "12");
        assert_eq!(result.checksum, checksum(b"test"));
        let path = tmp.path().join("12-9f86d081.pdf");
        assert_eq!(result.locator, path.to_string_lossy());
        assert_eq!(std::fs::read(path).unwrap(), b"test");
    }

    #[tokio::test]
    async fn test_retries_transport_failures() {
        let tmp = TempDir::new().unwrap();
        let store = LocalContentStore::new(tmp.path());
        let transport = FakeTransport::new()
            .respond(URL, 200, "application/pdf", b"%PDF-1.4")
            .fail_first(URL, 2);
        let fetcher = ContentFetcher::new(&transport, &store, RetryPolicy::immediate(3));

        assert!(fetcher.fetch("1", URL).await.is_ok());
        assert_eq!(transport.calls(URL), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_retry_budget() {
        let tmp = TempDir::new().unwrap();
        let store = LocalContentStore::new(tmp.path());
        let transport = FakeTransport::new()
            .respond(URL, 200, "application/pdf", b"%PDF-1.4")
            .fail_first(URL, 10);
        let fetcher = ContentFetcher::new(&transport, &store, RetryPolicy::immediate(3));

        assert!(matches!(fetcher.fetch("1", URL).await, Err(AppError::Io(_))));
        assert_eq!(transport.calls(URL), 4);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_rejecting_status_is_not_retried() {
        let tmp = TempDir::new().unwrap();
        let store = LocalContentStore::new(tmp.path());
        let transport = FakeTransport::new();
        let fetcher = ContentFetcher::new(&transport, &store, RetryPolicy::immediate(3));

        let result = fetcher.fetch("1", "http://r.test/missing.jpg").await;
        assert!(matches!(result, Err(AppError::Status { status: 404, .. })));
        assert_eq!(transport.calls("http://r.test/missing.jpg"), 1);
    }

    #[tokio::test]
    async fn test_identical_bytes_identical_checksums() {
        let tmp = TempDir::new().unwrap();
        let store = LocalContentStore::new(tmp.path());
        let transport = FakeTransport::new()
            .respond("http://a.test/menu.png", 200, "image/png", b"\x89PNG same")
            .respond("http://b.test/kaart", 200, "image/png; q=1", b"\x89PNG same");
        let fetcher = ContentFetcher::new(&transport, &store, RetryPolicy::immediate(0));

        let a = fetcher.fetch("1", "http://a.test/menu.png").await.unwrap();
        let b = fetcher.fetch("2", "http://b.test/kaart").await.unwrap();
        assert_eq!(a.checksum, b.checksum);
        assert!(b.locator.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_unknown_content_type_uses_bin() {
        let tmp = TempDir::new().unwrap();
        let store = LocalContentStore::new(tmp.path());
        let transport = FakeTransport::new().respond(URL, 200, "", b"??");
        let fetcher = ContentFetcher::new(&transport, &store, RetryPolicy::immediate(0));

        let result = fetcher.fetch("5", URL).await.unwrap();
        assert!(result.locator.ends_with(".bin"));
    }
}
