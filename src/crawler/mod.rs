//! Concurrent ID-space crawler for the orthophoto download endpoint.
//!
//! Orthophoto archives are only addressable through opaque numeric IDs, so
//! the lookup table used by [`crate::ortho`] has to be discovered by probing
//! the ID space: a HEAD request per candidate ID, reading the
//! Content-Disposition header to learn which tile and year the ID serves.
//! Probes run in fixed-width batches; all probes of a batch are issued
//! concurrently over one shared client and the batch settles as a whole
//! before the next one starts, which caps in-flight load on the portal.
//! The endpoint is flaky under load, so failed IDs get a bounded number of
//! extra rounds before being reported as unresolved.

mod client;
mod parse;

pub use client::{ProbeClient, ReqwestProbeClient};
pub use parse::parse_probe;

use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ortho::OrthoUrlRecord;

/// Default download endpoint, probed with `{id}` substituted.
pub const DEFAULT_ENDPOINT: &str =
    "https://geoportal.geoportal-th.de/gaialight-th/_apps/dladownload/download.php?type=op&id={id}";

/// Default number of IDs probed concurrently per batch.
pub const DEFAULT_BATCH_WIDTH: u64 = 100;

/// Default number of extra rounds for IDs whose probe failed.
pub const DEFAULT_RETRY_ROUNDS: u32 = 2;

/// Default session timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 12_000;

/// Errors that can occur while crawling the ID space.
#[derive(Debug, Error)]
pub enum CrawlerError {
    /// The HTTP client could not be constructed.
    #[error("Probe client setup failed: {0}")]
    Client(String),

    /// The endpoint template carries no `{id}` placeholder.
    #[error("Endpoint template '{0}' has no {{id}} placeholder")]
    InvalidEndpoint(String),
}

/// Configuration for the ID crawler.
///
/// # Example
///
/// ```
/// use geoharvest::crawler::CrawlerConfig;
///
/// let config = CrawlerConfig::new()
///     .with_batch_width(50)
///     .with_retry_rounds(1);
/// assert_eq!(config.batch_width(), 50);
/// ```
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    endpoint: String,
    batch_width: u64,
    retry_rounds: u32,
    timeout: Duration,
}

impl CrawlerConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            batch_width: DEFAULT_BATCH_WIDTH,
            retry_rounds: DEFAULT_RETRY_ROUNDS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Sets the endpoint template. Must contain an `{id}` placeholder.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the number of IDs probed concurrently per batch.
    pub fn with_batch_width(mut self, batch_width: u64) -> Self {
        self.batch_width = batch_width.max(1);
        self
    }

    /// Sets the number of extra rounds for failed IDs.
    pub fn with_retry_rounds(mut self, retry_rounds: u32) -> Self {
        self.retry_rounds = retry_rounds;
        self
    }

    /// Sets the session timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the endpoint template.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the batch width.
    pub fn batch_width(&self) -> u64 {
        self.batch_width
    }

    /// Returns the number of extra retry rounds.
    pub fn retry_rounds(&self) -> u32 {
        self.retry_rounds
    }

    /// Returns the session timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Renders the probe URL for one ID.
    fn url_for(&self, id: u64) -> String {
        self.endpoint.replace("{id}", &id.to_string())
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of crawling an ID range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOutcome {
    /// Successfully resolved lookup rows, in ID order per batch.
    pub records: Vec<OrthoUrlRecord>,
    /// IDs whose probes kept failing after all retry rounds.
    pub unresolved: Vec<u64>,
}

/// Crawls the download endpoint's ID space in concurrent batches.
pub struct IdCrawler<C: ProbeClient> {
    client: C,
    config: CrawlerConfig,
}

impl IdCrawler<ReqwestProbeClient> {
    /// Creates a crawler backed by a real HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Client`] if the HTTP client cannot be
    /// constructed, or [`CrawlerError::InvalidEndpoint`] if the endpoint
    /// template lacks the `{id}` placeholder.
    pub fn new(config: CrawlerConfig) -> Result<Self, CrawlerError> {
        let client = ReqwestProbeClient::new(config.timeout())?;
        Self::with_client(client, config)
    }
}

impl<C: ProbeClient> IdCrawler<C> {
    /// Creates a crawler over an injected probe client.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::InvalidEndpoint`] if the endpoint template
    /// lacks the `{id}` placeholder.
    pub fn with_client(client: C, config: CrawlerConfig) -> Result<Self, CrawlerError> {
        if !config.endpoint.contains("{id}") {
            return Err(CrawlerError::InvalidEndpoint(config.endpoint));
        }
        Ok(Self { client, config })
    }

    /// Crawls the half-open ID range `start..stop`.
    ///
    /// Batches never overlap in time: each batch's probes are issued
    /// concurrently, the whole batch settles, its failed IDs get their
    /// retry rounds, and only then does the next batch start. One probe
    /// failing never affects its siblings. IDs still failing after all
    /// rounds end up in [`CrawlOutcome::unresolved`].
    pub async fn crawl_range(&self, start: u64, stop: u64) -> CrawlOutcome {
        let mut records = Vec::new();
        let mut unresolved = Vec::new();

        let mut batch_start = start;
        while batch_start < stop {
            let batch_stop = stop.min(batch_start + self.config.batch_width);
            let ids: Vec<u64> = (batch_start..batch_stop).collect();
            debug!(from = batch_start, to = batch_stop, "Probing ID batch");

            let (mut resolved, mut failed) = self.probe_batch(&ids).await;

            for _ in 0..self.config.retry_rounds {
                if failed.is_empty() {
                    break;
                }
                debug!(count = failed.len(), "Re-probing failed IDs");
                let (recovered, still_failed) = self.probe_batch(&failed).await;
                resolved.extend(recovered);
                failed = still_failed;
            }

            for raw in &resolved {
                if let Some(record) = parse_probe(raw) {
                    records.push(record);
                }
            }
            if !failed.is_empty() {
                warn!(count = failed.len(), "IDs left unresolved after retries");
                unresolved.extend(failed);
            }

            batch_start = batch_stop;
        }

        info!(
            records = records.len(),
            unresolved = unresolved.len(),
            "ID crawl finished"
        );
        CrawlOutcome {
            records,
            unresolved,
        }
    }

    /// Probes one batch of IDs concurrently.
    ///
    /// Returns the settled raw strings (header joined to URL) and the IDs
    /// whose probe failed.
    async fn probe_batch(&self, ids: &[u64]) -> (Vec<String>, Vec<u64>) {
        let probes = ids.iter().map(|&id| {
            let url = self.config.url_for(id);
            async move {
                let disposition = self.client.head_content_disposition(&url).await;
                (id, url, disposition)
            }
        });

        let mut resolved = Vec::new();
        let mut failed = Vec::new();
        for (id, url, disposition) in join_all(probes).await {
            match disposition {
                Some(header) => resolved.push(format!("{}__{}", header, url)),
                None => failed.push(id),
            }
        }
        (resolved, failed)
    }
}
