//! HTTP probe client abstraction for testability.

use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_DISPOSITION;
use tracing::{trace, warn};

use super::CrawlerError;

/// Trait for probing a download URL's Content-Disposition header.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock probe clients in tests. A probe either yields the
/// header value or fails; the distinction between "no such resource" and
/// a transient transport error is deliberately not surfaced here, because
/// the retry loop treats both the same way.
pub trait ProbeClient: Send + Sync {
    /// Issues a HEAD request and returns the Content-Disposition header.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to probe
    ///
    /// # Returns
    ///
    /// The header value, or `None` when the header is absent or the
    /// request failed.
    fn head_content_disposition(&self, url: &str) -> impl Future<Output = Option<String>> + Send;
}

/// Default User-Agent string for probe requests.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Real probe client implementation using reqwest.
///
/// Uses non-blocking I/O over a shared connection pool so a whole batch
/// of probes reuses the same session instead of opening a connection per
/// request.
#[derive(Clone)]
pub struct ReqwestProbeClient {
    client: reqwest::Client,
}

impl ReqwestProbeClient {
    /// Creates a new ReqwestProbeClient with the given session timeout.
    ///
    /// The timeout covers the whole session, not a single request; the
    /// portal is slow to answer ID probes, so the default configured in
    /// [`super::CrawlerConfig`] is generous.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Client`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self, CrawlerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| CrawlerError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl ProbeClient for ReqwestProbeClient {
    async fn head_content_disposition(&self, url: &str) -> Option<String> {
        trace!(url = url, "HEAD probe starting");

        let response = match self.client.head(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(url = url, error = %e, is_timeout = e.is_timeout(), "HEAD probe failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                url = url,
                status = response.status().as_u16(),
                "HEAD probe returned error status"
            );
            return None;
        }

        let header = response.headers().get(CONTENT_DISPOSITION)?;
        match header.to_str() {
            Ok(value) => {
                trace!(url = url, "HEAD probe resolved");
                Some(value.to_string())
            }
            Err(_) => {
                warn!(url = url, "Content-Disposition header was not valid text");
                None
            }
        }
    }
}
