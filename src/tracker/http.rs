use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::error::TrackerError;
use super::request::{build_request_url, scrape_url, TrackerRequest};
use super::response::{parse_response, parse_scrape, TrackerResponse, TrackerScrape};
use crate::bencode::decode;
use crate::constants::{HTTP_TRACKER_TIMEOUT, SHA1_LEN, USER_AGENT};

/// Fetches the body of an HTTP GET.
///
/// Redirects, TLS and connection handling belong to the implementation.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<Bytes, TrackerError>;
}

/// [`HttpFetch`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetch {
    client: Client,
}

impl ReqwestFetch {
    pub fn new(config: &HttpTrackerConfig) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(TrackerError::Http)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn get(&self, url: &str) -> Result<Bytes, TrackerError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?)
    }
}

#[derive(Debug, Clone)]
pub struct HttpTrackerConfig {
    /// Bound on one whole request, connect to last body byte.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpTrackerConfig {
    fn default() -> Self {
        Self {
            timeout: HTTP_TRACKER_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// HTTP(S) tracker client ([BEP-3]).
///
/// [BEP-3]: http://bittorrent.org/beps/bep_0003.html
pub struct HttpTracker<F = ReqwestFetch> {
    fetch: F,
    timeout: Duration,
}

impl HttpTracker<ReqwestFetch> {
    pub fn new(config: HttpTrackerConfig) -> Result<Self, TrackerError> {
        let fetch = ReqwestFetch::new(&config)?;
        Ok(Self::with_fetch(fetch, config))
    }
}

impl<F: HttpFetch> HttpTracker<F> {
    pub fn with_fetch(fetch: F, config: HttpTrackerConfig) -> Self {
        Self {
            fetch,
            timeout: config.timeout,
        }
    }

    /// Announces to the tracker named by `request.announce`.
    pub async fn announce(&self, request: &TrackerRequest) -> Result<TrackerResponse, TrackerError> {
        check_scheme(&request.announce)?;
        let url = build_request_url(request);

        debug!(tracker = %request.announce, "http announce");
        let body = self.get(&url).await?;
        let response = parse_response(&decode(&body)?);

        match &response {
            Ok(TrackerResponse::Success(announce)) => {
                debug!(tracker = %request.announce, peers = announce.peers.len(), "http announce ok")
            }
            Ok(TrackerResponse::Failure(reason)) => {
                debug!(tracker = %request.announce, %reason, "tracker refused announce")
            }
            Err(e) => warn!(tracker = %request.announce, error = %e, "bad announce response"),
        }
        response
    }

    /// Scrapes `info_hashes` from the tracker behind `announce`.
    ///
    /// Fails with [`TrackerError::ScrapeUnsupported`] when no scrape URL can
    /// be derived from `announce`.
    pub async fn scrape(
        &self,
        announce: &str,
        info_hashes: &[[u8; SHA1_LEN]],
    ) -> Result<TrackerScrape, TrackerError> {
        check_scheme(announce)?;
        let url = scrape_url(announce, info_hashes)
            .ok_or_else(|| TrackerError::ScrapeUnsupported(announce.to_string()))?;

        debug!(tracker = %announce, hashes = info_hashes.len(), "http scrape");
        let body = self.get(&url).await?;
        parse_scrape(&decode(&body)?)
    }

    async fn get(&self, url: &str) -> Result<Bytes, TrackerError> {
        timeout(self.timeout, self.fetch.get(url))
            .await
            .map_err(|_| TrackerError::Timeout)?
    }
}

fn check_scheme(url: &str) -> Result<(), TrackerError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(TrackerError::InvalidUrl(url.to_string()));
    }
    Ok(())
}
