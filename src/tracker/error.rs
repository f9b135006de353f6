use thiserror::Error;

/// Errors from talking to a tracker.
///
/// A tracker that answers with a failure message is not an error: that
/// comes back as [`TrackerResponse::Failure`](super::TrackerResponse::Failure).
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bencode error: {0}")]
    Bencode(#[from] crate::bencode::BencodeError),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timeout")]
    Timeout,

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The request cannot be expressed for this tracker (bad `ip`, `key`,
    /// too many scrape hashes). Raised before any I/O.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The announce URL has no `announce` segment to turn into a scrape URL.
    #[error("tracker does not support scrape: {0}")]
    ScrapeUnsupported(String),
}
