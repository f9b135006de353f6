use crate::constants::SHA1_LEN;
use crate::urlcodec::url_encode;

/// Announce event reported to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Started,
    Stopped,
    Completed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Started => "started",
            Event::Stopped => "stopped",
            Event::Completed => "completed",
        }
    }

    /// Event field of a UDP announce. "No event" is 0.
    pub fn udp_code(&self) -> u32 {
        match self {
            Event::Completed => 1,
            Event::Started => 2,
            Event::Stopped => 3,
        }
    }
}

/// One announce to one tracker.
///
/// Built with [`TrackerRequest::builder`]; optional parameters that are left
/// unset are not sent at all.
///
/// # Examples
///
/// ```
/// use btwire::tracker::{build_request_url, Event, TrackerRequest};
///
/// let request = TrackerRequest::builder("http://t.example/announce", [0xaa; 20], *b"-BW0100-123456789012", 6881)
///     .left(1000)
///     .compact(true)
///     .event(Event::Started)
///     .build();
///
/// let url = build_request_url(&request);
/// assert!(url.starts_with("http://t.example/announce?info_hash=%AA%AA"));
/// assert!(url.ends_with("&left=1000&compact=1&event=started"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerRequest {
    pub announce: String,
    pub info_hash: [u8; SHA1_LEN],
    pub peer_id: [u8; SHA1_LEN],
    pub port: u16,
    pub uploaded: u64,
    pub downloaded: u64,
    pub left: u64,
    pub compact: Option<bool>,
    pub no_peer_id: Option<bool>,
    pub event: Option<Event>,
    pub ip: Option<String>,
    pub numwant: Option<u32>,
    pub key: Option<String>,
    pub trackerid: Option<String>,
}

impl TrackerRequest {
    pub fn builder(
        announce: impl Into<String>,
        info_hash: [u8; SHA1_LEN],
        peer_id: [u8; SHA1_LEN],
        port: u16,
    ) -> TrackerRequestBuilder {
        TrackerRequestBuilder {
            request: TrackerRequest {
                announce: announce.into(),
                info_hash,
                peer_id,
                port,
                uploaded: 0,
                downloaded: 0,
                left: 0,
                compact: None,
                no_peer_id: None,
                event: None,
                ip: None,
                numwant: None,
                key: None,
                trackerid: None,
            },
        }
    }
}

/// Fluent builder for [`TrackerRequest`].
#[derive(Debug, Clone)]
pub struct TrackerRequestBuilder {
    request: TrackerRequest,
}

impl TrackerRequestBuilder {
    pub fn uploaded(mut self, uploaded: u64) -> Self {
        self.request.uploaded = uploaded;
        self
    }

    pub fn downloaded(mut self, downloaded: u64) -> Self {
        self.request.downloaded = downloaded;
        self
    }

    pub fn left(mut self, left: u64) -> Self {
        self.request.left = left;
        self
    }

    /// Some trackers treat `compact=0` differently from no `compact` at all,
    /// so this is only sent when set.
    pub fn compact(mut self, compact: bool) -> Self {
        self.request.compact = Some(compact);
        self
    }

    pub fn no_peer_id(mut self, no_peer_id: bool) -> Self {
        self.request.no_peer_id = Some(no_peer_id);
        self
    }

    pub fn event(mut self, event: Event) -> Self {
        self.request.event = Some(event);
        self
    }

    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.request.ip = Some(ip.into());
        self
    }

    pub fn numwant(mut self, numwant: u32) -> Self {
        self.request.numwant = Some(numwant);
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.request.key = Some(key.into());
        self
    }

    pub fn trackerid(mut self, trackerid: impl Into<String>) -> Self {
        self.request.trackerid = Some(trackerid.into());
        self
    }

    pub fn build(self) -> TrackerRequest {
        self.request
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Builds the HTTP announce URL for `request`.
///
/// Parameters are appended in a fixed order: `info_hash`, `peer_id`, `port`,
/// `uploaded`, `downloaded`, `left`, then whichever of `compact`,
/// `no_peer_id`, `event`, `ip`, `numwant`, `key`, `trackerid` are set.
pub fn build_request_url(request: &TrackerRequest) -> String {
    let mut url = request.announce.clone();
    url.push(if request.announce.contains('?') { '&' } else { '?' });
    url.push_str(&format!(
        "info_hash={}&peer_id={}&port={}&uploaded={}&downloaded={}&left={}",
        url_encode(&request.info_hash),
        url_encode(&request.peer_id),
        request.port,
        request.uploaded,
        request.downloaded,
        request.left
    ));

    if let Some(compact) = request.compact {
        url.push_str("&compact=");
        url.push_str(flag(compact));
    }
    if let Some(no_peer_id) = request.no_peer_id {
        url.push_str("&no_peer_id=");
        url.push_str(flag(no_peer_id));
    }
    if let Some(event) = request.event {
        url.push_str("&event=");
        url.push_str(event.as_str());
    }
    if let Some(ref ip) = request.ip {
        url.push_str("&ip=");
        url.push_str(&url_encode(ip.as_bytes()));
    }
    if let Some(numwant) = request.numwant {
        url.push_str(&format!("&numwant={}", numwant));
    }
    if let Some(ref key) = request.key {
        url.push_str("&key=");
        url.push_str(&url_encode(key.as_bytes()));
    }
    if let Some(ref trackerid) = request.trackerid {
        url.push_str("&trackerid=");
        url.push_str(&url_encode(trackerid.as_bytes()));
    }

    url
}

/// Derives the scrape URL from an announce URL.
///
/// The last `/`-separated segment must begin with `announce`; that word is
/// replaced by `scrape` and anything after it (`.php`, a query) is kept.
/// Returns `None` when the tracker does not follow this convention, which
/// means it does not support scraping.
///
/// Each of `info_hashes` is appended as an `info_hash` parameter.
///
/// ```
/// use btwire::tracker::scrape_url;
///
/// assert_eq!(
///     scrape_url("http://example.com/announce.php", &[]).as_deref(),
///     Some("http://example.com/scrape.php")
/// );
/// assert_eq!(scrape_url("http://example.com/a", &[]), None);
/// ```
pub fn scrape_url(announce: &str, info_hashes: &[[u8; SHA1_LEN]]) -> Option<String> {
    let slash = announce.rfind('/')?;
    let suffix = announce[slash + 1..].strip_prefix("announce")?;

    let mut url = format!("{}scrape{}", &announce[..=slash], suffix);

    let mut separator = if url.contains('?') { '&' } else { '?' };
    for info_hash in info_hashes {
        url.push(separator);
        url.push_str("info_hash=");
        url.push_str(&url_encode(info_hash));
        separator = '&';
    }

    Some(url)
}
