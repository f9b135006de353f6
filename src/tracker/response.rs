use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use bytes::Bytes;

use super::error::TrackerError;
use crate::bencode::Node;
use crate::constants::{COMPACT_PEER_V4_LEN, COMPACT_PEER_V6_LEN, SHA1_LEN};
use crate::urlcodec::url_encode;

/// A peer returned from a tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Only present in the verbose (dictionary) peer form.
    pub peer_id: Option<Bytes>,
    pub ip: IpAddr,
    pub port: u16,
}

impl Peer {
    /// Parses a peer from compact IPv4 format (6 bytes).
    ///
    /// Format: 4 bytes IP + 2 bytes port (big-endian).
    pub fn from_compact_v4(bytes: &[u8]) -> Option<Self> {
        let record: [u8; COMPACT_PEER_V4_LEN] = bytes.get(..COMPACT_PEER_V4_LEN)?.try_into().ok()?;
        let ip = Ipv4Addr::new(record[0], record[1], record[2], record[3]);
        Some(Self {
            peer_id: None,
            ip: IpAddr::V4(ip),
            port: u16::from_be_bytes([record[4], record[5]]),
        })
    }

    /// Parses a peer from compact IPv6 format (18 bytes).
    ///
    /// Format: 16 bytes IP + 2 bytes port (big-endian).
    pub fn from_compact_v6(bytes: &[u8]) -> Option<Self> {
        let record: [u8; COMPACT_PEER_V6_LEN] = bytes.get(..COMPACT_PEER_V6_LEN)?.try_into().ok()?;
        let mut ip_bytes = [0u8; 16];
        ip_bytes.copy_from_slice(&record[..16]);
        Some(Self {
            peer_id: None,
            ip: IpAddr::V6(Ipv6Addr::from(ip_bytes)),
            port: u16::from_be_bytes([record[16], record[17]]),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer[{}", self.addr())?;
        if let Some(ref id) = self.peer_id {
            write!(f, ", peer id: {}", url_encode(id))?;
        }
        f.write_str("]")
    }
}

/// Outcome of an announce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerResponse {
    /// The tracker refused the request; the string is its `failure reason`.
    Failure(String),
    Success(AnnounceResponse),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnounceResponse {
    pub warning_message: Option<String>,
    /// Seconds the client should wait between announces.
    pub interval: u32,
    pub min_interval: Option<u32>,
    pub tracker_id: Option<String>,
    /// Seeders.
    pub complete: Option<u32>,
    /// Leechers.
    pub incomplete: Option<u32>,
    pub peers: Vec<Peer>,
}

impl AnnounceResponse {
    pub fn new(interval: u32) -> Self {
        Self {
            warning_message: None,
            interval,
            min_interval: None,
            tracker_id: None,
            complete: None,
            incomplete: None,
            peers: Vec::new(),
        }
    }
}

/// Outcome of a scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerScrape {
    Failure(String),
    Success(ScrapeResponse),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeResponse {
    /// Statistics keyed by info hash.
    pub files: BTreeMap<[u8; SHA1_LEN], ScrapeFile>,
    /// `flags.min_request_interval`, when the tracker sends it.
    pub min_request_interval: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeFile {
    pub complete: u32,
    pub downloaded: u32,
    pub incomplete: u32,
    pub name: Option<String>,
}

fn invalid(message: impl Into<String>) -> TrackerError {
    TrackerError::InvalidResponse(message.into())
}

fn as_dict<'a>(node: &'a Node, what: &str) -> Result<&'a BTreeMap<Bytes, Node>, TrackerError> {
    node.as_dict()
        .ok_or_else(|| invalid(format!("{} must be a dictionary, found {}", what, node.kind())))
}

/// A present `failure reason` ends parsing whatever its type; one that is
/// not a string makes the whole response invalid.
fn failure_reason(node: &Node) -> Result<Option<String>, TrackerError> {
    let Some(reason) = node.get(b"failure reason") else {
        return Ok(None);
    };
    reason
        .as_bytes()
        .map(|reason| Some(String::from_utf8_lossy(reason).into_owned()))
        .ok_or_else(|| invalid("'failure reason' must be a string"))
}

fn optional_u32(node: &Node, key: &str) -> Result<Option<u32>, TrackerError> {
    let Some(value) = node.get(key.as_bytes()) else {
        return Ok(None);
    };
    let int = value
        .as_integer()
        .ok_or_else(|| invalid(format!("'{}' must be an integer", key)))?;
    u32::try_from(int)
        .map(Some)
        .map_err(|_| invalid(format!("'{}' out of range: {}", key, int)))
}

fn required_u32(node: &Node, key: &str) -> Result<u32, TrackerError> {
    optional_u32(node, key)?.ok_or_else(|| invalid(format!("missing '{}'", key)))
}

fn optional_string(node: &Node, key: &str) -> Result<Option<String>, TrackerError> {
    let Some(value) = node.get(key.as_bytes()) else {
        return Ok(None);
    };
    value
        .as_str()
        .map(|s| Some(s.to_string()))
        .ok_or_else(|| invalid(format!("'{}' must be a UTF-8 string", key)))
}

/// Parses compact peers, `record_len` bytes per peer.
fn parse_compact(
    data: &[u8],
    record_len: usize,
    parse: fn(&[u8]) -> Option<Peer>,
) -> Result<Vec<Peer>, TrackerError> {
    if data.len() % record_len != 0 {
        return Err(invalid(format!(
            "compact peers length {} is not a multiple of {}",
            data.len(),
            record_len
        )));
    }
    Ok(data.chunks_exact(record_len).filter_map(parse).collect())
}

/// Parses compact IPv4 peers. The length must be a multiple of 6.
pub fn parse_compact_peers(data: &[u8]) -> Result<Vec<Peer>, TrackerError> {
    parse_compact(data, COMPACT_PEER_V4_LEN, Peer::from_compact_v4)
}

/// Parses compact IPv6 peers. The length must be a multiple of 18.
pub fn parse_compact_peers6(data: &[u8]) -> Result<Vec<Peer>, TrackerError> {
    parse_compact(data, COMPACT_PEER_V6_LEN, Peer::from_compact_v6)
}

fn parse_verbose_peer(node: &Node) -> Result<Peer, TrackerError> {
    as_dict(node, "peer entry")?;

    let peer_id = node
        .get_bytes(b"peer id")
        .ok_or_else(|| invalid("peer entry missing 'peer id'"))?
        .clone();
    let ip = node
        .get_str(b"ip")
        .ok_or_else(|| invalid("peer entry missing 'ip'"))?;
    let ip: IpAddr = ip
        .parse()
        .map_err(|_| invalid(format!("peer ip is not an address literal: {}", ip)))?;
    let port = node
        .get_int(b"port")
        .ok_or_else(|| invalid("peer entry missing 'port'"))?;
    let port = u16::try_from(port).map_err(|_| invalid(format!("peer port out of range: {}", port)))?;

    Ok(Peer {
        peer_id: Some(peer_id),
        ip,
        port,
    })
}

/// Projects a decoded announce response.
///
/// A `failure reason` short-circuits everything else. Otherwise `interval`
/// is required and the peers from `peers` (verbose list or compact string)
/// and `peers6` are merged; a response with no peers at all is rejected.
pub fn parse_response(root: &Node) -> Result<TrackerResponse, TrackerError> {
    as_dict(root, "announce response")?;

    if let Some(reason) = failure_reason(root)? {
        return Ok(TrackerResponse::Failure(reason));
    }

    let mut response = AnnounceResponse::new(required_u32(root, "interval")?);
    response.warning_message = optional_string(root, "warning message")?;
    response.min_interval = optional_u32(root, "min interval")?;
    response.tracker_id = optional_string(root, "tracker id")?;
    response.complete = optional_u32(root, "complete")?;
    response.incomplete = optional_u32(root, "incomplete")?;

    if let Some(peers) = root.get(b"peers") {
        if let Some(compact) = peers.as_bytes() {
            response.peers = parse_compact_peers(compact)?;
        } else if let Some(list) = peers.as_list() {
            response.peers = list
                .iter()
                .map(parse_verbose_peer)
                .collect::<Result<_, _>>()?;
        } else {
            return Err(invalid("'peers' must be a list or a string"));
        }
    }

    if let Some(peers6) = root.get(b"peers6") {
        let compact = peers6
            .as_bytes()
            .ok_or_else(|| invalid("'peers6' must be a string"))?;
        response.peers.extend(parse_compact_peers6(compact)?);
    }

    if response.peers.is_empty() {
        return Err(invalid("response contains no peers"));
    }

    Ok(TrackerResponse::Success(response))
}

/// Projects a decoded scrape response.
pub fn parse_scrape(root: &Node) -> Result<TrackerScrape, TrackerError> {
    as_dict(root, "scrape response")?;

    if let Some(reason) = failure_reason(root)? {
        return Ok(TrackerScrape::Failure(reason));
    }

    let mut scrape = ScrapeResponse::default();

    if let Some(flags) = root.get(b"flags") {
        as_dict(flags, "'flags'")?;
        scrape.min_request_interval = optional_u32(flags, "min_request_interval")?;
    }

    let files = root
        .get(b"files")
        .ok_or_else(|| invalid("missing 'files'"))?;
    for (info_hash, stats) in as_dict(files, "'files'")? {
        let info_hash: [u8; SHA1_LEN] = info_hash.as_ref().try_into().map_err(|_| {
            invalid(format!("scrape key has length {}, expected 20", info_hash.len()))
        })?;
        as_dict(stats, "scrape entry")?;

        let file = ScrapeFile {
            complete: required_u32(stats, "complete")?,
            downloaded: required_u32(stats, "downloaded")?,
            incomplete: required_u32(stats, "incomplete")?,
            name: optional_string(stats, "name")?,
        };
        scrape.files.insert(info_hash, file);
    }

    Ok(TrackerScrape::Success(scrape))
}
