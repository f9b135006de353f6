//! UDP tracker protocol ([BEP-15]).
//!
//! Every request first needs a connection id from a connect handshake. With
//! [`ConnectionPolicy::PerRequest`] each announce or scrape opens a fresh
//! transport and handshakes again. With [`ConnectionPolicy::Reuse`] the
//! transport and id are kept until the id's lifetime runs out.
//!
//! Each send waits `base_timeout * 2^n` for a reply (`n` counting
//! retransmissions). Datagrams that do not carry the transaction id and
//! action of the outstanding request are dropped and waiting continues.
//!
//! [BEP-15]: http://bittorrent.org/beps/bep_0015.html

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng as _;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, trace, warn};

use super::error::TrackerError;
use super::packet::{PacketReader, PacketWriter};
use super::request::TrackerRequest;
use super::response::{
    AnnounceResponse, Peer, ScrapeFile, ScrapeResponse, TrackerResponse, TrackerScrape,
};
use crate::constants::{
    COMPACT_PEER_V4_LEN, SHA1_LEN, UDP_ANNOUNCE_REPLY_HEADER_LEN, UDP_ANNOUNCE_REQUEST_LEN,
    UDP_BASE_TIMEOUT, UDP_CONNECTION_ID_TTL, UDP_CONNECT_REPLY_LEN, UDP_CONNECT_REQUEST_LEN,
    UDP_MAX_RETRIES, UDP_MAX_SCRAPE_HASHES, UDP_PROTOCOL_ID, UDP_RECV_BUFFER_LEN,
    UDP_REPLY_HEADER_LEN, UDP_SCRAPE_RECORD_LEN,
};

const ACTION_CONNECT: u32 = 0;
const ACTION_ANNOUNCE: u32 = 1;
const ACTION_SCRAPE: u32 = 2;
const ACTION_ERROR: u32 = 3;

/// A connected datagram socket.
///
/// Dropping a transport must release it.
#[async_trait]
pub trait DatagramTransport: Send {
    async fn send(&mut self, packet: &[u8]) -> io::Result<()>;

    /// Receives one datagram into `buf`, returning its length.
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn close(&mut self);
}

/// Opens transports to `host:port`, resolving the host if needed.
#[async_trait]
pub trait DatagramConnector: Send + Sync {
    type Transport: DatagramTransport;

    async fn connect(&self, host: &str, port: u16) -> io::Result<Self::Transport>;
}

/// [`DatagramConnector`] over `tokio::net::UdpSocket`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioUdpConnector;

#[derive(Debug)]
pub struct TokioUdpTransport {
    socket: Option<UdpSocket>,
}

impl TokioUdpTransport {
    fn socket(&self) -> io::Result<&UdpSocket> {
        self.socket
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport closed"))
    }
}

#[async_trait]
impl DatagramConnector for TokioUdpConnector {
    type Transport = TokioUdpTransport;

    async fn connect(&self, host: &str, port: u16) -> io::Result<TokioUdpTransport> {
        let addr = lookup_host((host, port)).await?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no address for {}", host))
        })?;

        let local: SocketAddr = match addr.ip() {
            IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(addr).await?;
        trace!(%addr, "udp socket connected");

        Ok(TokioUdpTransport {
            socket: Some(socket),
        })
    }
}

#[async_trait]
impl DatagramTransport for TokioUdpTransport {
    async fn send(&mut self, packet: &[u8]) -> io::Result<()> {
        self.socket()?.send(packet).await?;
        Ok(())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket()?.recv(buf).await
    }

    fn close(&mut self) {
        self.socket = None;
    }
}

/// Whether connection ids outlive a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionPolicy {
    /// Open a transport and handshake for every request.
    #[default]
    PerRequest,
    /// Keep the transport and connection id for `ttl` after the handshake.
    Reuse { ttl: Duration },
}

impl ConnectionPolicy {
    /// `Reuse` with the conventional one-minute lifetime.
    pub fn reuse() -> Self {
        ConnectionPolicy::Reuse {
            ttl: UDP_CONNECTION_ID_TTL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UdpTrackerConfig {
    /// Wait for the first attempt; doubled on each retransmission.
    pub base_timeout: Duration,
    /// Retransmissions after the first send before giving up.
    pub max_retries: u32,
    pub connection_policy: ConnectionPolicy,
    pub recv_buffer_len: usize,
}

impl Default for UdpTrackerConfig {
    fn default() -> Self {
        Self {
            base_timeout: UDP_BASE_TIMEOUT,
            max_retries: UDP_MAX_RETRIES,
            connection_policy: ConnectionPolicy::PerRequest,
            recv_buffer_len: UDP_RECV_BUFFER_LEN,
        }
    }
}

/// Closes the wrapped transport on drop.
struct Closing<T: DatagramTransport>(T);

impl<T: DatagramTransport> Drop for Closing<T> {
    fn drop(&mut self) {
        self.0.close();
    }
}

struct Session<T: DatagramTransport> {
    transport: Closing<T>,
    host: String,
    port: u16,
    connection_id: u64,
    obtained_at: Instant,
}

/// A reply that matched the outstanding transaction.
enum Reply {
    Data(Vec<u8>),
    Error(String),
}

/// UDP tracker client.
///
/// Transaction ids and announce keys come from an injectable source,
/// [`UdpTracker::with_transaction_ids`], defaulting to the thread RNG.
pub struct UdpTracker<C: DatagramConnector = TokioUdpConnector> {
    connector: C,
    config: UdpTrackerConfig,
    next_id: Box<dyn FnMut() -> u32 + Send>,
    session: Option<Session<C::Transport>>,
}

impl UdpTracker<TokioUdpConnector> {
    pub fn new(config: UdpTrackerConfig) -> Self {
        Self::with_connector(TokioUdpConnector, config)
    }
}

impl<C: DatagramConnector> UdpTracker<C> {
    pub fn with_connector(connector: C, config: UdpTrackerConfig) -> Self {
        Self {
            connector,
            config,
            next_id: Box::new(|| rand::rng().random::<u32>()),
            session: None,
        }
    }

    /// Replaces the random source for transaction ids and keys.
    pub fn with_transaction_ids(mut self, next_id: impl FnMut() -> u32 + Send + 'static) -> Self {
        self.next_id = Box::new(next_id);
        self
    }

    /// Announces to the `udp://host:port` tracker in `request.announce`.
    pub async fn announce(&mut self, request: &TrackerRequest) -> Result<TrackerResponse, TrackerError> {
        let (host, port) = parse_udp_url(&request.announce)?;

        let ip = match request.ip.as_deref() {
            None => 0,
            Some(ip) => ip.parse::<Ipv4Addr>().map(u32::from).map_err(|_| {
                TrackerError::InvalidRequest(format!("ip is not an IPv4 address: {}", ip))
            })?,
        };
        let key = match request.key.as_deref() {
            None => (self.next_id)(),
            Some(key) => parse_key(key)?,
        };
        let num_want = request
            .numwant
            .map_or(-1, |n| i32::try_from(n).unwrap_or(i32::MAX));

        let mut session = self.session(&host, port).await?;
        let transaction_id = (self.next_id)();

        let mut packet = PacketWriter::with_capacity(UDP_ANNOUNCE_REQUEST_LEN);
        packet
            .write_u64(session.connection_id)
            .write_u32(ACTION_ANNOUNCE)
            .write_u32(transaction_id)
            .write_bytes(&request.info_hash)
            .write_bytes(&request.peer_id)
            .write_u64(request.downloaded)
            .write_u64(request.left)
            .write_u64(request.uploaded)
            .write_u32(request.event.map_or(0, |e| e.udp_code()))
            .write_u32(ip)
            .write_u32(key)
            .write_i32(num_want)
            .write_u16(request.port);

        debug!(tracker = %host, port, transaction_id, "udp announce");
        let reply = exchange(
            &mut session.transport.0,
            &self.config,
            &packet.finish(),
            transaction_id,
            ACTION_ANNOUNCE,
        )
        .await?;

        let response = match reply {
            Reply::Error(message) => TrackerResponse::Failure(message),
            Reply::Data(data) => TrackerResponse::Success(parse_announce_reply(&data)?),
        };
        self.finish(session);
        Ok(response)
    }

    /// Scrapes up to 74 info hashes from the tracker behind `announce`.
    ///
    /// Records in the reply are matched to `info_hashes` by position.
    pub async fn scrape(
        &mut self,
        announce: &str,
        info_hashes: &[[u8; SHA1_LEN]],
    ) -> Result<TrackerScrape, TrackerError> {
        let (host, port) = parse_udp_url(announce)?;
        if info_hashes.is_empty() || info_hashes.len() > UDP_MAX_SCRAPE_HASHES {
            return Err(TrackerError::InvalidRequest(format!(
                "scrape takes 1 to {} info hashes, got {}",
                UDP_MAX_SCRAPE_HASHES,
                info_hashes.len()
            )));
        }

        let mut session = self.session(&host, port).await?;
        let transaction_id = (self.next_id)();

        let mut packet = PacketWriter::with_capacity(16 + SHA1_LEN * info_hashes.len());
        packet
            .write_u64(session.connection_id)
            .write_u32(ACTION_SCRAPE)
            .write_u32(transaction_id);
        for info_hash in info_hashes {
            packet.write_bytes(info_hash);
        }

        debug!(tracker = %host, port, transaction_id, hashes = info_hashes.len(), "udp scrape");
        let reply = exchange(
            &mut session.transport.0,
            &self.config,
            &packet.finish(),
            transaction_id,
            ACTION_SCRAPE,
        )
        .await?;

        let scrape = match reply {
            Reply::Error(message) => TrackerScrape::Failure(message),
            Reply::Data(data) => TrackerScrape::Success(parse_scrape_reply(&data, info_hashes)?),
        };
        self.finish(session);
        Ok(scrape)
    }

    /// Returns a connected session for `host:port`, reusing the cached one
    /// when the policy allows and its id has not expired.
    async fn session(&mut self, host: &str, port: u16) -> Result<Session<C::Transport>, TrackerError> {
        if let Some(session) = self.session.take() {
            let fresh = match self.config.connection_policy {
                ConnectionPolicy::Reuse { ttl } => session.obtained_at.elapsed() < ttl,
                ConnectionPolicy::PerRequest => false,
            };
            if fresh && session.host == host && session.port == port {
                trace!(tracker = %host, "reusing connection id");
                return Ok(session);
            }
            debug!(tracker = %session.host, "dropping cached connection id");
        }

        let mut transport = Closing(
            timeout(self.config.base_timeout, self.connector.connect(host, port))
                .await
                .map_err(|_| TrackerError::Timeout)??,
        );

        let transaction_id = (self.next_id)();
        let mut packet = PacketWriter::with_capacity(UDP_CONNECT_REQUEST_LEN);
        packet
            .write_u64(UDP_PROTOCOL_ID)
            .write_u32(ACTION_CONNECT)
            .write_u32(transaction_id);

        debug!(tracker = %host, port, transaction_id, "udp connect");
        let reply = exchange(
            &mut transport.0,
            &self.config,
            &packet.finish(),
            transaction_id,
            ACTION_CONNECT,
        )
        .await?;

        let data = match reply {
            Reply::Data(data) => data,
            Reply::Error(message) => {
                return Err(TrackerError::InvalidResponse(format!(
                    "tracker refused connect: {}",
                    message
                )))
            }
        };
        if data.len() < UDP_CONNECT_REPLY_LEN {
            return Err(TrackerError::InvalidResponse(format!(
                "connect reply too short: {} bytes",
                data.len()
            )));
        }
        let mut reader = PacketReader::new(&data[UDP_REPLY_HEADER_LEN..]);
        let connection_id = reader.read_u64()?;

        Ok(Session {
            transport,
            host: host.to_string(),
            port,
            connection_id,
            obtained_at: Instant::now(),
        })
    }

    /// Caches the session under [`ConnectionPolicy::Reuse`]; otherwise
    /// dropping it closes the transport.
    fn finish(&mut self, session: Session<C::Transport>) {
        if let ConnectionPolicy::Reuse { .. } = self.config.connection_policy {
            self.session = Some(session);
        }
    }
}

/// Sends `packet` and waits for the reply to `transaction_id`,
/// retransmitting with exponential backoff.
async fn exchange<T: DatagramTransport>(
    transport: &mut T,
    config: &UdpTrackerConfig,
    packet: &[u8],
    transaction_id: u32,
    action: u32,
) -> Result<Reply, TrackerError> {
    let mut buf = vec![0u8; config.recv_buffer_len];

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            debug!(attempt, transaction_id, "retransmitting");
        }
        transport.send(packet).await?;

        // BEP-15 stops doubling at n = 8.
        let wait = config.base_timeout * 2u32.pow(attempt.min(8));
        let deadline = Instant::now() + wait;

        loop {
            let len = match timeout_at(deadline, transport.recv(&mut buf)).await {
                Ok(result) => result?,
                Err(_) => break,
            };
            match classify(&buf[..len], transaction_id, action) {
                Some(reply) => return Ok(reply),
                None => debug!(len, transaction_id, "discarding unmatched datagram"),
            }
        }
    }

    warn!(transaction_id, "udp tracker did not reply");
    Err(TrackerError::Timeout)
}

/// Matches a datagram against the outstanding request. Anything without the
/// right transaction id, or with an unexpected action, is not ours.
fn classify(datagram: &[u8], transaction_id: u32, action: u32) -> Option<Reply> {
    let mut reader = PacketReader::new(datagram);
    let got_action = reader.read_u32().ok()?;
    let got_transaction = reader.read_u32().ok()?;

    if got_transaction != transaction_id {
        return None;
    }
    match got_action {
        ACTION_ERROR => Some(Reply::Error(
            String::from_utf8_lossy(reader.rest()).into_owned(),
        )),
        a if a == action => Some(Reply::Data(datagram.to_vec())),
        _ => None,
    }
}

fn parse_announce_reply(data: &[u8]) -> Result<AnnounceResponse, TrackerError> {
    if data.len() < UDP_ANNOUNCE_REPLY_HEADER_LEN {
        return Err(TrackerError::InvalidResponse(format!(
            "announce reply too short: {} bytes",
            data.len()
        )));
    }

    let mut reader = PacketReader::new(&data[UDP_REPLY_HEADER_LEN..]);
    let interval = reader.read_u32()?;
    let leechers = reader.read_u32()?;
    let seeders = reader.read_u32()?;

    let records = reader.rest();
    if records.len() % COMPACT_PEER_V4_LEN != 0 {
        return Err(TrackerError::InvalidResponse(format!(
            "announce reply has {} trailing bytes",
            records.len() % COMPACT_PEER_V4_LEN
        )));
    }

    let mut response = AnnounceResponse::new(interval);
    response.complete = Some(seeders);
    response.incomplete = Some(leechers);
    response.peers = records
        .chunks_exact(COMPACT_PEER_V4_LEN)
        .filter_map(Peer::from_compact_v4)
        .collect();
    Ok(response)
}

fn parse_scrape_reply(
    data: &[u8],
    info_hashes: &[[u8; SHA1_LEN]],
) -> Result<ScrapeResponse, TrackerError> {
    let records = &data[UDP_REPLY_HEADER_LEN..];
    if records.len() != info_hashes.len() * UDP_SCRAPE_RECORD_LEN {
        return Err(TrackerError::InvalidResponse(format!(
            "scrape reply has {} bytes of records for {} info hashes",
            records.len(),
            info_hashes.len()
        )));
    }

    let mut reader = PacketReader::new(records);
    let mut scrape = ScrapeResponse::default();
    for info_hash in info_hashes {
        let file = ScrapeFile {
            complete: reader.read_u32()?,
            downloaded: reader.read_u32()?,
            incomplete: reader.read_u32()?,
            name: None,
        };
        scrape.files.insert(*info_hash, file);
    }
    Ok(scrape)
}

/// Splits `udp://host:port[/path]` into host and port. IPv6 hosts are
/// written in brackets.
pub(crate) fn parse_udp_url(url: &str) -> Result<(String, u16), TrackerError> {
    let invalid = || TrackerError::InvalidUrl(url.to_string());

    let rest = url.strip_prefix("udp://").ok_or_else(invalid)?;
    let authority = rest.split(|c: char| c == '/' || c == '?').next().unwrap_or(rest);
    let (host, port) = authority.rsplit_once(':').ok_or_else(invalid)?;
    let port: u16 = port.parse().map_err(|_| invalid())?;

    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err(invalid());
    }
    Ok((host.to_string(), port))
}

/// Announce keys are sent as a 32-bit value: decimal, or hex with an
/// optional `0x` prefix.
fn parse_key(key: &str) -> Result<u32, TrackerError> {
    key.parse::<u32>()
        .or_else(|_| u32::from_str_radix(key.trim_start_matches("0x"), 16))
        .map_err(|_| TrackerError::InvalidRequest(format!("key is not a 32-bit number: {}", key)))
}
