//! Protocol constants and tuning defaults.
//!
//! Wire-format values here are fixed by the BitTorrent specifications ([BEP-3],
//! [BEP-15]); timeouts and limits are defaults that can be overridden through the
//! config structs of the modules that use them.
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html
//! [BEP-15]: http://bittorrent.org/beps/bep_0015.html

use std::time::Duration;

// ============================================================================
// Client identification
// ============================================================================

/// User agent string for HTTP tracker requests
pub const USER_AGENT: &str = concat!("btwire/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Bencode
// ============================================================================

/// Maximum nesting of lists/dictionaries accepted by the decoder
pub const MAX_BENCODE_DEPTH: usize = 64;

// ============================================================================
// Metainfo
// ============================================================================

/// Length of a SHA-1 digest (piece hashes, info hash, peer id)
pub const SHA1_LEN: usize = 20;

/// Length of an `md5sum` field in hex characters
pub const MD5_HEX_LEN: usize = 32;

// ============================================================================
// HTTP tracker
// ============================================================================

/// Timeout for a whole HTTP announce/scrape round trip
pub const HTTP_TRACKER_TIMEOUT: Duration = Duration::from_secs(30);

/// Size of one compact IPv4 peer record (4-byte address + 2-byte port)
pub const COMPACT_PEER_V4_LEN: usize = 6;

/// Size of one compact IPv6 peer record (16-byte address + 2-byte port)
pub const COMPACT_PEER_V6_LEN: usize = 18;

// ============================================================================
// UDP tracker (BEP-15)
// ============================================================================

/// Magic constant sent in the connect request
pub const UDP_PROTOCOL_ID: u64 = 0x41727101980;

/// Base timeout; attempt `n` waits `15 * 2^n` seconds
pub const UDP_BASE_TIMEOUT: Duration = Duration::from_secs(15);

/// Retransmissions before a UDP request is given up
pub const UDP_MAX_RETRIES: u32 = 3;

/// How long a connection id may be reused after the handshake
pub const UDP_CONNECTION_ID_TTL: Duration = Duration::from_secs(60);

/// Receive buffer for tracker replies (large enough for ~340 compact peers)
pub const UDP_RECV_BUFFER_LEN: usize = 2048;

/// Most info hashes that fit into one scrape request
pub const UDP_MAX_SCRAPE_HASHES: usize = 74;

/// Connect request: protocol id + action + transaction id
pub const UDP_CONNECT_REQUEST_LEN: usize = 16;

/// Connect reply: action + transaction id + connection id
pub const UDP_CONNECT_REPLY_LEN: usize = 16;

/// Announce request, fixed size
pub const UDP_ANNOUNCE_REQUEST_LEN: usize = 98;

/// Announce reply header before the peer records
pub const UDP_ANNOUNCE_REPLY_HEADER_LEN: usize = 20;

/// Header shared by scrape and error replies: action + transaction id
pub const UDP_REPLY_HEADER_LEN: usize = 8;

/// One scrape record: complete + downloaded + incomplete
pub const UDP_SCRAPE_RECORD_LEN: usize = 12;

// ============================================================================
// Peer wire
// ============================================================================

/// Largest block a peer may send in one piece message (16 MiB)
pub const MAX_BLOCK_LEN: usize = 16 * 1024 * 1024;

/// Largest framed message accepted by the frame decoder (block + piece header)
pub const MAX_FRAME_LEN: usize = MAX_BLOCK_LEN + 9;
