//! btwire - BitTorrent wire formats and tracker protocols
//!
//! This library implements the encoding and protocol layer of a BitTorrent
//! client following the BEP (BitTorrent Enhancement Proposals) specifications.
//! It does not select pieces, schedule disk I/O or manage peer sessions.
//!
//! # Modules
//!
//! - [`bencode`] - BEP-3 Bencode encoding/decoding with byte spans
//! - [`metainfo`] - BEP-3 torrent metainfo and info hash
//! - [`tracker`] - BEP-3/15/23 HTTP and UDP tracker protocols
//! - [`peer`] - BEP-3 peer wire messages and stream framing
//! - [`urlcodec`] - Percent-encoding of binary query values
//! - [`constants`] - Protocol constants and defaults

pub mod bencode;
pub mod constants;
pub mod metainfo;
pub mod peer;
pub mod tracker;
pub mod urlcodec;

pub use bencode::{decode, encode, BencodeError, Node, Value};
pub use metainfo::{FileDescription, FileMode, InfoHash, Metainfo, MetainfoError};
pub use peer::{Bitfield, Frame, FrameDecoder, Message, MessageId, PeerError};
pub use tracker::{
    AnnounceResponse, Event, HttpTracker, Peer, ScrapeResponse, TrackerError, TrackerRequest,
    TrackerResponse, UdpTracker,
};
