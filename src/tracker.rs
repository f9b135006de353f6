//! Tracker protocol (BEP-3, BEP-15, BEP-23, BEP-48)
//!
//! This module implements HTTP and UDP tracker clients for peer discovery.
//!
//! Both clients take the same [`TrackerRequest`] and produce the same
//! [`TrackerResponse`] / [`TrackerScrape`] values. The network underneath is
//! pluggable: [`HttpFetch`] for HTTP, [`DatagramConnector`] for UDP. URL
//! building and response parsing are plain functions that never do I/O.

mod error;
mod http;
mod packet;
mod request;
mod response;
mod udp;

pub use error::TrackerError;
pub use http::{HttpFetch, HttpTracker, HttpTrackerConfig, ReqwestFetch};
pub use packet::{PacketReader, PacketWriter};
pub use request::{build_request_url, scrape_url, Event, TrackerRequest, TrackerRequestBuilder};
pub use response::{
    parse_compact_peers, parse_compact_peers6, parse_response, parse_scrape, AnnounceResponse,
    Peer, ScrapeFile, ScrapeResponse, TrackerResponse, TrackerScrape,
};
pub use udp::{
    ConnectionPolicy, DatagramConnector, DatagramTransport, TokioUdpConnector, TokioUdpTransport,
    UdpTracker, UdpTrackerConfig,
};
