//! Bencode encoding and decoding ([BEP-3]).
//!
//! Bencode is the serialization format used throughout BitTorrent for storing
//! and transmitting structured data, including `.torrent` files and tracker
//! responses.
//!
//! # Data Types
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` → 42 |
//! | Byte String | `<length>:<data>` | `4:spam` → "spam" |
//! | List | `l<items>e` | `l4:spami42ee` → ["spam", 42] |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` → {"foo": "bar"} |
//!
//! # Spans
//!
//! Every decoded [`Node`] remembers the `[begin, end)` byte range it came
//! from. Consumers that must hash the *original* bytes of a sub-value (the
//! info dictionary of a torrent) use [`Node::raw`] instead of re-encoding,
//! because re-encoding canonicalises key order and can change the digest.
//!
//! ```
//! use btwire::bencode::{decode, encode};
//!
//! // Keys out of order on the wire: accepted, canonicalised on output.
//! let data = b"d4:infod1:bi1e1:ai2eee";
//! let root = decode(data).unwrap();
//! let info = root.get(b"info").unwrap();
//!
//! assert_eq!(info.raw(data).unwrap(), b"d1:bi1e1:ai2ee");
//! assert_eq!(encode(info), b"d1:ai2e1:bi1ee");
//! ```
//!
//! # Error Handling
//!
//! Decoding never panics on malformed input; it returns a [`BencodeError`]:
//!
//! - [`BencodeError::UnexpectedEof`] - Input ended unexpectedly
//! - [`BencodeError::InvalidInteger`] - Malformed integer (leading zeros, `-0`, overflow)
//! - [`BencodeError::InvalidStringLength`] - Malformed string length prefix
//! - [`BencodeError::UnexpectedChar`] - Unexpected character in input
//! - [`BencodeError::DuplicateKey`] - A dictionary repeats a key
//! - [`BencodeError::NestingTooDeep`] - Recursion limit exceeded
//! - [`BencodeError::TrailingData`] - Extra data after the value
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod decode;
mod encode;
mod error;
mod node;

pub use decode::{decode, decode_prefix, decode_prefix_with, decode_with, DecodeOptions};
pub use encode::{encode, encode_into};
pub use error::BencodeError;
pub use node::{Node, Span, Value};

#[cfg(test)]
mod tests;
