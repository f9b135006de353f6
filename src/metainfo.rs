//! Torrent metainfo handling ([BEP-3]).
//!
//! [`Metainfo::parse`] projects a decoded bencode tree into a validated
//! torrent descriptor. Each missing or mistyped field is reported as its own
//! [`MetainfoError`] variant naming the dictionary and field involved.
//!
//! # Info hash
//!
//! A torrent is identified by the SHA-1 of its bencoded `info` dictionary,
//! taken over the bytes exactly as they appear in the file. Two entry points
//! exist:
//!
//! - [`Metainfo::info_hash`] digests the `info` node's source span. Use this
//!   for anything read from disk or the network.
//! - [`Metainfo::info_hash_reencoded`] digests a canonical re-encoding. It is
//!   only equal to the real info hash when the source was already canonical.
//!
//! ```
//! use btwire::bencode::decode;
//! use btwire::metainfo::Metainfo;
//!
//! // "name" appears before "length": valid on input, but not canonical.
//! let data = b"d8:announce4:http4:infod4:name1:x6:lengthi1e\
//!              12:piece lengthi1e6:pieces0:ee";
//! let root = decode(data).unwrap();
//!
//! let exact = Metainfo::info_hash(&root, data).unwrap();
//! let reencoded = Metainfo::info_hash_reencoded(&root).unwrap();
//! assert_ne!(exact, reencoded);
//! ```
//!
//! # Torrent Structure
//!
//! - **info** - Core torrent metadata (hashed to create the info hash)
//!   - `name` - Suggested file/directory name
//!   - `piece length` - Size of each piece in bytes
//!   - `pieces` - Concatenated SHA1 hashes of each piece
//!   - `private` - 0 or 1
//!   - `length` + optional `md5sum` (single-file) OR `files` list (multi-file)
//! - **announce** - Primary tracker URL
//! - **announce-list** - Additional tracker tiers (BEP-12)
//! - **creation date** - Unix timestamp when created
//! - **comment**, **created by**, **encoding** - Optional strings
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod error;
mod info_hash;
mod torrent;

pub use error::MetainfoError;
pub use info_hash::InfoHash;
pub use torrent::{is_valid_md5sum, FileDescription, FileMode, Metainfo};
