use thiserror::Error;

use crate::bencode::BencodeError;

/// Errors that can occur when projecting a bencode tree into a [`Metainfo`].
///
/// Validation errors name the dictionary (`"root"`, `"info"`, `"files[3]"`)
/// and the field they refer to.
///
/// [`Metainfo`]: super::Metainfo
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetainfoError {
    /// The torrent file contains invalid bencode.
    #[error("bencode error: {0}")]
    Bencode(#[from] BencodeError),

    /// A required field is missing.
    #[error("missing field '{field}' in {dict}")]
    MissingField { dict: String, field: &'static str },

    /// A field is present but has the wrong bencode type.
    #[error("field '{field}' in {dict} must be a {expected}, found {found}")]
    InvalidType {
        dict: String,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// A byte string that must be text is not valid UTF-8.
    #[error("field '{field}' in {dict} is not valid UTF-8")]
    InvalidUtf8 { dict: String, field: &'static str },

    /// An integer that must be unsigned is negative.
    #[error("field '{field}' in {dict} must not be negative")]
    NegativeValue { dict: String, field: &'static str },

    /// `piece length` is zero.
    #[error("piece length must be greater than zero")]
    InvalidPieceLength,

    /// `pieces` is not a whole number of 20-byte digests.
    #[error("pieces length {0} is not a multiple of 20")]
    InvalidPiecesLength(usize),

    /// `private` is something other than 0 or 1.
    #[error("field 'private' must be 0 or 1, not {0}")]
    InvalidPrivate(i64),

    /// `md5sum` is not 32 hex characters.
    #[error("invalid md5sum format in {dict}")]
    InvalidMd5sum { dict: String },

    /// The info dictionary has neither `length` nor `files`.
    #[error("info dictionary has neither 'length' nor 'files'")]
    NeitherFileMode,

    /// The info dictionary has both `length` and `files`.
    #[error("info dictionary has both 'length' and 'files'")]
    BothFileModes,

    /// A `files` entry has an empty `path` list.
    #[error("empty path in {dict}")]
    EmptyPath { dict: String },

    /// The `info` node has no span inside the supplied buffer.
    #[error("info dictionary span does not lie within the source buffer")]
    InfoSpanOutOfBounds,

    /// The info hash has an invalid length or is not valid hex.
    #[error("invalid info hash")]
    InvalidInfoHash,
}
