use thiserror::Error;

/// Reasons a byte buffer is not valid bencode.
///
/// All decode failures are total: no partially decoded tree is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BencodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    #[error("invalid string length")]
    InvalidStringLength,

    #[error("unexpected character {found:?} at offset {pos}")]
    UnexpectedChar { found: char, pos: usize },

    #[error("duplicate dictionary key: {0}")]
    DuplicateKey(String),

    #[error("dictionary key out of order: {0}")]
    UnsortedKeys(String),

    #[error("trailing data after value at offset {0}")]
    TrailingData(usize),

    #[error("nesting too deep")]
    NestingTooDeep,
}
