use thiserror::Error;

/// Errors produced while decoding peer-wire messages or frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError {
    /// Received a malformed protocol message.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Received an unknown message ID.
    #[error("invalid message id: {0}")]
    InvalidMessageId(u8),

    /// The payload length does not match the layout of the message id.
    #[error("invalid length {len} for {kind} message")]
    InvalidLength { kind: &'static str, len: usize },

    /// A bitfield has the wrong size or sets a padding bit.
    #[error("invalid bitfield: {0}")]
    InvalidBitfield(String),

    /// A frame announces more bytes than the decoder accepts.
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },
}
