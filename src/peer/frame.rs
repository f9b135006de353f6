//! Length-prefixed framing of peer-wire messages on a byte stream.
//!
//! Each message travels as a 4-byte big-endian length followed by that many
//! bytes; a length of zero is a keep-alive with no body.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::error::PeerError;
use super::message::Message;
use crate::constants::MAX_FRAME_LEN;

const PREFIX_LEN: usize = 4;

/// One unit read off the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    KeepAlive,
    /// An unframed message body, ready for [`Message::parse`].
    Message(Bytes),
}

/// Encodes `message` with its length prefix.
pub fn encode_frame(message: &Message) -> Bytes {
    let size = message.expected_size();
    let mut buf = BytesMut::with_capacity(PREFIX_LEN + size as usize);
    buf.put_u32(size);
    message.write(&mut buf);
    buf.freeze()
}

pub fn keep_alive() -> Bytes {
    Bytes::from_static(&[0, 0, 0, 0])
}

/// Incremental decoder: feed it bytes as they arrive and pull whole frames.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    max_len: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_max_len(MAX_FRAME_LEN)
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(32 * 1024),
            max_len,
        }
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes received but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Returns the next complete frame, or `None` if more bytes are needed.
    ///
    /// An oversized length prefix is reported as soon as the prefix arrives,
    /// without waiting for the body. The offending bytes stay buffered.
    pub fn decode(&mut self) -> Result<Option<Frame>, PeerError> {
        if self.buf.len() < PREFIX_LEN {
            return Ok(None);
        }

        let length =
            u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]) as usize;

        if length > self.max_len {
            return Err(PeerError::FrameTooLarge {
                len: length,
                max: self.max_len,
            });
        }

        if self.buf.len() < PREFIX_LEN + length {
            return Ok(None);
        }

        self.buf.advance(PREFIX_LEN);
        if length == 0 {
            return Ok(Some(Frame::KeepAlive));
        }
        Ok(Some(Frame::Message(self.buf.split_to(length).freeze())))
    }
}
