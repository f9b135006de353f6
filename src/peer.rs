//! Peer wire protocol messages (BEP-3).
//!
//! [`Message`] encodes and parses the ten base messages in their unframed
//! form: one id byte followed by a fixed or length-implied payload. The
//! [`frame`] module adds the 4-byte length prefix and keep-alives used on a
//! live connection.
//!
//! ```
//! use btwire::peer::{encode_frame, Frame, FrameDecoder, Message};
//!
//! let mut decoder = FrameDecoder::new();
//! decoder.extend(&encode_frame(&Message::Have { piece: 7 }));
//!
//! let Some(Frame::Message(body)) = decoder.decode().unwrap() else {
//!     panic!("expected a message frame");
//! };
//! assert_eq!(Message::parse(body, 0).unwrap(), Message::Have { piece: 7 });
//! ```

mod bitfield;
mod error;
pub mod frame;
mod message;

pub use bitfield::Bitfield;
pub use error::PeerError;
pub use frame::{encode_frame, keep_alive, Frame, FrameDecoder};
pub use message::{Message, MessageId};

#[cfg(test)]
mod tests;
