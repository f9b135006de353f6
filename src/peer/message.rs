use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::bitfield::Bitfield;
use super::error::PeerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageId {
    Choke = 0,
    Unchoke = 1,
    Interested = 2,
    NotInterested = 3,
    Have = 4,
    Bitfield = 5,
    Request = 6,
    Piece = 7,
    Cancel = 8,
    Port = 9,
}

impl MessageId {
    pub fn name(self) -> &'static str {
        match self {
            MessageId::Choke => "choke",
            MessageId::Unchoke => "unchoke",
            MessageId::Interested => "interested",
            MessageId::NotInterested => "not interested",
            MessageId::Have => "have",
            MessageId::Bitfield => "bitfield",
            MessageId::Request => "request",
            MessageId::Piece => "piece",
            MessageId::Cancel => "cancel",
            MessageId::Port => "port",
        }
    }
}

impl TryFrom<u8> for MessageId {
    type Error = PeerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageId::Choke),
            1 => Ok(MessageId::Unchoke),
            2 => Ok(MessageId::Interested),
            3 => Ok(MessageId::NotInterested),
            4 => Ok(MessageId::Have),
            5 => Ok(MessageId::Bitfield),
            6 => Ok(MessageId::Request),
            7 => Ok(MessageId::Piece),
            8 => Ok(MessageId::Cancel),
            9 => Ok(MessageId::Port),
            _ => Err(PeerError::InvalidMessageId(value)),
        }
    }
}

/// A peer-wire message without its length prefix.
///
/// The encoded form is the one-byte id followed by the payload; see
/// [`frame`](super::frame) for the length-prefixed stream representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Choke,
    Unchoke,
    Interested,
    NotInterested,
    Have { piece: u32 },
    Bitfield(Bitfield),
    Request { index: u32, begin: u32, length: u32 },
    Piece { index: u32, begin: u32, block: Bytes },
    Cancel { index: u32, begin: u32, length: u32 },
    Port(u16),
}

impl Message {
    pub fn id(&self) -> MessageId {
        match self {
            Message::Choke => MessageId::Choke,
            Message::Unchoke => MessageId::Unchoke,
            Message::Interested => MessageId::Interested,
            Message::NotInterested => MessageId::NotInterested,
            Message::Have { .. } => MessageId::Have,
            Message::Bitfield(_) => MessageId::Bitfield,
            Message::Request { .. } => MessageId::Request,
            Message::Piece { .. } => MessageId::Piece,
            Message::Cancel { .. } => MessageId::Cancel,
            Message::Port(_) => MessageId::Port,
        }
    }

    /// Encoded size in bytes, id byte included, length prefix excluded.
    pub fn expected_size(&self) -> u32 {
        match self {
            Message::Choke | Message::Unchoke | Message::Interested | Message::NotInterested => 1,
            Message::Have { .. } => 5,
            Message::Bitfield(bits) => {
                u32::try_from(bits.as_bytes().len()).map_or(u32::MAX, |n| n.saturating_add(1))
            }
            Message::Request { .. } | Message::Cancel { .. } => 13,
            Message::Piece { block, .. } => {
                u32::try_from(block.len()).map_or(u32::MAX, |n| n.saturating_add(9))
            }
            Message::Port(_) => 3,
        }
    }

    /// Writes the id byte and payload into `buf`.
    pub fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.id() as u8);

        match self {
            Message::Choke | Message::Unchoke | Message::Interested | Message::NotInterested => {}
            Message::Have { piece } => buf.put_u32(*piece),
            Message::Bitfield(bits) => buf.put_slice(bits.as_bytes()),
            Message::Request {
                index,
                begin,
                length,
            }
            | Message::Cancel {
                index,
                begin,
                length,
            } => {
                buf.put_u32(*index);
                buf.put_u32(*begin);
                buf.put_u32(*length);
            }
            Message::Piece {
                index,
                begin,
                block,
            } => {
                buf.put_u32(*index);
                buf.put_u32(*begin);
                buf.put_slice(block);
            }
            Message::Port(port) => buf.put_u16(*port),
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.expected_size() as usize);
        self.write(&mut buf);
        buf.freeze()
    }

    /// Parses one unframed message.
    ///
    /// `bit_count` is the number of pieces in the torrent and is only used to
    /// validate bitfield messages. Every fixed-size message must have exactly
    /// its layout length; a piece message carries whatever follows its
    /// 9-byte header as the block.
    pub fn parse(mut data: Bytes, bit_count: usize) -> Result<Self, PeerError> {
        if data.is_empty() {
            return Err(PeerError::InvalidMessage("empty message".into()));
        }

        let total = data.len();
        let id = MessageId::try_from(data.get_u8())?;
        let exact = |len: usize| {
            if total == len {
                Ok(())
            } else {
                Err(PeerError::InvalidLength {
                    kind: id.name(),
                    len: total,
                })
            }
        };

        match id {
            MessageId::Choke => exact(1).map(|_| Message::Choke),
            MessageId::Unchoke => exact(1).map(|_| Message::Unchoke),
            MessageId::Interested => exact(1).map(|_| Message::Interested),
            MessageId::NotInterested => exact(1).map(|_| Message::NotInterested),
            MessageId::Have => {
                exact(5)?;
                Ok(Message::Have {
                    piece: data.get_u32(),
                })
            }
            MessageId::Bitfield => {
                exact(1 + bit_count.div_ceil(8))?;
                Ok(Message::Bitfield(Bitfield::parse(&data, bit_count)?))
            }
            MessageId::Request => {
                exact(13)?;
                Ok(Message::Request {
                    index: data.get_u32(),
                    begin: data.get_u32(),
                    length: data.get_u32(),
                })
            }
            MessageId::Piece => {
                if total < 9 {
                    return Err(PeerError::InvalidLength {
                        kind: id.name(),
                        len: total,
                    });
                }
                let index = data.get_u32();
                let begin = data.get_u32();
                Ok(Message::Piece {
                    index,
                    begin,
                    block: data,
                })
            }
            MessageId::Cancel => {
                exact(13)?;
                Ok(Message::Cancel {
                    index: data.get_u32(),
                    begin: data.get_u32(),
                    length: data.get_u32(),
                })
            }
            MessageId::Port => {
                exact(3)?;
                Ok(Message::Port(data.get_u16()))
            }
        }
    }
}
