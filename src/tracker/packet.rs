//! Big-endian packet building and parsing for the UDP tracker protocol.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::error::TrackerError;

/// Builds an outgoing packet.
#[derive(Debug, Default)]
pub struct PacketWriter {
    buf: BytesMut,
}

impl PacketWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.buf.put_u16(value);
        self
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32(value);
        self
    }

    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.buf.put_i32(value);
        self
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.buf.put_u64(value);
        self
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Reads fields from a received packet.
///
/// Every read is bounds-checked; running past the end is an
/// [`TrackerError::InvalidResponse`], never a panic.
#[derive(Debug)]
pub struct PacketReader<'a> {
    buf: &'a [u8],
}

impl<'a> PacketReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn need(&self, n: usize) -> Result<(), TrackerError> {
        if self.buf.remaining() < n {
            return Err(TrackerError::InvalidResponse(format!(
                "packet too short: need {} more bytes, have {}",
                n,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub fn read_u16(&mut self) -> Result<u16, TrackerError> {
        self.need(2)?;
        Ok(self.buf.get_u16())
    }

    pub fn read_u32(&mut self) -> Result<u32, TrackerError> {
        self.need(4)?;
        Ok(self.buf.get_u32())
    }

    pub fn read_u64(&mut self) -> Result<u64, TrackerError> {
        self.need(8)?;
        Ok(self.buf.get_u64())
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], TrackerError> {
        self.need(N)?;
        let mut out = [0u8; N];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Consumes and returns everything not read yet.
    pub fn rest(&mut self) -> &'a [u8] {
        let rest = self.buf;
        self.buf = &[];
        rest
    }
}
