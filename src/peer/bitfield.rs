use bytes::Bytes;

use super::error::PeerError;

/// A bitfield representing which pieces a peer has.
///
/// Each bit represents whether a piece is available (1) or not (0).
/// Bits are numbered from the high bit of the first byte; spare bits in the
/// last byte are always zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitfield {
    bits: Vec<u8>,
    len: usize,
}

impl Bitfield {
    /// Creates an empty bitfield holding `len` bits.
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![0; len.div_ceil(8)],
            len,
        }
    }

    /// Creates a bitfield with every bit set.
    pub fn full(len: usize) -> Self {
        let mut bf = Self {
            bits: vec![0xFF; len.div_ceil(8)],
            len,
        };
        bf.clear_spare_bits();
        bf
    }

    pub fn from_bools(bools: &[bool]) -> Self {
        let mut bf = Self::new(bools.len());
        for (index, &bit) in bools.iter().enumerate() {
            if bit {
                bf.set(index);
            }
        }
        bf
    }

    /// Parses a bitfield payload for `len` bits.
    ///
    /// The payload must be exactly `ceil(len / 8)` bytes and every padding bit
    /// past `len` must be zero.
    pub fn parse(payload: &[u8], len: usize) -> Result<Self, PeerError> {
        let expected = len.div_ceil(8);
        if payload.len() != expected {
            return Err(PeerError::InvalidBitfield(format!(
                "expected {expected} bytes for {len} bits, got {}",
                payload.len()
            )));
        }

        let bf = Self {
            bits: payload.to_vec(),
            len,
        };
        if bf.spare_bits() != 0 {
            return Err(PeerError::InvalidBitfield("padding bits are set".into()));
        }
        Ok(bf)
    }

    /// Returns true if the bit at `index` is set. Out of range reads as unset.
    pub fn get(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        (self.bits[index / 8] >> (7 - index % 8)) & 1 == 1
    }

    /// Sets the bit at `index`. Out of range indices are ignored.
    pub fn set(&mut self, index: usize) {
        if index >= self.len {
            return;
        }
        self.bits[index / 8] |= 1 << (7 - index % 8);
    }

    /// Clears the bit at `index`. Out of range indices are ignored.
    pub fn clear(&mut self, index: usize) {
        if index >= self.len {
            return;
        }
        self.bits[index / 8] &= !(1 << (7 - index % 8));
    }

    pub fn count_ones(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Number of logical bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if every bit is set.
    pub fn is_complete(&self) -> bool {
        self.count_ones() == self.len
    }

    /// The packed wire representation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.bits)
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(|i| self.get(i))
    }

    fn spare_mask(&self) -> u8 {
        match self.len % 8 {
            0 => 0,
            used => 0xFF >> used,
        }
    }

    fn spare_bits(&self) -> u8 {
        self.bits.last().map_or(0, |last| last & self.spare_mask())
    }

    fn clear_spare_bits(&mut self) {
        let mask = self.spare_mask();
        if let Some(last) = self.bits.last_mut() {
            *last &= !mask;
        }
    }
}
