use super::error::MetainfoError;
use crate::constants::SHA1_LEN;
use crate::urlcodec::url_encode;
use sha1::{Digest, Sha1};
use std::fmt;

/// The SHA-1 digest of a torrent's bencoded info dictionary.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfoHash(pub [u8; SHA1_LEN]);

impl InfoHash {
    /// Hashes the given info dictionary bytes.
    pub fn from_info_bytes(info: &[u8]) -> Self {
        Self(Sha1::digest(info).into())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetainfoError> {
        let arr: [u8; SHA1_LEN] = bytes
            .try_into()
            .map_err(|_| MetainfoError::InvalidInfoHash)?;
        Ok(Self(arr))
    }

    pub fn from_hex(s: &str) -> Result<Self, MetainfoError> {
        let bytes = hex::decode(s).map_err(|_| MetainfoError::InvalidInfoHash)?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SHA1_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Percent-encoded form, ready for a tracker query string.
    pub fn url_encoded(&self) -> String {
        url_encode(&self.0)
    }
}

impl From<[u8; SHA1_LEN]> for InfoHash {
    fn from(bytes: [u8; SHA1_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHash({})", self.to_hex())
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
