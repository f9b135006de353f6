//! Percent-encoding for tracker query parameters.
//!
//! Tracker URLs carry raw binary values (info hashes, peer ids) in the query
//! string. Everything outside the RFC 3986 unreserved set is escaped as `%XX`.
//!
//! ```
//! use btwire::urlcodec::{url_decode, url_encode};
//!
//! let encoded = url_encode(b"\x12\x34abc~");
//! assert_eq!(encoded, "%124abc~");
//! assert_eq!(url_decode(&encoded).unwrap(), b"\x12\x34abc~");
//! ```

use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes that must be escaped: everything except `A-Z a-z 0-9 - . _ ~`.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

/// Percent-encodes arbitrary bytes for use as a query parameter value.
pub fn url_encode(bytes: &[u8]) -> String {
    percent_encode(bytes, QUERY_VALUE).to_string()
}

/// Returns `true` if `data` consists only of unreserved characters and
/// well-formed `%XX` escapes.
pub fn is_url_encoded(data: &str) -> bool {
    let bytes = data.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if bytes.len() - i < 3
                || !bytes[i + 1].is_ascii_hexdigit()
                || !bytes[i + 2].is_ascii_hexdigit()
            {
                return false;
            }
            i += 3;
        } else {
            if !is_unreserved(bytes[i]) {
                return false;
            }
            i += 1;
        }
    }
    true
}

/// Decodes a strictly percent-encoded string.
///
/// Returns `None` on a truncated or non-hex escape, or on any literal
/// character outside the unreserved set.
pub fn url_decode(encoded: &str) -> Option<Vec<u8>> {
    if !is_url_encoded(encoded) {
        return None;
    }
    Some(percent_decode_str(encoded).collect())
}

/// Converts a hex digest (e.g. `"c12fe1..."`) straight into its
/// percent-encoded form (`"%c1%2f%e1..."`), keeping the original case.
pub fn url_encode_hex(hex_digest: &str) -> Option<String> {
    if hex_digest.len() % 2 != 0 || !hex_digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let mut out = String::with_capacity(hex_digest.len() / 2 * 3);
    for pair in hex_digest.as_bytes().chunks_exact(2) {
        out.push('%');
        out.push(pair[0] as char);
        out.push(pair[1] as char);
    }
    Some(out)
}

/// Lower-case hex rendering of a binary id, for logs and display.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_unreserved_passthrough() {
        assert_eq!(url_encode(b"AZaz09-._~"), "AZaz09-._~");
    }

    #[test]
    fn test_encode_reserved_and_binary() {
        assert_eq!(url_encode(b" /?&"), "%20%2F%3F%26");
        assert_eq!(url_encode(&[0x00, 0xff]), "%00%FF");
    }

    #[test]
    fn test_decode_roundtrip_binary() {
        let data: Vec<u8> = (0u8..=255).collect();
        assert_eq!(url_decode(&url_encode(&data)).unwrap(), data);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(url_decode("%4").is_none());
        assert!(url_decode("%zz").is_none());
        assert!(url_decode("a b").is_none());
        assert_eq!(url_decode("%41%62c").unwrap(), b"Abc");
    }

    #[test]
    fn test_is_url_encoded() {
        assert!(is_url_encoded(""));
        assert!(is_url_encoded("abc%20"));
        assert!(!is_url_encoded("abc%2"));
        assert!(!is_url_encoded("a/b"));
    }

    #[test]
    fn test_url_encode_hex() {
        assert_eq!(url_encode_hex("c12F").unwrap(), "%c1%2F");
        assert!(url_encode_hex("abc").is_none());
        assert!(url_encode_hex("zz").is_none());
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0xde, 0xad, 0x01]), "dead01");
    }
}
