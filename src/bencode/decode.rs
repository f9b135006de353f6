use super::error::BencodeError;
use super::node::{Node, Span, Value};
use crate::constants::MAX_BENCODE_DEPTH;
use bytes::Bytes;
use std::collections::BTreeMap;

/// Decoder settings.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Lists and dictionaries nested deeper than this are rejected.
    pub max_depth: usize,
    /// Reject dictionaries whose keys are not in ascending byte order.
    ///
    /// Off by default: out-of-order keys are accepted and the tree is
    /// canonicalised, which is what most clients in the wild do. Turn it on
    /// for strict BEP-3 conformance checks.
    pub strict_key_order: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_BENCODE_DEPTH,
            strict_key_order: false,
        }
    }
}

/// Decodes a complete buffer. Bytes left over after the root value are an error.
///
/// # Examples
///
/// ```
/// use btwire::bencode::{decode, BencodeError};
///
/// let node = decode(b"l4:spami42ee").unwrap();
/// assert_eq!(node.as_list().unwrap().len(), 2);
///
/// assert!(matches!(decode(b"i42eXX"), Err(BencodeError::TrailingData(4))));
/// ```
pub fn decode(data: &[u8]) -> Result<Node, BencodeError> {
    decode_with(data, &DecodeOptions::default())
}

/// Decodes a complete buffer with explicit options.
pub fn decode_with(data: &[u8], options: &DecodeOptions) -> Result<Node, BencodeError> {
    let (node, end) = decode_prefix_with(data, 0, options)?;
    if end != data.len() {
        return Err(BencodeError::TrailingData(end));
    }
    Ok(node)
}

/// Decodes one value starting at `offset` and returns it with the offset just
/// past it. Spans of the returned tree are relative to the start of `data`.
pub fn decode_prefix(data: &[u8], offset: usize) -> Result<(Node, usize), BencodeError> {
    decode_prefix_with(data, offset, &DecodeOptions::default())
}

pub fn decode_prefix_with(
    data: &[u8],
    offset: usize,
    options: &DecodeOptions,
) -> Result<(Node, usize), BencodeError> {
    let mut decoder = Decoder {
        data,
        source: Bytes::copy_from_slice(data.get(offset..).unwrap_or_default()),
        base: offset,
        pos: offset,
        options,
    };
    let node = decoder.value(0)?;
    Ok((node, decoder.pos))
}

struct Decoder<'a> {
    data: &'a [u8],
    // Byte strings are sliced out of one shared copy of `data[base..]`.
    source: Bytes,
    base: usize,
    pos: usize,
    options: &'a DecodeOptions,
}

impl Decoder<'_> {
    fn peek(&self) -> Result<u8, BencodeError> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(BencodeError::UnexpectedEof)
    }

    fn unexpected(&self, byte: u8) -> BencodeError {
        BencodeError::UnexpectedChar {
            found: byte as char,
            pos: self.pos,
        }
    }

    fn value(&mut self, depth: usize) -> Result<Node, BencodeError> {
        if depth > self.options.max_depth {
            return Err(BencodeError::NestingTooDeep);
        }

        match self.peek()? {
            b'i' => self.integer(),
            b'l' => self.list(depth),
            b'd' => self.dict(depth),
            b'0'..=b'9' => self.byte_string(),
            c => Err(self.unexpected(c)),
        }
    }

    fn integer(&mut self) -> Result<Node, BencodeError> {
        let begin = self.pos;
        self.pos += 1;

        let negative = self.peek()? == b'-';
        if negative {
            self.pos += 1;
        }

        let digits_start = self.pos;
        while self.peek()?.is_ascii_digit() {
            self.pos += 1;
        }
        let digits = &self.data[digits_start..self.pos];

        let terminator = self.peek()?;
        if terminator != b'e' {
            return Err(self.unexpected(terminator));
        }

        if digits.is_empty() {
            return Err(BencodeError::InvalidInteger("empty".into()));
        }
        if digits[0] == b'0' && (digits.len() > 1 || negative) {
            return Err(BencodeError::InvalidInteger("leading zeros".into()));
        }

        // Accumulate towards the sign so that i64::MIN parses.
        let mut value: i64 = 0;
        for &d in digits {
            let d = i64::from(d - b'0');
            value = value
                .checked_mul(10)
                .and_then(|v| if negative { v.checked_sub(d) } else { v.checked_add(d) })
                .ok_or_else(|| {
                    BencodeError::InvalidInteger(String::from_utf8_lossy(digits).into_owned())
                })?;
        }

        self.pos += 1;
        Ok(Node::with_span(
            Value::Integer(value),
            Span::new(begin, self.pos),
        ))
    }

    fn raw_string(&mut self) -> Result<Bytes, BencodeError> {
        let digits_start = self.pos;
        while self.peek()?.is_ascii_digit() {
            self.pos += 1;
        }
        let digits = &self.data[digits_start..self.pos];

        let colon = self.peek()?;
        if colon != b':' {
            return Err(self.unexpected(colon));
        }
        if digits.is_empty() || (digits[0] == b'0' && digits.len() > 1) {
            return Err(BencodeError::InvalidStringLength);
        }

        let mut len: usize = 0;
        for &d in digits {
            len = len
                .checked_mul(10)
                .and_then(|v| v.checked_add(usize::from(d - b'0')))
                .ok_or(BencodeError::InvalidStringLength)?;
        }

        self.pos += 1;
        if self.data.len() - self.pos < len {
            return Err(BencodeError::UnexpectedEof);
        }

        let start = self.pos - self.base;
        let bytes = self.source.slice(start..start + len);
        self.pos += len;
        Ok(bytes)
    }

    fn byte_string(&mut self) -> Result<Node, BencodeError> {
        let begin = self.pos;
        let bytes = self.raw_string()?;
        Ok(Node::with_span(
            Value::Bytes(bytes),
            Span::new(begin, self.pos),
        ))
    }

    fn list(&mut self, depth: usize) -> Result<Node, BencodeError> {
        let begin = self.pos;
        self.pos += 1;
        let mut list = Vec::new();

        while self.peek()? != b'e' {
            list.push(self.value(depth + 1)?);
        }

        self.pos += 1;
        Ok(Node::with_span(Value::List(list), Span::new(begin, self.pos)))
    }

    fn dict(&mut self, depth: usize) -> Result<Node, BencodeError> {
        let begin = self.pos;
        self.pos += 1;
        let mut dict: BTreeMap<Bytes, Node> = BTreeMap::new();
        let mut last_key: Option<Bytes> = None;

        loop {
            let c = self.peek()?;
            if c == b'e' {
                break;
            }
            if !c.is_ascii_digit() {
                return Err(self.unexpected(c));
            }

            let key = self.raw_string()?;
            let value = self.value(depth + 1)?;

            if dict.contains_key(&key) {
                return Err(BencodeError::DuplicateKey(
                    String::from_utf8_lossy(&key).into_owned(),
                ));
            }
            if self.options.strict_key_order && last_key.as_ref().is_some_and(|prev| *prev > key) {
                return Err(BencodeError::UnsortedKeys(
                    String::from_utf8_lossy(&key).into_owned(),
                ));
            }

            last_key = Some(key.clone());
            dict.insert(key, value);
        }

        self.pos += 1;
        Ok(Node::with_span(Value::Dict(dict), Span::new(begin, self.pos)))
    }
}
