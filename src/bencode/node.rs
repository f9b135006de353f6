use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// Half-open byte range `[begin, end)` a node occupied in its source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
}

impl Span {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.begin..self.end
    }
}

/// The payload of a bencode node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A signed 64-bit integer.
    Integer(i64),
    /// A byte string (may or may not be valid UTF-8).
    Bytes(Bytes),
    /// An ordered list of nodes.
    List(Vec<Node>),
    /// A dictionary keyed by raw bytes. Iteration is always in ascending
    /// byte order, whatever order the keys had on the wire.
    Dict(BTreeMap<Bytes, Node>),
}

/// A bencode value together with the span it was decoded from.
///
/// Nodes produced by [`decode`](super::decode) always carry a span; nodes
/// built in code do not. Equality is structural and ignores spans, so a
/// sub-slice re-decoded on its own compares equal to the original node.
///
/// # Examples
///
/// ```
/// use btwire::bencode::{decode, Node};
///
/// let root = decode(b"d3:cow3:moo4:spami42ee").unwrap();
/// assert_eq!(root.get_str(b"cow"), Some("moo"));
/// assert_eq!(root.get_int(b"spam"), Some(42));
/// assert_eq!(root.get_int(b"cow"), None);
///
/// let spam = root.get(b"spam").unwrap();
/// assert_eq!(spam.span().unwrap().range(), 17..21);
/// assert_eq!(*spam, Node::integer(42));
/// ```
#[derive(Debug, Clone)]
pub struct Node {
    value: Value,
    span: Option<Span>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Node {}

impl Node {
    /// Creates a node without source provenance.
    pub fn new(value: Value) -> Self {
        Self { value, span: None }
    }

    pub(crate) fn with_span(value: Value, span: Span) -> Self {
        Self {
            value,
            span: Some(span),
        }
    }

    pub fn integer(i: i64) -> Self {
        Self::new(Value::Integer(i))
    }

    pub fn bytes(b: impl Into<Bytes>) -> Self {
        Self::new(Value::Bytes(b.into()))
    }

    pub fn string(s: &str) -> Self {
        Self::new(Value::Bytes(Bytes::copy_from_slice(s.as_bytes())))
    }

    pub fn list(items: Vec<Node>) -> Self {
        Self::new(Value::List(items))
    }

    /// Builds a dictionary. Later duplicates of a key overwrite earlier ones.
    pub fn dict<K, I>(entries: I) -> Self
    where
        K: AsRef<[u8]>,
        I: IntoIterator<Item = (K, Node)>,
    {
        let dict = entries
            .into_iter()
            .map(|(k, v)| (Bytes::copy_from_slice(k.as_ref()), v))
            .collect();
        Self::new(Value::Dict(dict))
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// The `[begin, end)` range this node occupied in its source buffer.
    pub fn span(&self) -> Option<Span> {
        self.span
    }

    /// Returns the exact source bytes of this node, if it has a span that
    /// fits inside `buffer`.
    pub fn raw<'a>(&self, buffer: &'a [u8]) -> Option<&'a [u8]> {
        buffer.get(self.span?.range())
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.value {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match &self.value {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the byte string as UTF-8, if it is a byte string and valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match &self.value {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<Bytes, Node>> {
        match &self.value {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Looks up a key if this node is a dictionary.
    pub fn get(&self, key: &[u8]) -> Option<&Node> {
        self.as_dict()?.get(key)
    }

    pub fn get_int(&self, key: &[u8]) -> Option<i64> {
        self.get(key)?.as_integer()
    }

    pub fn get_bytes(&self, key: &[u8]) -> Option<&Bytes> {
        self.get(key)?.as_bytes()
    }

    pub fn get_str(&self, key: &[u8]) -> Option<&str> {
        self.get(key)?.as_str()
    }

    pub fn get_list(&self, key: &[u8]) -> Option<&[Node]> {
        self.get(key)?.as_list()
    }

    pub fn get_dict(&self, key: &[u8]) -> Option<&BTreeMap<Bytes, Node>> {
        self.get(key)?.as_dict()
    }

    /// Short name of the variant, used in validation messages.
    pub fn kind(&self) -> &'static str {
        match self.value {
            Value::Integer(_) => "integer",
            Value::Bytes(_) => "string",
            Value::List(_) => "list",
            Value::Dict(_) => "dictionary",
        }
    }
}

impl From<Value> for Node {
    fn from(v: Value) -> Self {
        Node::new(v)
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::integer(i)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::string(s)
    }
}

impl From<Bytes> for Node {
    fn from(b: Bytes) -> Self {
        Node::bytes(b)
    }
}

impl From<Vec<Node>> for Node {
    fn from(l: Vec<Node>) -> Self {
        Node::list(l)
    }
}

impl From<BTreeMap<Bytes, Node>> for Node {
    fn from(d: BTreeMap<Bytes, Node>) -> Self {
        Node::new(Value::Dict(d))
    }
}

const DISPLAY_STRING_LIMIT: usize = 50;

fn fmt_bytes(b: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match std::str::from_utf8(b) {
        Ok(s) if b.len() <= DISPLAY_STRING_LIMIT => write!(f, "{:?}", s),
        _ => write!(f, "<string of length {}>", b.len()),
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Bytes(b) => fmt_bytes(b, f),
            Value::List(items) if items.is_empty() => f.write_str("[]"),
            Value::List(items) => {
                f.write_str("[")?;
                for item in items {
                    write!(f, " {}", item)?;
                }
                f.write_str(" ]")
            }
            Value::Dict(dict) if dict.is_empty() => f.write_str("{}"),
            Value::Dict(dict) => {
                f.write_str("{")?;
                for (key, val) in dict {
                    f.write_str(" ")?;
                    fmt_bytes(key, f)?;
                    write!(f, ": {};", val)?;
                }
                f.write_str(" }")
            }
        }
    }
}
