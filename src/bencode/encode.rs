use super::node::{Node, Value};
use bytes::BufMut;

/// Encodes a node tree to canonical bencode.
///
/// Dictionary keys are always written in ascending byte order and string
/// length prefixes are recomputed, so the output never depends on the buffer
/// a tree was decoded from.
///
/// # Examples
///
/// ```
/// use btwire::bencode::{encode, Node};
///
/// let dict = Node::dict([("aa", Node::integer(3)), ("a", Node::string("b"))]);
/// assert_eq!(encode(&dict), b"d1:a1:b2:aai3ee");
///
/// let list = Node::list(vec![Node::integer(1), Node::string("two")]);
/// assert_eq!(encode(&list), b"li1e3:twoe");
/// ```
pub fn encode(node: &Node) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_into(node, &mut buf);
    buf
}

/// Appends the encoding of `node` to `buf`.
pub fn encode_into<B: BufMut>(node: &Node, buf: &mut B) {
    match node.value() {
        Value::Integer(i) => {
            buf.put_u8(b'i');
            buf.put_slice(i.to_string().as_bytes());
            buf.put_u8(b'e');
        }
        Value::Bytes(b) => put_string(b, buf),
        Value::List(l) => {
            buf.put_u8(b'l');
            for item in l {
                encode_into(item, buf);
            }
            buf.put_u8(b'e');
        }
        Value::Dict(d) => {
            buf.put_u8(b'd');
            for (key, val) in d {
                put_string(key, buf);
                encode_into(val, buf);
            }
            buf.put_u8(b'e');
        }
    }
}

fn put_string<B: BufMut>(s: &[u8], buf: &mut B) {
    buf.put_slice(s.len().to_string().as_bytes());
    buf.put_u8(b':');
    buf.put_slice(s);
}
