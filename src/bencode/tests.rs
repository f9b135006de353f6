use std::collections::BTreeMap;

use bytes::Bytes;
use proptest::prelude::*;

use super::*;

#[test]
fn test_decode_integer() {
    assert_eq!(decode(b"i42e").unwrap(), Node::integer(42));
    assert_eq!(decode(b"i-42e").unwrap(), Node::integer(-42));
    assert_eq!(decode(b"i0e").unwrap(), Node::integer(0));
    assert_eq!(
        decode(b"i-9223372036854775808e").unwrap(),
        Node::integer(i64::MIN)
    );
}

#[test]
fn test_decode_integer_invalid() {
    assert!(decode(b"i-0e").is_err());
    assert!(decode(b"i04e").is_err());
    assert!(decode(b"i03e").is_err());
    assert!(decode(b"ie").is_err());
    assert!(decode(b"i-e").is_err());
    assert!(decode(b"i--1e").is_err());
    assert!(decode(b"i12").is_err());
    assert!(decode(b"i9223372036854775808e").is_err());
}

#[test]
fn test_decode_bytes() {
    assert_eq!(decode(b"4:spam").unwrap(), Node::string("spam"));
    assert_eq!(decode(b"0:").unwrap(), Node::bytes(Bytes::new()));
}

#[test]
fn test_decode_bytes_invalid() {
    assert_eq!(decode(b"5:spam"), Err(BencodeError::UnexpectedEof));
    assert_eq!(decode(b"04:spam"), Err(BencodeError::InvalidStringLength));
    assert!(decode(b"4spam").is_err());
    assert!(decode(b"99999999999999999999999:x").is_err());
}

#[test]
fn test_decode_list() {
    let result = decode(b"l4:spami42ee").unwrap();
    let list = result.as_list().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0], Node::string("spam"));
    assert_eq!(list[1], Node::integer(42));
}

#[test]
fn test_decode_list_child_failure_aborts() {
    assert!(decode(b"l4:spami04ee").is_err());
    assert!(decode(b"l4:spam").is_err());
}

#[test]
fn test_decode_dict() {
    let result = decode(b"d3:cow3:moo4:spam4:eggse").unwrap();
    let dict = result.as_dict().unwrap();
    assert_eq!(dict.len(), 2);
    assert_eq!(result.get_str(b"cow"), Some("moo"));
    assert_eq!(result.get_str(b"spam"), Some("eggs"));
}

#[test]
fn test_decode_dict_duplicate_key() {
    assert_eq!(
        decode(b"d1:ai1e1:ai2ee"),
        Err(BencodeError::DuplicateKey("a".into()))
    );
}

#[test]
fn test_decode_dict_non_string_key() {
    assert!(decode(b"di1ei2ee").is_err());
}

#[test]
fn test_decode_unsorted_keys_lenient_by_default() {
    let node = decode(b"d1:bi1e1:ai2ee").unwrap();
    let keys: Vec<&[u8]> = node.as_dict().unwrap().keys().map(|k| k.as_ref()).collect();
    assert_eq!(keys, vec![b"a".as_slice(), b"b".as_slice()]);
    assert_eq!(encode(&node), b"d1:ai2e1:bi1ee");
}

#[test]
fn test_decode_unsorted_keys_strict() {
    let strict = DecodeOptions {
        strict_key_order: true,
        ..DecodeOptions::default()
    };
    assert!(matches!(
        decode_with(b"d1:bi1e1:ai2ee", &strict),
        Err(BencodeError::UnsortedKeys(_))
    ));
    assert!(decode_with(b"d1:ai2e1:bi1ee", &strict).is_ok());
}

#[test]
fn test_nesting_limit() {
    let mut data = vec![b'l'; 100];
    data.extend(vec![b'e'; 100]);
    assert_eq!(decode(&data), Err(BencodeError::NestingTooDeep));

    let shallow = DecodeOptions {
        max_depth: 200,
        ..DecodeOptions::default()
    };
    assert!(decode_with(&data, &shallow).is_ok());
}

#[test]
fn test_unknown_leading_byte() {
    assert_eq!(
        decode(b"x"),
        Err(BencodeError::UnexpectedChar { found: 'x', pos: 0 })
    );
    assert_eq!(decode(b""), Err(BencodeError::UnexpectedEof));
}

#[test]
fn test_trailing_data_error() {
    assert_eq!(decode(b"i42eextra"), Err(BencodeError::TrailingData(4)));
}

#[test]
fn test_decode_prefix_offsets() {
    let data = b"xxi7e4:spam";
    let (node, end) = decode_prefix(data, 2).unwrap();
    assert_eq!(node, Node::integer(7));
    assert_eq!(end, 5);
    assert_eq!(node.span(), Some(Span::new(2, 5)));

    let (node, end) = decode_prefix(data, end).unwrap();
    assert_eq!(node.as_str(), Some("spam"));
    assert_eq!(end, data.len());

    assert!(decode_prefix(data, 100).is_err());
}

#[test]
fn test_decode_prefix_strings_after_offset() {
    let data = b"junk-before-d3:key5:valuee";
    let (node, end) = decode_prefix(data, 12).unwrap();
    assert_eq!(end, data.len());
    assert_eq!(node.get_str(b"key"), Some("value"));
    assert_eq!(node.span(), Some(Span::new(12, data.len())));
    assert_eq!(node.get(b"key").unwrap().raw(data).unwrap(), b"5:value");
}

#[test]
fn test_spans() {
    let data = b"d4:listl4:spami42ee3:numi-3ee";
    let root = decode(data).unwrap();
    assert_eq!(root.span(), Some(Span::new(0, data.len())));

    let list = root.get(b"list").unwrap();
    assert_eq!(list.raw(data).unwrap(), b"l4:spami42ee");
    assert_eq!(list.as_list().unwrap()[1].raw(data).unwrap(), b"i42e");
    assert_eq!(root.get(b"num").unwrap().raw(data).unwrap(), b"i-3e");
}

#[test]
fn test_built_nodes_have_no_span() {
    let node = Node::integer(1);
    assert_eq!(node.span(), None);
    assert_eq!(node.raw(b"i1e"), None);
}

#[test]
fn test_encode_integer() {
    assert_eq!(encode(&Node::integer(42)), b"i42e");
    assert_eq!(encode(&Node::integer(-42)), b"i-42e");
    assert_eq!(encode(&Node::integer(0)), b"i0e");
}

#[test]
fn test_encode_bytes() {
    assert_eq!(encode(&Node::string("spam")), b"4:spam");
    assert_eq!(encode(&Node::bytes(Bytes::new())), b"0:");
}

#[test]
fn test_encode_list() {
    let list = Node::list(vec![Node::string("spam"), Node::integer(42)]);
    assert_eq!(encode(&list), b"l4:spami42ee");
}

#[test]
fn test_encode_dict_canonical_order() {
    let dict = Node::dict([("aa", Node::integer(3)), ("a", Node::string("b"))]);
    assert_eq!(encode(&dict), b"d1:a1:b2:aai3ee");

    let mut map = BTreeMap::new();
    map.insert(Bytes::from_static(b"zz"), Node::integer(1));
    map.insert(Bytes::from_static(b"\x01"), Node::integer(2));
    assert_eq!(encode(&Node::from(map)), b"d1:\x01i2e2:zzi1ee");
}

#[test]
fn test_roundtrip() {
    let original = b"d8:announce15:http://test.com4:infod4:name4:test12:piece lengthi16384eee";
    let decoded = decode(original).unwrap();
    assert_eq!(encode(&decoded), original);
}

#[test]
fn test_node_accessors() {
    let node = decode(b"d1:ai1e1:b1:x1:cle1:ddee").unwrap();
    assert_eq!(node.get_int(b"a"), Some(1));
    assert_eq!(node.get_str(b"b"), Some("x"));
    assert_eq!(node.get_list(b"c").map(|l| l.len()), Some(0));
    assert_eq!(node.get_dict(b"d").map(|d| d.len()), Some(0));

    assert_eq!(node.get_int(b"b"), None);
    assert_eq!(node.get_str(b"a"), None);
    assert_eq!(node.get(b"missing"), None);
    assert_eq!(Node::integer(1).get(b"a"), None);
}

#[test]
fn test_as_str_rejects_invalid_utf8() {
    let node = decode(b"2:\xff\xfe").unwrap();
    assert!(node.as_bytes().is_some());
    assert_eq!(node.as_str(), None);
}

#[test]
fn test_display() {
    let node = decode(b"d1:ai1e1:bl1:xee").unwrap();
    assert_eq!(node.to_string(), r#"{ "a": 1; "b": [ "x" ]; }"#);
    assert_eq!(Node::bytes(vec![b'z'; 60]).to_string(), "<string of length 60>");
}

fn arb_node() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Node::integer),
        proptest::collection::vec(any::<u8>(), 0..16).prop_map(Node::bytes),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(Node::list),
            proptest::collection::btree_map(
                proptest::collection::vec(any::<u8>(), 0..8),
                inner,
                0..6
            )
            .prop_map(Node::dict),
        ]
    })
}

fn check_spans(node: &Node, data: &[u8]) {
    let raw = node.raw(data).expect("decoded node has a span");
    assert_eq!(&decode(raw).unwrap(), node);

    match node.value() {
        Value::List(items) => items.iter().for_each(|n| check_spans(n, data)),
        Value::Dict(dict) => dict.values().for_each(|n| check_spans(n, data)),
        _ => {}
    }
}

proptest! {
    #[test]
    fn prop_roundtrip(node in arb_node()) {
        let encoded = encode(&node);
        prop_assert_eq!(decode(&encoded).unwrap(), node);
    }

    #[test]
    fn prop_spans_are_exact(node in arb_node()) {
        let encoded = encode(&node);
        let (decoded, end) = decode_prefix(&encoded, 0).unwrap();
        prop_assert_eq!(end, encoded.len());
        prop_assert_eq!(decoded.span(), Some(Span::new(0, encoded.len())));
        check_spans(&decoded, &encoded);
    }

    #[test]
    fn prop_decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..64)) {
        let _ = decode(&data);
    }
}
