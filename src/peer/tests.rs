use super::*;
use bytes::Bytes;
use proptest::prelude::*;

fn parse(data: &[u8], bit_count: usize) -> Result<Message, PeerError> {
    Message::parse(Bytes::copy_from_slice(data), bit_count)
}

#[test]
fn test_bitfield() {
    let mut bf = Bitfield::new(100);
    assert!(!bf.get(0));

    bf.set(0);
    assert!(bf.get(0));

    bf.set(99);
    assert!(bf.get(99));

    bf.clear(0);
    assert!(!bf.get(0));

    assert_eq!(bf.count_ones(), 1);
    assert_eq!(bf.len(), 100);
    assert_eq!(bf.as_bytes().len(), 13);
}

#[test]
fn test_bitfield_out_of_range_ignored() {
    let mut bf = Bitfield::new(10);
    bf.set(10);
    bf.set(15);
    assert_eq!(bf.count_ones(), 0);
    assert!(!bf.get(15));
}

#[test]
fn test_bitfield_msb_first() {
    let mut bools = vec![false; 10];
    bools[0] = true;
    bools[9] = true;

    let bf = Bitfield::from_bools(&bools);
    assert_eq!(bf.as_bytes(), &[0x80, 0x40]);
    assert_eq!(bf.iter().collect::<Vec<_>>(), bools);
}

#[test]
fn test_bitfield_full() {
    let bf = Bitfield::full(10);
    assert_eq!(bf.as_bytes(), &[0xFF, 0xC0]);
    assert!(bf.is_complete());
    assert!(Bitfield::new(0).is_empty());
}

#[test]
fn test_bitfield_parse() {
    let bf = Bitfield::parse(&[0x80, 0x00], 16).unwrap();
    assert!(bf.get(0));
    assert!(!bf.get(1));

    assert!(matches!(
        Bitfield::parse(&[0x80], 16),
        Err(PeerError::InvalidBitfield(_))
    ));
    assert!(matches!(
        Bitfield::parse(&[0x80, 0x00, 0x00], 16),
        Err(PeerError::InvalidBitfield(_))
    ));
}

#[test]
fn test_bitfield_padding_must_be_zero() {
    assert!(Bitfield::parse(&[0xFF, 0xC0], 10).is_ok());
    assert!(matches!(
        Bitfield::parse(&[0xFF, 0xE0], 10),
        Err(PeerError::InvalidBitfield(_))
    ));
    assert!(Bitfield::parse(&[0x01], 8).is_ok());
}

#[test]
fn test_message_layouts() {
    assert_eq!(Message::Choke.encode().as_ref(), &[0]);
    assert_eq!(Message::NotInterested.encode().as_ref(), &[3]);
    assert_eq!(
        Message::Have { piece: 0x01020304 }.encode().as_ref(),
        &[4, 1, 2, 3, 4]
    );
    assert_eq!(
        Message::Request {
            index: 1,
            begin: 0x4000,
            length: 0x4000
        }
        .encode()
        .as_ref(),
        &[6, 0, 0, 0, 1, 0, 0, 0x40, 0, 0, 0, 0x40, 0]
    );
    assert_eq!(Message::Port(6881).encode().as_ref(), &[9, 0x1A, 0xE1]);
    assert_eq!(
        Message::Piece {
            index: 2,
            begin: 3,
            block: Bytes::from_static(b"abc"),
        }
        .encode()
        .as_ref(),
        &[7, 0, 0, 0, 2, 0, 0, 0, 3, b'a', b'b', b'c']
    );
}

#[test]
fn test_expected_size_matches_encoding() {
    let messages = vec![
        Message::Choke,
        Message::Unchoke,
        Message::Interested,
        Message::NotInterested,
        Message::Have { piece: 42 },
        Message::Bitfield(Bitfield::full(20)),
        Message::Request {
            index: 1,
            begin: 0,
            length: 16384,
        },
        Message::Piece {
            index: 1,
            begin: 0,
            block: Bytes::from_static(b"test data"),
        },
        Message::Cancel {
            index: 1,
            begin: 0,
            length: 16384,
        },
        Message::Port(6881),
    ];

    for msg in messages {
        let encoded = msg.encode();
        assert_eq!(encoded.len(), msg.expected_size() as usize, "{msg:?}");
        assert_eq!(encoded[0], msg.id() as u8);
        assert_eq!(Message::parse(encoded, 20).unwrap(), msg);
    }
}

#[test]
fn test_parse_rejects_wrong_lengths() {
    assert!(matches!(
        parse(&[0, 0], 0),
        Err(PeerError::InvalidLength { kind: "choke", len: 2 })
    ));
    assert!(matches!(
        parse(&[4, 0, 0, 1], 0),
        Err(PeerError::InvalidLength { kind: "have", .. })
    ));
    assert!(parse(&[4, 0, 0, 0, 1, 0], 0).is_err());
    assert!(parse(&[6; 12], 0).is_err());
    assert!(parse(&[8; 14], 0).is_err());
    assert!(parse(&[9, 1], 0).is_err());
    assert!(parse(&[7, 0, 0, 0, 0, 0, 0, 0], 0).is_err());
}

#[test]
fn test_parse_bitfield_message() {
    let msg = parse(&[5, 0xA0], 3).unwrap();
    let Message::Bitfield(bits) = msg else {
        panic!("expected bitfield");
    };
    assert_eq!(bits.iter().collect::<Vec<_>>(), vec![true, false, true]);

    assert!(matches!(
        parse(&[5, 0xA0, 0x00], 3),
        Err(PeerError::InvalidLength { .. })
    ));
    assert!(matches!(
        parse(&[5, 0xB0], 3),
        Err(PeerError::InvalidBitfield(_))
    ));
}

#[test]
fn test_parse_piece_block_is_remainder() {
    let msg = parse(&[7, 0, 0, 0, 5, 0, 0, 0, 9], 0).unwrap();
    assert_eq!(
        msg,
        Message::Piece {
            index: 5,
            begin: 9,
            block: Bytes::new(),
        }
    );
}

#[test]
fn test_parse_unknown_id() {
    assert_eq!(parse(&[20, 0], 0), Err(PeerError::InvalidMessageId(20)));
    assert!(matches!(parse(&[], 0), Err(PeerError::InvalidMessage(_))));
}

#[test]
fn test_encode_frame() {
    let frame = encode_frame(&Message::Interested);
    assert_eq!(frame.as_ref(), &[0, 0, 0, 1, 2]);
    assert_eq!(keep_alive().as_ref(), &[0, 0, 0, 0]);
}

#[test]
fn test_frame_decoder_partial_input() {
    let mut decoder = FrameDecoder::new();
    let frame = encode_frame(&Message::Have { piece: 3 });

    decoder.extend(&frame[..2]);
    assert_eq!(decoder.decode().unwrap(), None);
    decoder.extend(&frame[2..6]);
    assert_eq!(decoder.decode().unwrap(), None);
    decoder.extend(&frame[6..]);

    let Some(Frame::Message(body)) = decoder.decode().unwrap() else {
        panic!("expected message frame");
    };
    assert_eq!(body.as_ref(), &[4, 0, 0, 0, 3]);
    assert_eq!(decoder.buffered(), 0);
}

#[test]
fn test_frame_decoder_multiple_frames() {
    let mut decoder = FrameDecoder::new();
    decoder.extend(&keep_alive());
    decoder.extend(&encode_frame(&Message::Choke));
    decoder.extend(&encode_frame(&Message::Port(1)));

    assert_eq!(decoder.decode().unwrap(), Some(Frame::KeepAlive));
    assert_eq!(
        decoder.decode().unwrap(),
        Some(Frame::Message(Bytes::from_static(&[0])))
    );
    assert_eq!(
        decoder.decode().unwrap(),
        Some(Frame::Message(Bytes::from_static(&[9, 0, 1])))
    );
    assert_eq!(decoder.decode().unwrap(), None);
}

#[test]
fn test_frame_decoder_rejects_oversized() {
    let mut decoder = FrameDecoder::with_max_len(16);
    decoder.extend(&[0, 0, 0, 17]);
    assert_eq!(
        decoder.decode(),
        Err(PeerError::FrameTooLarge { len: 17, max: 16 })
    );
}

proptest! {
    #[test]
    fn prop_parse_never_panics(data in proptest::collection::vec(any::<u8>(), 0..64), bits in 0usize..512) {
        let _ = Message::parse(Bytes::from(data), bits);
    }

    #[test]
    fn prop_bitfield_roundtrip(bools in proptest::collection::vec(any::<bool>(), 0..200)) {
        let bf = Bitfield::from_bools(&bools);
        let parsed = Bitfield::parse(bf.as_bytes(), bools.len()).unwrap();
        prop_assert_eq!(parsed.iter().collect::<Vec<_>>(), bools);
    }
}
