use bsonkit::{
    decode, encode, Binary, BinarySubtype, DateTime, DecodeError, Decoder, DecoderOptions,
    Document, ElementType, EncodeError, JavaScriptCodeWithScope, Regex, Value,
};

fn fixtures() -> Vec<Vec<u8>> {
    let docs = [
        Document::new().with("hello", "world"),
        Document::new().with("TRUE", true).with("FALSE", false),
        Document::new().with("int64", 9_876_543_210i64).with("int32", 1984),
        Document::new().with("date", DateTime::from_secs(1_294_860_709)),
        Document::new().with("regex", Regex::new("foo.*bar", "i")),
        Document::new().with(
            "bin",
            Binary::new(BinarySubtype::BINARY_OLD, b"legacy".to_vec()),
        ),
        Document::new()
            .with("user", Document::new().with("name", "V.A. Lucky").with("id", 12345))
            .with("posts", vec![Value::from("first!"), Value::Null]),
    ];
    docs.iter().map(|d| encode(d).unwrap()).collect()
}

#[test]
fn every_strict_prefix_is_truncated() {
    for bytes in fixtures() {
        for len in 1..bytes.len() {
            assert_eq!(
                decode(&bytes[..len]),
                Err(DecodeError::TruncatedInput),
                "prefix of {len} bytes of {bytes:?}"
            );
        }
    }
}

#[test]
fn flipped_tag_is_unknown_type() {
    let unused = (0x13..=0x7eu8).chain(0x80..=0xfe);
    for tag in unused {
        for bytes in fixtures() {
            let mut corrupt = bytes.clone();
            corrupt[4] = tag;
            assert_eq!(
                decode(&corrupt),
                Err(DecodeError::UnknownType(tag)),
                "tag 0x{tag:02x}"
            );
        }
    }
}

#[test]
fn decimal128_is_not_supported() {
    assert_eq!(ElementType::from_u8(0x13), None);
    let mut data = vec![0x18, 0, 0, 0, 0x13, b'd', 0];
    data.extend_from_slice(&[0u8; 16]);
    data.push(0);
    assert_eq!(decode(&data), Err(DecodeError::UnknownType(0x13)));
}

#[test]
fn length_mismatch_matrix() {
    let good = encode(&Document::new().with("hello", "world")).unwrap();

    // Declared document length one short: the terminator falls outside the frame.
    let mut short = good.clone();
    short[0] -= 1;
    assert_eq!(decode(&short), Err(DecodeError::LengthMismatch));

    // String length one short: the byte before the declared end is not NUL.
    let mut string_short = good.clone();
    string_short[11] -= 1;
    assert_eq!(decode(&string_short), Err(DecodeError::LengthMismatch));

    // Negative string length.
    let mut negative = good.clone();
    negative[11..15].copy_from_slice(&(-1i32).to_le_bytes());
    assert_eq!(decode(&negative), Err(DecodeError::LengthMismatch));

    // Trailing garbage after a complete document.
    let mut trailing = good.clone();
    trailing.push(0);
    assert_eq!(decode(&trailing), Err(DecodeError::LengthMismatch));
}

#[test]
fn inner_length_cannot_escape_outer_frame() {
    // {"a": {}} with the inner document claiming 7 bytes instead of 5.
    let data = b"\x0d\0\0\0\x03a\0\x07\0\0\0\0\0";
    assert_eq!(decode(data), Err(DecodeError::TruncatedInput));
}

#[test]
fn code_with_scope_total_matrix() {
    let doc = Document::new().with(
        "j",
        Value::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
            code: "f".into(),
            scope: Document::new(),
        }),
    );
    let good = encode(&doc).unwrap();
    let total = i32::from_le_bytes([good[7], good[8], good[9], good[10]]);
    assert_eq!(total, 15);

    for delta in [-2, -1, 1] {
        let mut bad = good.clone();
        bad[7..11].copy_from_slice(&(total + delta).to_le_bytes());
        assert_eq!(decode(&bad), Err(DecodeError::LengthMismatch), "delta {delta}");
    }

    // A total reaching past the enclosing document.
    let mut past = good.clone();
    past[7..11].copy_from_slice(&(total + 2).to_le_bytes());
    assert_eq!(decode(&past), Err(DecodeError::TruncatedInput));

    // Code string longer than the declared total.
    let mut code = good.clone();
    code[11] = 0x06;
    assert_eq!(decode(&code), Err(DecodeError::LengthMismatch));
}

#[test]
fn invalid_utf8_matrix() {
    // Key.
    let key = [0x08, 0, 0, 0, 0x0a, 0xc3, 0, 0];
    assert_eq!(decode(&key), Err(DecodeError::InvalidUtf8));
    // String value.
    let value = b"\x0e\0\0\0\x02s\0\x02\0\0\0\xff\0\0";
    assert_eq!(decode(value), Err(DecodeError::InvalidUtf8));
}

#[test]
fn invalid_boolean_matrix() {
    for byte in [2u8, 0x7f, 0xff] {
        let data = [0x09, 0, 0, 0, 0x08, b'b', 0, byte, 0];
        assert_eq!(decode(&data), Err(DecodeError::InvalidBoolean(byte)));
    }
}

#[test]
fn nesting_depth_matrix() {
    let mut doc = Document::new();
    for _ in 0..10 {
        doc = Document::new().with("d", doc);
    }
    let bytes = encode(&doc).unwrap();

    // Eleven documents deep counting the root.
    let limited = |max_depth| {
        Decoder::with_options(DecoderOptions {
            max_depth,
            ..DecoderOptions::default()
        })
    };
    assert_eq!(limited(11).decode(&bytes), Ok(doc));
    assert_eq!(
        limited(10).decode(&bytes),
        Err(DecodeError::NestingTooDeep(10))
    );

    // Arrays count toward the same limit.
    let mut arr = Value::Array(Vec::new());
    for _ in 0..4 {
        arr = Value::Array(vec![arr]);
    }
    let bytes = encode(&Document::new().with("a", arr)).unwrap();
    assert!(limited(6).decode(&bytes).is_ok());
    assert_eq!(limited(5).decode(&bytes), Err(DecodeError::NestingTooDeep(5)));
}

#[test]
fn default_depth_limit_rejects_hostile_nesting() {
    // 200 nested empty-keyed documents, built by hand.
    let depth = 200;
    let mut bytes = vec![5, 0, 0, 0, 0];
    for _ in 1..depth {
        let mut outer = vec![0, 0, 0, 0, 0x03, 0];
        outer.extend_from_slice(&bytes);
        outer.push(0);
        let len = outer.len() as i32;
        outer[..4].copy_from_slice(&len.to_le_bytes());
        bytes = outer;
    }
    assert_eq!(decode(&bytes), Err(DecodeError::NestingTooDeep(100)));
}

#[test]
fn encode_error_matrix() {
    let cases = [
        Document::new().with("bad\0key", 1),
        Document::new().with("ok", Document::new().with("nested\0", 1)),
        Document::new().with("re", Regex::new("a\0b", "")),
        Document::new().with("re", Regex::new("ab", "i\0")),
    ];
    for doc in cases {
        assert!(
            matches!(encode(&doc), Err(EncodeError::EmbeddedNulInKeyOrPattern(_))),
            "{doc:?}"
        );
    }
}

#[test]
fn arbitrary_garbage_never_panics() {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    for len in 0..256usize {
        let mut data = Vec::with_capacity(len);
        for _ in 0..len {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            data.push(state as u8);
        }
        if data.len() >= 4 {
            data[..4].copy_from_slice(&(len as i32).to_le_bytes());
        }
        let _ = decode(&data);
    }
}
