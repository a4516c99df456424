//! Cross-codec integration tests: self-describing round-trips over the
//! public API, exact wire bytes, and failure behaviour on hostile input.

use varwire_codec::{
    decode_from_slice, encode_to_vec, CodecError, NullContext, TypeRegistry, Value,
};

fn round_trip(value: &Value) -> Value {
    let bytes = encode_to_vec(value, &NullContext).unwrap();
    let registry = TypeRegistry::with_builtins();
    decode_from_slice(&bytes, &registry, &NullContext).unwrap()
}

#[test]
fn test_deeply_nested_structure_survives() {
    let value = Value::mapping([
        (
            "rows",
            Value::Sequence(vec![
                Value::mapping([
                    ("id", Value::Int64(1 << 40)),
                    ("name", Value::from("alpha")),
                    (
                        "scores",
                        Value::Sequence(vec![Value::Double(0.5), Value::Double(-2.25)]),
                    ),
                ]),
                Value::mapping([
                    ("id", Value::Int64(2)),
                    ("name", Value::String(vec![0xc3, 0xa9])), // non-ascii
                    ("scores", Value::Sequence(vec![])),
                ]),
            ]),
        ),
        ("stamp", Value::Time(1_700_000_000_000_000)),
        ("ok", Value::Bool(true)),
        ("note", Value::Null),
    ]);
    assert_eq!(round_trip(&value), value);
}

#[test]
fn test_exact_bytes_for_self_described_int32() {
    // Header byte 'i' then four big-endian bytes.
    let bytes = encode_to_vec(&Value::Int32(42), &NullContext).unwrap();
    assert_eq!(bytes, [b'i', 0x00, 0x00, 0x00, 0x2a]);
    let bytes = encode_to_vec(&Value::Int32(-256), &NullContext).unwrap();
    assert_eq!(bytes, [b'i', 0xff, 0xff, 0xff, 0x00]);
}

#[test]
fn test_exact_bytes_for_call_shaped_mapping() {
    // The RPC layer depends on mappings encoding deterministically.
    let call = Value::mapping([
        ("m", Value::from("f")),
        ("a", Value::Sequence(vec![])),
    ]);
    let once = encode_to_vec(&call, &NullContext).unwrap();
    let twice = encode_to_vec(&call, &NullContext).unwrap();
    assert_eq!(once, twice);
    // 'M' header with token keys and any values, count, then "a" before "m".
    assert_eq!(&once[..3], b"MkA");
    assert_eq!(&once[3..7], [0, 0, 0, 2]);
    assert_eq!(&once[7..10], [0, 1, b'a']);
}

#[test]
fn test_every_truncation_of_a_compound_value_fails_cleanly() {
    let value = Value::mapping([
        ("k", Value::Sequence(vec![Value::Int32(7), Value::from("x")])),
    ]);
    let bytes = encode_to_vec(&value, &NullContext).unwrap();
    let registry = TypeRegistry::with_builtins();
    for cut in 0..bytes.len() {
        let err = decode_from_slice(&bytes[..cut], &registry, &NullContext).unwrap_err();
        assert!(
            matches!(err, CodecError::UnexpectedEndOfData { .. }),
            "cut at {} gave {:?}",
            cut,
            err
        );
    }
}

#[test]
fn test_garbage_type_byte_is_reported() {
    let registry = TypeRegistry::with_builtins();
    let err = decode_from_slice(&[0x00, 0x01], &registry, &NullContext).unwrap_err();
    assert_eq!(err, CodecError::UnknownTypeByte(0x00));
}
