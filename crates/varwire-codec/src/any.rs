//! The self-describing `A` (any) and `Y` (type) codecs, plus the
//! top-level encode/decode entry points that pick a codec from a value's
//! runtime variant.

use std::sync::Arc;

use crate::codec::{Codec, CodecRef, Context, DecodeState};
use crate::compound::{ArrayCodec, MapCodec};
use crate::error::{CodecError, Result};
use crate::primitive::{BoolCodec, DoubleCodec, IntCodec, NullCodec, TimeCodec};
use crate::reader::Reader;
use crate::record;
use crate::registry::{CodecFactory, TypeRegistry};
use crate::strings::StringCodec;
use crate::value::Value;

/// The `A` codec: writes the runtime-chosen header for the value's
/// actual variant followed by that codec's encoding. Sequence and
/// mapping elements nest `A` recursively, so any value decodes anywhere.
pub struct AnyCodec;

impl Codec for AnyCodec {
    fn type_name(&self) -> String {
        "ANY".to_string()
    }

    fn encode_type(&self, out: &mut Vec<u8>) {
        out.push(b'A');
    }

    fn encode(&self, out: &mut Vec<u8>, value: &Value, ctx: &dyn Context) -> Result<()> {
        encode_value(out, value, ctx)
    }

    fn decode(&self, input: &mut Reader<'_>, state: &DecodeState<'_>) -> Result<Value> {
        decode_value(input, state)
    }
}

/// The `Y` codec: a codec travelling as data. The value encoding is the
/// described type's own header, parsed back through the registry.
pub struct TypeCodec;

impl Codec for TypeCodec {
    fn type_name(&self) -> String {
        "TYPE".to_string()
    }

    fn encode_type(&self, out: &mut Vec<u8>) {
        out.push(b'Y');
    }

    fn encode(&self, out: &mut Vec<u8>, value: &Value, _ctx: &dyn Context) -> Result<()> {
        match value {
            Value::Type(codec) => {
                codec.encode_type(out);
                Ok(())
            }
            other => Err(other.mismatch("type")),
        }
    }

    fn decode(&self, input: &mut Reader<'_>, state: &DecodeState<'_>) -> Result<Value> {
        Ok(Value::Type(state.registry.parse_header(input, state)?))
    }
}

/// Picks the wire codec for a value's runtime variant. Strings choose
/// the ascii flavour when every byte is below 0x80 and the raw flavour
/// otherwise; records have no single codec and are handled by the
/// record/message fallback.
pub fn codec_for(value: &Value) -> Option<CodecRef> {
    Some(match value {
        Value::Null => Arc::new(NullCodec) as CodecRef,
        Value::Bool(_) => Arc::new(BoolCodec),
        Value::Byte(_) => Arc::new(IntCodec::new(1, false).expect("builtin width")),
        Value::Int32(_) => Arc::new(IntCodec::new(4, true).expect("builtin width")),
        Value::Int64(_) => Arc::new(IntCodec::new(8, true).expect("builtin width")),
        Value::Double(_) => Arc::new(DoubleCodec),
        Value::Time(_) => Arc::new(TimeCodec),
        Value::String(bytes) => {
            if bytes.iter().all(|&b| b < 0x80) {
                Arc::new(StringCodec::ASCII)
            } else {
                Arc::new(StringCodec::RAW)
            }
        }
        Value::Sequence(_) => Arc::new(ArrayCodec::new(Arc::new(AnyCodec))),
        Value::Mapping(_) => Arc::new(
            MapCodec::new(Arc::new(StringCodec::TOKEN), Arc::new(AnyCodec))
                .expect("token is a string kind"),
        ),
        Value::Type(_) => Arc::new(TypeCodec),
        Value::Record(_) => return None,
    })
}

/// Encodes a value with its self-describing header, choosing the codec
/// from the runtime variant.
pub fn encode_value(out: &mut Vec<u8>, value: &Value, ctx: &dyn Context) -> Result<()> {
    match value {
        Value::Record(rec) => record::encode_record(out, rec, ctx),
        _ => {
            let codec = codec_for(value).expect("non-record values always have a codec");
            codec.encode_type(out);
            codec.encode(out, value, ctx)
        }
    }
}

/// Decodes one self-described value: parses the type header, then the
/// value bytes.
pub fn decode_value(input: &mut Reader<'_>, state: &DecodeState<'_>) -> Result<Value> {
    let codec = state.registry.parse_header(input, state)?;
    codec.decode(input, state)
}

/// Encodes a value to a fresh buffer.
pub fn encode_to_vec(value: &Value, ctx: &dyn Context) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_value(&mut out, value, ctx)?;
    Ok(out)
}

/// Decodes exactly one value from a buffer, failing with `TrailingData`
/// if any input remains.
pub fn decode_from_slice(
    data: &[u8],
    registry: &TypeRegistry,
    ctx: &dyn Context,
) -> Result<Value> {
    let state = DecodeState {
        registry,
        context: ctx,
    };
    let mut reader = Reader::new(data);
    let value = decode_value(&mut reader, &state)?;
    if !reader.is_empty() {
        return Err(CodecError::TrailingData(reader.remaining()));
    }
    Ok(value)
}

pub(crate) fn factories() -> Vec<CodecFactory> {
    vec![
        CodecFactory::new(b'A', |_, _| Ok(Arc::new(AnyCodec) as CodecRef)),
        CodecFactory::new(b'Y', |_, _| Ok(Arc::new(TypeCodec) as CodecRef)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::NullContext;

    fn round_trip(value: &Value) -> Value {
        let bytes = encode_to_vec(value, &NullContext).unwrap();
        let registry = TypeRegistry::with_builtins();
        decode_from_slice(&bytes, &registry, &NullContext).unwrap()
    }

    #[test]
    fn test_every_variant_round_trips() {
        let values = [
            Value::Null,
            Value::Bool(true),
            Value::Byte(200),
            Value::Int32(-42),
            Value::Int64(1 << 40),
            Value::Double(3.25),
            Value::Time(1_700_000_000_000_000),
            Value::from("hello"),
            Value::String(vec![0xff, 0x00, 0x80]),
        ];
        for v in values {
            assert_eq!(round_trip(&v), v);
        }
    }

    #[test]
    fn test_ascii_vs_raw_selection() {
        let ascii = encode_to_vec(&Value::from("abc"), &NullContext).unwrap();
        assert_eq!(ascii[0], b'a');
        let raw = encode_to_vec(&Value::String(vec![0x80]), &NullContext).unwrap();
        assert_eq!(raw[0], b'r');
    }

    #[test]
    fn test_nested_heterogeneous_round_trip() {
        let value = Value::mapping([
            (
                "list",
                Value::Sequence(vec![
                    Value::Int32(1),
                    Value::from("two"),
                    Value::Sequence(vec![Value::Null, Value::Double(3.0)]),
                ]),
            ),
            (
                "inner",
                Value::mapping([("deep", Value::mapping([("x", Value::Bool(false))]))]),
            ),
        ]);
        assert_eq!(round_trip(&value), value);
    }

    #[test]
    fn test_type_as_data_round_trips() {
        let codec: CodecRef = Arc::new(ArrayCodec::new(Arc::new(
            IntCodec::new(4, true).unwrap(),
        )));
        let value = Value::Type(codec);
        let decoded = round_trip(&value);
        match decoded {
            Value::Type(c) => assert_eq!(c.type_name(), "LIST(INT32)"),
            other => panic!("expected a type value, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_data_rejected() {
        let mut bytes = encode_to_vec(&Value::Int32(1), &NullContext).unwrap();
        bytes.push(0xaa);
        let registry = TypeRegistry::with_builtins();
        assert_eq!(
            decode_from_slice(&bytes, &registry, &NullContext).unwrap_err(),
            CodecError::TrailingData(1)
        );
    }

    #[test]
    fn test_truncated_any_fails_cleanly() {
        let bytes = encode_to_vec(&Value::from("hello world"), &NullContext).unwrap();
        let registry = TypeRegistry::with_builtins();
        for cut in 1..bytes.len() {
            let err = decode_from_slice(&bytes[..cut], &registry, &NullContext).unwrap_err();
            assert!(
                matches!(err, CodecError::UnexpectedEndOfData { .. }),
                "cut at {} gave {:?}",
                cut,
                err
            );
        }
    }
}
