//! Compound codecs: homogeneous arrays, string-keyed maps, fixed-arity
//! tuples, and named-field structs.
//!
//! Compound type headers are self-nesting: each writes its own byte
//! followed by the headers of its parameter codecs, so arbitrarily deep
//! types parse back through the registry with no side tables.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::codec::{Codec, CodecRef, Context, DecodeState};
use crate::error::{CodecError, Result};
use crate::reader::Reader;
use crate::registry::CodecFactory;
use crate::strings::{StringCodec, MAX_TOKEN_LEN};
use crate::value::Value;

fn header_byte(codec: &dyn Codec) -> u8 {
    let mut header = Vec::new();
    codec.encode_type(&mut header);
    header[0]
}

/// The `L` codec: 4-byte element count followed by untagged elements.
pub struct ArrayCodec {
    item: CodecRef,
}

impl ArrayCodec {
    pub fn new(item: CodecRef) -> Self {
        ArrayCodec { item }
    }
}

impl Codec for ArrayCodec {
    fn type_name(&self) -> String {
        format!("LIST({})", self.item.type_name())
    }

    fn encode_type(&self, out: &mut Vec<u8>) {
        out.push(b'L');
        self.item.encode_type(out);
    }

    fn encode(&self, out: &mut Vec<u8>, value: &Value, ctx: &dyn Context) -> Result<()> {
        let items = value
            .as_sequence()
            .ok_or_else(|| value.mismatch("sequence"))?;
        out.extend_from_slice(&(items.len() as u32).to_be_bytes());
        for item in items {
            self.item.encode(out, item, ctx)?;
        }
        Ok(())
    }

    fn decode(&self, input: &mut Reader<'_>, state: &DecodeState<'_>) -> Result<Value> {
        let count = input.read_len32()?;
        let mut items = Vec::new();
        for _ in 0..count {
            items.push(self.item.decode(input, state)?);
        }
        Ok(Value::Sequence(items))
    }
}

/// The `M` codec: 4-byte entry count, then key/value pairs in
/// byte-lexicographic key order. The key codec must be one of the four
/// string kinds.
pub struct MapCodec {
    key: CodecRef,
    value: CodecRef,
}

impl MapCodec {
    pub fn new(key: CodecRef, value: CodecRef) -> Result<Self> {
        if !matches!(header_byte(key.as_ref()), b'r' | b'a' | b'u' | b'k') {
            return Err(CodecError::InvalidTypeParameters(format!(
                "map key codec must be a string kind, got {}",
                key.type_name()
            )));
        }
        Ok(MapCodec { key, value })
    }
}

impl Codec for MapCodec {
    fn type_name(&self) -> String {
        format!(
            "MAP({}, {})",
            self.key.type_name(),
            self.value.type_name()
        )
    }

    fn encode_type(&self, out: &mut Vec<u8>) {
        out.push(b'M');
        self.key.encode_type(out);
        self.value.encode_type(out);
    }

    fn encode(&self, out: &mut Vec<u8>, value: &Value, ctx: &dyn Context) -> Result<()> {
        let entries = value
            .as_mapping()
            .ok_or_else(|| value.mismatch("mapping"))?;
        out.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        // BTreeMap iteration is already byte-lexicographic on keys.
        for (k, v) in entries {
            self.key.encode(out, &Value::String(k.clone()), ctx)?;
            self.value.encode(out, v, ctx)?;
        }
        Ok(())
    }

    fn decode(&self, input: &mut Reader<'_>, state: &DecodeState<'_>) -> Result<Value> {
        let count = input.read_len32()?;
        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let key = self.key.decode(input, state)?;
            let key = match key {
                Value::String(bytes) => bytes,
                other => return Err(other.mismatch("string key")),
            };
            let value = self.value.decode(input, state)?;
            entries.insert(key, value);
        }
        Ok(Value::Mapping(entries))
    }
}

/// The `T` codec: fixed arity, untagged elements, no count in the value
/// encoding.
pub struct TupleCodec {
    items: Vec<CodecRef>,
}

impl TupleCodec {
    pub fn new(items: Vec<CodecRef>) -> Self {
        TupleCodec { items }
    }
}

impl Codec for TupleCodec {
    fn type_name(&self) -> String {
        let names: Vec<_> = self.items.iter().map(|c| c.type_name()).collect();
        format!("TUPLE({})", names.join(", "))
    }

    fn encode_type(&self, out: &mut Vec<u8>) {
        out.push(b'T');
        out.extend_from_slice(&(self.items.len() as u32).to_be_bytes());
        for item in &self.items {
            item.encode_type(out);
        }
    }

    fn encode(&self, out: &mut Vec<u8>, value: &Value, ctx: &dyn Context) -> Result<()> {
        let items = value
            .as_sequence()
            .ok_or_else(|| value.mismatch("sequence"))?;
        if items.len() != self.items.len() {
            return Err(CodecError::ValueTypeMismatch {
                expected: "sequence of tuple arity",
                found: format!("sequence of {} element(s)", items.len()),
            });
        }
        for (codec, item) in self.items.iter().zip(items) {
            codec.encode(out, item, ctx)?;
        }
        Ok(())
    }

    fn decode(&self, input: &mut Reader<'_>, state: &DecodeState<'_>) -> Result<Value> {
        let mut items = Vec::with_capacity(self.items.len());
        for codec in &self.items {
            items.push(codec.decode(input, state)?);
        }
        Ok(Value::Sequence(items))
    }
}

/// The `S` codec: named fields encoded in declared order; decodes to a
/// mapping keyed by field name.
pub struct StructCodec {
    fields: Vec<(Vec<u8>, CodecRef)>,
}

impl StructCodec {
    /// Field names are tokens and must fit the token length.
    pub fn new(fields: Vec<(Vec<u8>, CodecRef)>) -> Result<Self> {
        for (name, _) in &fields {
            if name.len() > MAX_TOKEN_LEN {
                return Err(CodecError::InvalidTypeParameters(format!(
                    "struct field name of {} bytes exceeds the token length",
                    name.len()
                )));
            }
        }
        Ok(StructCodec { fields })
    }
}

impl Codec for StructCodec {
    fn type_name(&self) -> String {
        let names: Vec<_> = self
            .fields
            .iter()
            .map(|(k, c)| format!("{}: {}", String::from_utf8_lossy(k), c.type_name()))
            .collect();
        format!("STRUCT({})", names.join(", "))
    }

    fn encode_type(&self, out: &mut Vec<u8>) {
        out.push(b'S');
        out.extend_from_slice(&(self.fields.len() as u32).to_be_bytes());
        for (name, codec) in &self.fields {
            StringCodec::TOKEN
                .encode_bytes(out, name)
                .expect("field name length is validated at construction");
            codec.encode_type(out);
        }
    }

    fn encode(&self, out: &mut Vec<u8>, value: &Value, ctx: &dyn Context) -> Result<()> {
        let entries = value
            .as_mapping()
            .ok_or_else(|| value.mismatch("mapping"))?;
        for (name, codec) in &self.fields {
            let field = entries.get(name).ok_or_else(|| {
                CodecError::ValueTypeMismatch {
                    expected: "mapping with all declared fields",
                    found: format!("missing field {:?}", String::from_utf8_lossy(name)),
                }
            })?;
            codec.encode(out, field, ctx)?;
        }
        Ok(())
    }

    fn decode(&self, input: &mut Reader<'_>, state: &DecodeState<'_>) -> Result<Value> {
        let mut entries = BTreeMap::new();
        for (name, codec) in &self.fields {
            entries.insert(name.clone(), codec.decode(input, state)?);
        }
        Ok(Value::Mapping(entries))
    }
}

pub(crate) fn factories() -> Vec<CodecFactory> {
    vec![
        CodecFactory::new(b'L', |input, state| {
            let item = state.registry.parse_header(input, state)?;
            Ok(Arc::new(ArrayCodec::new(item)) as CodecRef)
        }),
        CodecFactory::new(b'M', |input, state| {
            let key = state.registry.parse_header(input, state)?;
            let value = state.registry.parse_header(input, state)?;
            Ok(Arc::new(MapCodec::new(key, value)?) as CodecRef)
        }),
        CodecFactory::new(b'T', |input, state| {
            let arity = input.read_len32()?;
            let mut items = Vec::with_capacity(arity.min(64));
            for _ in 0..arity {
                items.push(state.registry.parse_header(input, state)?);
            }
            Ok(Arc::new(TupleCodec::new(items)) as CodecRef)
        }),
        CodecFactory::new(b'S', |input, state| {
            let count = input.read_len32()?;
            let mut fields = Vec::with_capacity(count.min(64));
            for _ in 0..count {
                let name = StringCodec::TOKEN.decode_bytes(input)?.to_vec();
                let codec = state.registry.parse_header(input, state)?;
                fields.push((name, codec));
            }
            Ok(Arc::new(StructCodec::new(fields)?) as CodecRef)
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::NullContext;
    use crate::primitive::{DoubleCodec, IntCodec};
    use crate::registry::TypeRegistry;

    fn state_fixture() -> TypeRegistry {
        TypeRegistry::with_builtins()
    }

    fn round_trip(codec: &dyn Codec, value: &Value) -> Value {
        let mut out = Vec::new();
        codec.encode(&mut out, value, &NullContext).unwrap();
        let registry = state_fixture();
        let state = DecodeState {
            registry: &registry,
            context: &NullContext,
        };
        let mut reader = Reader::new(&out);
        let decoded = codec.decode(&mut reader, &state).unwrap();
        assert!(reader.is_empty());
        decoded
    }

    fn int32() -> CodecRef {
        Arc::new(IntCodec::new(4, true).unwrap())
    }

    #[test]
    fn test_array_round_trip() {
        let codec = ArrayCodec::new(int32());
        let value = Value::Sequence(vec![Value::Int32(1), Value::Int32(-2), Value::Int32(3)]);
        assert_eq!(round_trip(&codec, &value), value);
        assert_eq!(
            round_trip(&codec, &Value::Sequence(vec![])),
            Value::Sequence(vec![])
        );
    }

    #[test]
    fn test_array_header_nests() {
        let codec = ArrayCodec::new(Arc::new(ArrayCodec::new(int32())));
        let mut header = Vec::new();
        codec.encode_type(&mut header);
        assert_eq!(header, b"LLi");
    }

    #[test]
    fn test_map_requires_string_key_codec() {
        assert!(matches!(
            MapCodec::new(int32(), int32()),
            Err(CodecError::InvalidTypeParameters(_))
        ));
        assert!(MapCodec::new(Arc::new(StringCodec::TOKEN), int32()).is_ok());
    }

    #[test]
    fn test_map_encodes_in_key_order() {
        let codec = MapCodec::new(Arc::new(StringCodec::TOKEN), int32()).unwrap();
        let value = Value::mapping([("b", Value::Int32(2)), ("a", Value::Int32(1))]);
        let mut out = Vec::new();
        codec.encode(&mut out, &value, &NullContext).unwrap();
        // count=2, then "a" before "b" regardless of insertion order.
        assert_eq!(
            out,
            [
                0, 0, 0, 2, // entry count
                0, 1, b'a', 0, 0, 0, 1, // "a" -> 1
                0, 1, b'b', 0, 0, 0, 2, // "b" -> 2
            ]
        );
        assert_eq!(round_trip(&codec, &value), value);
    }

    #[test]
    fn test_tuple_fixed_arity() {
        let codec = TupleCodec::new(vec![int32(), Arc::new(DoubleCodec)]);
        let value = Value::Sequence(vec![Value::Int32(5), Value::Double(2.5)]);
        assert_eq!(round_trip(&codec, &value), value);

        let mut out = Vec::new();
        let short = Value::Sequence(vec![Value::Int32(5)]);
        assert!(codec.encode(&mut out, &short, &NullContext).is_err());
    }

    #[test]
    fn test_struct_decodes_to_mapping() {
        let codec = StructCodec::new(vec![
            (b"x".to_vec(), int32()),
            (b"y".to_vec(), Arc::new(DoubleCodec)),
        ])
        .unwrap();
        let value = Value::mapping([("x", Value::Int32(3)), ("y", Value::Double(4.0))]);
        assert_eq!(round_trip(&codec, &value), value);
    }

    #[test]
    fn test_struct_rejects_oversized_field_name() {
        let name = vec![b'x'; MAX_TOKEN_LEN + 1];
        assert!(matches!(
            StructCodec::new(vec![(name, int32())]),
            Err(CodecError::InvalidTypeParameters(_))
        ));
    }

    #[test]
    fn test_struct_missing_field_fails() {
        let codec = StructCodec::new(vec![(b"x".to_vec(), int32())]).unwrap();
        let mut out = Vec::new();
        let value = Value::mapping([("y", Value::Int32(3))]);
        assert!(matches!(
            codec.encode(&mut out, &value, &NullContext),
            Err(CodecError::ValueTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_struct_header_round_trips_through_registry() {
        let codec = StructCodec::new(vec![
            (b"name".to_vec(), Arc::new(StringCodec::TEXT) as CodecRef),
            (b"score".to_vec(), int32()),
        ])
        .unwrap();
        let mut header = Vec::new();
        codec.encode_type(&mut header);

        let registry = state_fixture();
        let state = DecodeState {
            registry: &registry,
            context: &NullContext,
        };
        let mut reader = Reader::new(&header);
        let parsed = registry.parse_header(&mut reader, &state).unwrap();
        assert!(reader.is_empty());
        assert_eq!(parsed.type_name(), codec.type_name());
    }

    #[test]
    fn test_deep_nesting_round_trip() {
        // Array of maps of arrays: depth 3.
        let codec = ArrayCodec::new(Arc::new(
            MapCodec::new(
                Arc::new(StringCodec::TOKEN),
                Arc::new(ArrayCodec::new(int32())),
            )
            .unwrap(),
        ));
        let value = Value::Sequence(vec![Value::mapping([(
            "xs",
            Value::Sequence(vec![Value::Int32(1), Value::Int32(2)]),
        )])]);
        assert_eq!(round_trip(&codec, &value), value);
    }

    #[test]
    fn test_truncated_array_fails() {
        let codec = ArrayCodec::new(int32());
        // Declares 2 elements but carries only one.
        let data = [0, 0, 0, 2, 0, 0, 0, 1];
        let registry = state_fixture();
        let state = DecodeState {
            registry: &registry,
            context: &NullContext,
        };
        let mut reader = Reader::new(&data);
        assert!(matches!(
            codec.decode(&mut reader, &state),
            Err(CodecError::UnexpectedEndOfData { .. })
        ));
    }
}
