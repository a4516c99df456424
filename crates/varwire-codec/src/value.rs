//! The tagged value model.
//!
//! [`Value`] is the recursively-structured runtime datum the whole system
//! serializes: every call argument, return value, and exception payload is
//! a `Value`. Mappings are keyed by byte strings in a `BTreeMap`, which
//! makes the canonical iteration order byte-lexicographic and encoding
//! deterministic by construction.

use std::collections::BTreeMap;
use std::fmt;

use crate::codec::CodecRef;
use crate::error::{CodecError, Result};

/// A heterogeneous, self-describing value.
///
/// Exactly one variant at a time; `Sequence` and `Mapping` elements are
/// themselves values, so the model is recursive and arbitrarily deep.
///
/// # Example
///
/// ```
/// use varwire_codec::Value;
///
/// let v = Value::mapping([
///     ("m", Value::from("sum")),
///     ("a", Value::Sequence(vec![Value::Int32(1), Value::Int32(2)])),
/// ]);
/// assert!(v.as_mapping().is_some());
/// ```
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(u8),
    Int32(i32),
    Int64(i64),
    Double(f64),
    /// Signed microseconds since the Unix epoch.
    Time(i64),
    /// A raw byte sequence. The binary/ascii/text distinction exists only
    /// in codec choice, not at the value level.
    String(Vec<u8>),
    Sequence(Vec<Value>),
    /// String-keyed map with unique keys in byte-lexicographic order.
    Mapping(BTreeMap<Vec<u8>, Value>),
    /// A codec travelling as data (the `Y` wire form).
    Type(CodecRef),
    /// An extensible named value (the `R`/`@` wire forms).
    Record(Box<Record>),
}

/// An extensible named value.
///
/// A record whose `type_name` is `"@"` is the unresolved,
/// registry-identified sentinel: it always carries a numeric `type_id`
/// and the raw undecoded payload bytes in `value`, never a resolved
/// codec. Re-encoding such a record reproduces the original bytes
/// exactly.
#[derive(Clone)]
pub struct Record {
    pub type_name: String,
    pub value: Value,
    pub type_id: i32,
    pub codec: Option<CodecRef>,
}

impl Record {
    /// A record with a known type name and payload.
    pub fn new(type_name: impl Into<String>, value: Value) -> Self {
        Record {
            type_name: type_name.into(),
            value,
            type_id: 0,
            codec: None,
        }
    }

    /// The unresolved sentinel: a numeric type id plus raw payload bytes.
    pub fn opaque(type_id: i32, payload: Vec<u8>) -> Self {
        Record {
            type_name: "@".to_string(),
            value: Value::String(payload),
            type_id,
            codec: None,
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        // Identity is (name, payload); the id and codec are resolution
        // artefacts.
        self.type_name == other.type_name && self.value == other.value
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.type_name, self.value)
    }
}

impl Value {
    /// The variant name, used in type-mismatch diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Double(_) => "double",
            Value::Time(_) => "time",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            Value::Type(_) => "type",
            Value::Record(_) => "record",
        }
    }

    /// Builds a mapping from `(key, value)` pairs.
    pub fn mapping<K, I>(entries: I) -> Value
    where
        K: Into<Vec<u8>>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        )
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(b) => Some(b),
            _ => None,
        }
    }

    /// The string bytes, lossily decoded as UTF-8.
    pub fn as_str_lossy(&self) -> Option<String> {
        self.as_bytes()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<Vec<u8>, Value>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Helper for codecs: fails with `ValueTypeMismatch` naming the
    /// expected type.
    pub(crate) fn mismatch(&self, expected: &'static str) -> CodecError {
        CodecError::ValueTypeMismatch {
            expected,
            found: self.variant_name().to_string(),
        }
    }

    pub(crate) fn expect_bytes(&self, expected: &'static str) -> Result<&[u8]> {
        self.as_bytes().ok_or_else(|| self.mismatch(expected))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Mapping(a), Value::Mapping(b)) => a == b,
            // Codecs are equal when they describe the same wire type.
            (Value::Type(a), Value::Type(b)) => {
                let (mut ha, mut hb) = (Vec::new(), Vec::new());
                a.encode_type(&mut ha);
                b.encode_type(&mut hb);
                ha == hb
            }
            (Value::Record(a), Value::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}u8", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}i64", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Time(v) => write!(f, "@{}us", v),
            Value::String(b) => write!(f, "{:?}", String::from_utf8_lossy(b)),
            Value::Sequence(items) => f.debug_list().entries(items).finish(),
            Value::Mapping(m) => {
                let mut map = f.debug_map();
                for (k, v) in m {
                    map.entry(&String::from_utf8_lossy(k), v);
                }
                map.finish()
            }
            Value::Type(c) => write!(f, "TYPE({})", c.type_name()),
            Value::Record(r) => write!(f, "{:?}", r),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Byte(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v.into_bytes())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::String(v)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(Box::new(r))
    }
}
