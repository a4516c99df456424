//! Primitive codecs: null, boolean, fixed-width integers, IEEE-754
//! double, and timestamps. All multi-byte encodings are big-endian.

use std::sync::Arc;

use crate::codec::{Codec, CodecRef, Context, DecodeState};
use crate::error::{CodecError, Result};
use crate::reader::Reader;
use crate::registry::CodecFactory;
use crate::value::Value;

/// The `-` codec: encodes nothing, decodes to `Value::Null`.
pub struct NullCodec;

impl Codec for NullCodec {
    fn type_name(&self) -> String {
        "NULL".to_string()
    }

    fn encode_type(&self, out: &mut Vec<u8>) {
        out.push(b'-');
    }

    fn encode(&self, _out: &mut Vec<u8>, value: &Value, _ctx: &dyn Context) -> Result<()> {
        match value {
            Value::Null => Ok(()),
            other => Err(other.mismatch("null")),
        }
    }

    fn decode(&self, _input: &mut Reader<'_>, _state: &DecodeState<'_>) -> Result<Value> {
        Ok(Value::Null)
    }
}

/// The `b` codec: one byte, 0x01 or 0x00.
pub struct BoolCodec;

impl Codec for BoolCodec {
    fn type_name(&self) -> String {
        "BOOL".to_string()
    }

    fn encode_type(&self, out: &mut Vec<u8>) {
        out.push(b'b');
    }

    fn encode(&self, out: &mut Vec<u8>, value: &Value, _ctx: &dyn Context) -> Result<()> {
        match value {
            Value::Bool(v) => {
                out.push(if *v { 0x01 } else { 0x00 });
                Ok(())
            }
            other => Err(other.mismatch("bool")),
        }
    }

    fn decode(&self, input: &mut Reader<'_>, _state: &DecodeState<'_>) -> Result<Value> {
        Ok(Value::Bool(input.read_u8()? != 0x00))
    }
}

/// Fixed-width big-endian integer codec.
///
/// The signed/unsigned family covers widths 1, 2, 4 and 8 on eight
/// distinct type bytes (`c`/`h`/`i`/`q` signed, `B`/`H`/`I`/`Q`
/// unsigned). Decoding sign-extends only the leading byte when signed.
pub struct IntCodec {
    width: u8,
    signed: bool,
}

impl IntCodec {
    pub(crate) const INT32: IntCodec = IntCodec {
        width: 4,
        signed: true,
    };
    pub(crate) const INT64: IntCodec = IntCodec {
        width: 8,
        signed: true,
    };

    /// Fails with `InvalidTypeParameters` for any width other than
    /// 1, 2, 4 or 8.
    pub fn new(width: u8, signed: bool) -> Result<Self> {
        match width {
            1 | 2 | 4 | 8 => Ok(IntCodec { width, signed }),
            other => Err(CodecError::InvalidTypeParameters(format!(
                "unsupported integer width: {}",
                other
            ))),
        }
    }

    fn type_byte(&self) -> u8 {
        match (self.width, self.signed) {
            (1, true) => b'c',
            (2, true) => b'h',
            (4, true) => b'i',
            (8, true) => b'q',
            (1, false) => b'B',
            (2, false) => b'H',
            (4, false) => b'I',
            (8, false) => b'Q',
            _ => unreachable!("width validated at construction"),
        }
    }

    fn range(&self) -> (i64, i64) {
        let bits = 8 * self.width as u32;
        if self.signed {
            if self.width == 8 {
                (i64::MIN, i64::MAX)
            } else {
                (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
            }
        } else if self.width == 8 {
            // Values above i64::MAX are not representable in the model.
            (0, i64::MAX)
        } else {
            (0, (1i64 << bits) - 1)
        }
    }

    /// Writes `value` as `width` big-endian bytes, checking range.
    pub fn encode_i64(&self, out: &mut Vec<u8>, value: i64) -> Result<()> {
        let (min, max) = self.range();
        if value < min || value > max {
            return Err(CodecError::ValueTypeMismatch {
                expected: "integer in codec range",
                found: value.to_string(),
            });
        }
        for i in (0..self.width).rev() {
            out.push(((value >> (8 * i)) & 0xff) as u8);
        }
        Ok(())
    }

    /// Reads `width` big-endian bytes, sign-extending the leading byte
    /// when signed.
    pub fn decode_i64(&self, input: &mut Reader<'_>) -> Result<i64> {
        let bytes = input.read(self.width as usize)?;
        if !self.signed && self.width == 8 && bytes[0] & 0x80 != 0 {
            return Err(CodecError::ValueTypeMismatch {
                expected: "unsigned integer within i64 range",
                found: "uint64 above i64::MAX".to_string(),
            });
        }
        let mut acc: i64 = if self.signed {
            (bytes[0] as i8) as i64
        } else {
            bytes[0] as i64
        };
        for &b in &bytes[1..] {
            acc = (acc << 8) | b as i64;
        }
        Ok(acc)
    }

    fn value_to_i64(&self, value: &Value) -> Result<i64> {
        match value {
            Value::Byte(v) => Ok(*v as i64),
            Value::Int32(v) => Ok(*v as i64),
            Value::Int64(v) => Ok(*v),
            other => Err(other.mismatch("integer")),
        }
    }
}

impl Codec for IntCodec {
    fn type_name(&self) -> String {
        let prefix = if self.signed { "" } else { "U" };
        match self.width {
            1 => format!("{}BYTE", prefix),
            2 => format!("{}INT16", prefix),
            4 => format!("{}INT32", prefix),
            8 => format!("{}INT64", prefix),
            _ => unreachable!("width validated at construction"),
        }
    }

    fn encode_type(&self, out: &mut Vec<u8>) {
        out.push(self.type_byte());
    }

    fn encode(&self, out: &mut Vec<u8>, value: &Value, _ctx: &dyn Context) -> Result<()> {
        let v = self.value_to_i64(value)?;
        self.encode_i64(out, v)
    }

    fn decode(&self, input: &mut Reader<'_>, _state: &DecodeState<'_>) -> Result<Value> {
        let v = self.decode_i64(input)?;
        Ok(match (self.width, self.signed) {
            (1, false) => Value::Byte(v as u8),
            (8, _) => Value::Int64(v),
            // Unsigned 32-bit values above i32::MAX widen rather than wrap.
            (4, false) if v > i32::MAX as i64 => Value::Int64(v),
            _ => Value::Int32(v as i32),
        })
    }
}

/// The `d` codec: IEEE-754 binary64, network byte order unconditionally.
pub struct DoubleCodec;

impl Codec for DoubleCodec {
    fn type_name(&self) -> String {
        "FLOAT".to_string()
    }

    fn encode_type(&self, out: &mut Vec<u8>) {
        out.push(b'd');
    }

    fn encode(&self, out: &mut Vec<u8>, value: &Value, _ctx: &dyn Context) -> Result<()> {
        match value {
            Value::Double(v) => {
                out.extend_from_slice(&v.to_bits().to_be_bytes());
                Ok(())
            }
            other => Err(other.mismatch("double")),
        }
    }

    fn decode(&self, input: &mut Reader<'_>, _state: &DecodeState<'_>) -> Result<Value> {
        let bytes = input.read(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(Value::Double(f64::from_bits(u64::from_be_bytes(buf))))
    }
}

/// The `t` codec: signed 64-bit microseconds since the Unix epoch,
/// encoded exactly as the signed int64 codec.
pub struct TimeCodec;

impl Codec for TimeCodec {
    fn type_name(&self) -> String {
        "TIME".to_string()
    }

    fn encode_type(&self, out: &mut Vec<u8>) {
        out.push(b't');
    }

    fn encode(&self, out: &mut Vec<u8>, value: &Value, _ctx: &dyn Context) -> Result<()> {
        match value {
            Value::Time(us) => IntCodec::INT64.encode_i64(out, *us),
            other => Err(other.mismatch("time")),
        }
    }

    fn decode(&self, input: &mut Reader<'_>, _state: &DecodeState<'_>) -> Result<Value> {
        Ok(Value::Time(IntCodec::INT64.decode_i64(input)?))
    }
}

pub(crate) fn factories() -> Vec<CodecFactory> {
    let mut list = vec![
        CodecFactory::new(b'-', |_, _| Ok(Arc::new(NullCodec) as CodecRef)),
        CodecFactory::new(b'b', |_, _| Ok(Arc::new(BoolCodec) as CodecRef)),
        CodecFactory::new(b'd', |_, _| Ok(Arc::new(DoubleCodec) as CodecRef)),
        CodecFactory::new(b't', |_, _| Ok(Arc::new(TimeCodec) as CodecRef)),
    ];
    for (byte, width, signed) in [
        (b'c', 1u8, true),
        (b'h', 2, true),
        (b'i', 4, true),
        (b'q', 8, true),
        (b'B', 1, false),
        (b'H', 2, false),
        (b'I', 4, false),
        (b'Q', 8, false),
    ] {
        list.push(CodecFactory::new(byte, move |_, _| {
            Ok(Arc::new(IntCodec { width, signed }) as CodecRef)
        }));
    }
    list
}
