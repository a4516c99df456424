//! Extensible named values: the `R` (record) and `@` (message) wire
//! forms.
//!
//! A sender can emit a named structured value whose shape the receiver
//! may not know. The verbose `R` form (token name + self-describing
//! payload) is always decodable; the compact `@` form (numeric type id +
//! opaque payload) needs a resolving [`Context`] on both ends. A
//! receiver without one still gets a lossless `"@"` record that
//! re-encodes to the original bytes exactly.

use std::sync::Arc;

use crate::any;
use crate::codec::{Codec, CodecRef, Context, DecodeState};
use crate::error::{CodecError, Result};
use crate::primitive::IntCodec;
use crate::reader::Reader;
use crate::registry::CodecFactory;
use crate::strings::StringCodec;
use crate::value::{Record, Value};

/// Encodes a record, choosing the wire form from what the context can
/// resolve.
pub fn encode_record(out: &mut Vec<u8>, rec: &Record, ctx: &dyn Context) -> Result<()> {
    // An opaque message holder passes straight through.
    if rec.type_name == "@" {
        let payload = rec.value.expect_bytes("raw message payload")?;
        out.push(b'@');
        IntCodec::INT32.encode_i64(out, rec.type_id as i64)?;
        StringCodec::RAW.encode_bytes(out, payload)?;
        return Ok(());
    }

    match ctx.named_codec(&rec.type_name) {
        Some((codec, type_id)) => {
            out.push(b'@');
            IntCodec::INT32.encode_i64(out, type_id as i64)?;
            let mut payload = Vec::new();
            codec.encode(&mut payload, &rec.value, ctx)?;
            StringCodec::RAW.encode_bytes(out, &payload)?;
        }
        None => {
            out.push(b'R');
            StringCodec::TOKEN.encode_bytes(out, rec.type_name.as_bytes())?;
            any::encode_value(out, &rec.value, ctx)?;
        }
    }
    Ok(())
}

/// The `R` codec: token type name followed by an Any-encoded payload.
pub struct RecordCodec;

impl Codec for RecordCodec {
    fn type_name(&self) -> String {
        "RECORD".to_string()
    }

    fn encode_type(&self, out: &mut Vec<u8>) {
        out.push(b'R');
    }

    fn encode(&self, out: &mut Vec<u8>, value: &Value, ctx: &dyn Context) -> Result<()> {
        match value {
            Value::Record(rec) => {
                StringCodec::TOKEN.encode_bytes(out, rec.type_name.as_bytes())?;
                any::encode_value(out, &rec.value, ctx)
            }
            other => Err(other.mismatch("record")),
        }
    }

    fn decode(&self, input: &mut Reader<'_>, state: &DecodeState<'_>) -> Result<Value> {
        let name = StringCodec::TOKEN.decode_bytes(input)?;
        let name = String::from_utf8_lossy(name).into_owned();
        let body = any::decode_value(input, state)?;
        Ok(Record::new(name, body).into())
    }
}

/// The `@` codec: int32 type id followed by a length-prefixed opaque
/// payload. The payload is decoded further only if the context resolves
/// the id.
pub struct MessageCodec;

impl Codec for MessageCodec {
    fn type_name(&self) -> String {
        "MESSAGE".to_string()
    }

    fn encode_type(&self, out: &mut Vec<u8>) {
        out.push(b'@');
    }

    fn encode(&self, out: &mut Vec<u8>, value: &Value, ctx: &dyn Context) -> Result<()> {
        match value {
            Value::Record(rec) => {
                // encode_record re-derives the form from the context. A
                // name the context cannot resolve falls back to the
                // verbose form, which has no valid `@` value encoding,
                // so it must be rejected rather than spliced in.
                let mut full = Vec::new();
                encode_record(&mut full, rec, ctx)?;
                if full.first() != Some(&b'@') {
                    return Err(CodecError::ValueTypeMismatch {
                        expected: "record resolvable to a message type id",
                        found: format!("unresolved record {:?}", rec.type_name),
                    });
                }
                out.extend_from_slice(&full[1..]);
                Ok(())
            }
            other => Err(other.mismatch("record")),
        }
    }

    fn decode(&self, input: &mut Reader<'_>, state: &DecodeState<'_>) -> Result<Value> {
        let type_id = IntCodec::INT32.decode_i64(input)? as i32;
        let payload = StringCodec::RAW.decode_bytes(input)?;

        match state.context.codec(type_id) {
            Some((codec, type_name)) => {
                let mut sub = Reader::new(payload);
                let value = codec.decode(&mut sub, state)?;
                Ok(Record {
                    type_name,
                    value,
                    type_id,
                    codec: Some(codec),
                }
                .into())
            }
            // Unresolvable: keep the raw bytes verbatim so re-encoding
            // is lossless.
            None => Ok(Record::opaque(type_id, payload.to_vec()).into()),
        }
    }
}

pub(crate) fn factories() -> Vec<CodecFactory> {
    vec![
        CodecFactory::new(b'R', |_, _| Ok(Arc::new(RecordCodec) as CodecRef)),
        CodecFactory::new(b'@', |_, _| Ok(Arc::new(MessageCodec) as CodecRef)),
    ]
}
