//! The four string codecs.
//!
//! All four encode a length prefix followed by raw bytes; they differ in
//! prefix width and in what they accept at encode time:
//!
//! - `r` (raw): 4-byte prefix, any bytes.
//! - `a` (ascii): 4-byte prefix, rejects any byte >= 0x80.
//! - `u` (text): 4-byte prefix, unchecked UTF-8.
//! - `k` (token): 2-byte prefix, at most 32767 bytes.

use std::sync::Arc;

use crate::codec::{Codec, CodecRef, Context, DecodeState};
use crate::error::{CodecError, Result};
use crate::reader::Reader;
use crate::registry::CodecFactory;
use crate::value::Value;

pub const MAX_TOKEN_LEN: usize = 32767;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StringKind {
    Raw,
    Ascii,
    Text,
    Token,
}

impl StringKind {
    pub(crate) fn type_byte(self) -> u8 {
        match self {
            StringKind::Raw => b'r',
            StringKind::Ascii => b'a',
            StringKind::Text => b'u',
            StringKind::Token => b'k',
        }
    }
}

/// Codec for one of the four string flavours.
pub struct StringCodec {
    kind: StringKind,
}

impl StringCodec {
    pub const RAW: StringCodec = StringCodec {
        kind: StringKind::Raw,
    };
    pub const ASCII: StringCodec = StringCodec {
        kind: StringKind::Ascii,
    };
    pub const TEXT: StringCodec = StringCodec {
        kind: StringKind::Text,
    };
    pub const TOKEN: StringCodec = StringCodec {
        kind: StringKind::Token,
    };

    pub fn new(kind: StringKind) -> Self {
        StringCodec { kind }
    }

    pub fn kind(&self) -> StringKind {
        self.kind
    }

    /// Encodes raw bytes with this flavour's prefix and checks.
    pub(crate) fn encode_bytes(&self, out: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
        match self.kind {
            StringKind::Token => {
                if bytes.len() > MAX_TOKEN_LEN {
                    return Err(CodecError::TokenTooLong(bytes.len()));
                }
                out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
            }
            StringKind::Ascii => {
                if let Some(&b) = bytes.iter().find(|&&b| b >= 0x80) {
                    return Err(CodecError::NonAsciiByte(b));
                }
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            }
            StringKind::Raw | StringKind::Text => {
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            }
        }
        out.extend_from_slice(bytes);
        Ok(())
    }

    /// Decodes this flavour's prefix and returns the raw bytes.
    pub(crate) fn decode_bytes<'a>(&self, input: &mut Reader<'a>) -> Result<&'a [u8]> {
        let len = match self.kind {
            StringKind::Token => {
                let len = input.read_len16()?;
                if len > MAX_TOKEN_LEN {
                    return Err(CodecError::TokenTooLong(len));
                }
                len
            }
            _ => input.read_len32()?,
        };
        input.read(len)
    }
}

impl Codec for StringCodec {
    fn type_name(&self) -> String {
        match self.kind {
            StringKind::Raw => "DATA",
            StringKind::Ascii => "ASCII",
            StringKind::Text => "TEXT",
            StringKind::Token => "TOKEN",
        }
        .to_string()
    }

    fn encode_type(&self, out: &mut Vec<u8>) {
        out.push(self.kind.type_byte());
    }

    fn encode(&self, out: &mut Vec<u8>, value: &Value, _ctx: &dyn Context) -> Result<()> {
        let bytes = value.expect_bytes("string")?;
        self.encode_bytes(out, bytes)
    }

    fn decode(&self, input: &mut Reader<'_>, _state: &DecodeState<'_>) -> Result<Value> {
        Ok(Value::String(self.decode_bytes(input)?.to_vec()))
    }
}

pub(crate) fn factories() -> Vec<CodecFactory> {
    [
        StringKind::Raw,
        StringKind::Ascii,
        StringKind::Text,
        StringKind::Token,
    ]
    .into_iter()
    .map(|kind| {
        CodecFactory::new(kind.type_byte(), move |_, _| {
            Ok(Arc::new(StringCodec::new(kind)) as CodecRef)
        })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::NullContext;
    use crate::registry::TypeRegistry;

    fn round_trip(codec: &StringCodec, bytes: &[u8]) -> Value {
        let mut out = Vec::new();
        codec
            .encode(&mut out, &Value::String(bytes.to_vec()), &NullContext)
            .unwrap();
        let registry = TypeRegistry::with_builtins();
        let state = DecodeState {
            registry: &registry,
            context: &NullContext,
        };
        let mut reader = Reader::new(&out);
        let decoded = codec.decode(&mut reader, &state).unwrap();
        assert!(reader.is_empty());
        decoded
    }

    #[test]
    fn test_raw_round_trips_any_bytes() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(
            round_trip(&StringCodec::RAW, &bytes),
            Value::String(bytes.clone())
        );
        assert_eq!(round_trip(&StringCodec::RAW, b""), Value::String(vec![]));
    }

    #[test]
    fn test_ascii_rejects_high_bytes_at_encode() {
        let mut out = Vec::new();
        let err = StringCodec::ASCII
            .encode(
                &mut out,
                &Value::String(vec![b'h', b'i', 0x80]),
                &NullContext,
            )
            .unwrap_err();
        assert_eq!(err, CodecError::NonAsciiByte(0x80));
    }

    #[test]
    fn test_token_boundary_lengths() {
        let ok = vec![b'x'; MAX_TOKEN_LEN];
        assert_eq!(
            round_trip(&StringCodec::TOKEN, &ok),
            Value::String(ok.clone())
        );

        let mut out = Vec::new();
        let too_long = vec![b'x'; MAX_TOKEN_LEN + 1];
        let err = StringCodec::TOKEN
            .encode(&mut out, &Value::String(too_long), &NullContext)
            .unwrap_err();
        assert_eq!(err, CodecError::TokenTooLong(MAX_TOKEN_LEN + 1));
    }

    #[test]
    fn test_length_prefix_longer_than_buffer() {
        // Declared length 10, only 3 bytes present.
        let data = [0x00, 0x00, 0x00, 0x0a, b'a', b'b', b'c'];
        let registry = TypeRegistry::with_builtins();
        let state = DecodeState {
            registry: &registry,
            context: &NullContext,
        };
        let mut reader = Reader::new(&data);
        assert!(matches!(
            StringCodec::RAW.decode(&mut reader, &state),
            Err(CodecError::UnexpectedEndOfData { .. })
        ));
    }

    #[test]
    fn test_string_beyond_length_boundary() {
        // A payload larger than one length-prefix byte can express.
        let big = vec![0xAB; 70_000];
        assert_eq!(
            round_trip(&StringCodec::RAW, &big),
            Value::String(big.clone())
        );
    }
}
