use thiserror::Error;

/// Errors raised by encode and decode operations.
///
/// The four decode-side kinds (`UnexpectedEndOfData`, `InvalidTypeParameters`,
/// `UnknownTypeByte`, `ValueTypeMismatch`) are always distinguishable so
/// callers can react to truncation differently from corruption. The
/// remaining variants are encode-time rejections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The input ended before a declared length or fixed-width field
    /// was fully available.
    #[error("unexpected end of data: needed {needed} byte(s), {remaining} available")]
    UnexpectedEndOfData { needed: usize, remaining: usize },

    /// A codec was constructed (or a type header parsed) with parameters
    /// the wire format does not support.
    #[error("invalid type parameters: {0}")]
    InvalidTypeParameters(String),

    /// A type header byte with no registered factory.
    #[error("unknown type byte: 0x{0:02x}")]
    UnknownTypeByte(u8),

    /// The value handed to a codec is not of the codec's type, or a
    /// decoded value cannot be represented without loss.
    #[error("value type mismatch: expected {expected}, got {found}")]
    ValueTypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// Token strings carry a 2-byte length prefix and may not exceed
    /// 32767 bytes.
    #[error("token too long: {0} bytes (max 32767)")]
    TokenTooLong(usize),

    /// The ascii string codec rejects any byte outside 0x00..=0x7f.
    #[error("non-ascii byte 0x{0:02x} in ascii string")]
    NonAsciiByte(u8),

    /// A complete value was decoded but input bytes remain.
    #[error("trailing data: {0} byte(s) left undecoded")]
    TrailingData(usize),
}

pub type Result<T> = std::result::Result<T, CodecError>;
