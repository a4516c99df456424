//! Varwire self-describing binary serialization
//!
//! This crate implements the tagged value model and the family of
//! type-specific codecs that encode it to (and decode it from) a compact
//! byte stream carrying its own type description.
//!
//! # Overview
//!
//! - [`Value`]: the recursive tagged union every component exchanges.
//! - [`Codec`] / [`CodecFactory`]: one encoder/decoder per wire shape,
//!   each owning a single leading type byte.
//! - [`TypeRegistry`]: byte-to-factory lookup used to parse the
//!   self-nesting type headers.
//! - [`Context`]: per-operation extension point that resolves numeric
//!   type ids to codecs, enabling the compact message wire form for
//!   [`Record`] values.
//!
//! # Wire format
//!
//! Everything is big-endian. A serialized value is a type header (one
//! byte, plus nested parameter headers for compound types) followed by
//! the value bytes. See the codec modules for the per-type layouts.
//!
//! # Example
//!
//! ```
//! use varwire_codec::{encode_to_vec, decode_from_slice, NullContext, TypeRegistry, Value};
//!
//! let value = Value::mapping([
//!     ("m", Value::from("sum")),
//!     ("a", Value::Sequence(vec![Value::Int32(1), Value::Int32(3)])),
//! ]);
//! let bytes = encode_to_vec(&value, &NullContext).unwrap();
//!
//! let registry = TypeRegistry::with_builtins();
//! let decoded = decode_from_slice(&bytes, &registry, &NullContext).unwrap();
//! assert_eq!(decoded, value);
//! ```

pub mod any;
pub mod codec;
pub mod compound;
pub mod error;
pub mod primitive;
pub mod reader;
pub mod record;
pub mod registry;
pub mod strings;
pub mod value;

pub use any::{codec_for, decode_from_slice, decode_value, encode_to_vec, encode_value, AnyCodec, TypeCodec};
pub use codec::{Codec, CodecRef, Context, DecodeState, NullContext, SchemaRegistry};
pub use compound::{ArrayCodec, MapCodec, StructCodec, TupleCodec};
pub use error::{CodecError, Result};
pub use primitive::{BoolCodec, DoubleCodec, IntCodec, NullCodec, TimeCodec};
pub use reader::Reader;
pub use record::{encode_record, MessageCodec, RecordCodec};
pub use registry::{CodecFactory, TypeRegistry};
pub use strings::{StringCodec, StringKind, MAX_TOKEN_LEN};
pub use value::{Record, Value};
