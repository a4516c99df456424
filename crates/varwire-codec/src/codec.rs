//! Codec and context interfaces.
//!
//! A [`Codec`] encodes and decodes exactly one wire type shape. Its type
//! header is self-nesting: compound codecs write their own byte followed
//! by the headers of their parameter codecs, so a header can always be
//! parsed back recursively through the [`TypeRegistry`](crate::TypeRegistry).

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::reader::Reader;
use crate::registry::TypeRegistry;
use crate::value::Value;

/// Shared handle to a codec. Codecs are stateless apart from their fixed
/// type parameters and safe to share freely.
pub type CodecRef = Arc<dyn Codec>;

/// Encoder/decoder for one wire type shape.
pub trait Codec: Send + Sync {
    /// Readable representation of the type, e.g. `LIST(INT32)`.
    fn type_name(&self) -> String;

    /// Writes the self-describing type header: the codec's own byte plus,
    /// for compound codecs, the headers of its parameter codecs.
    fn encode_type(&self, out: &mut Vec<u8>);

    /// Encodes a value of this codec's type (value bytes only, no header).
    fn encode(&self, out: &mut Vec<u8>, value: &Value, ctx: &dyn Context) -> Result<()>;

    /// Decodes a value of this codec's type (value bytes only).
    fn decode(&self, input: &mut Reader<'_>, state: &DecodeState<'_>) -> Result<Value>;
}

/// Everything a decode operation needs besides the input bytes: the type
/// registry for parsing nested headers, and the caller-supplied context
/// for resolving message type ids.
pub struct DecodeState<'a> {
    pub registry: &'a TypeRegistry,
    pub context: &'a dyn Context,
}

/// Per-operation extension point resolving numeric type ids to
/// `(codec, name)` pairs, enabling the compact `@` (message) wire form.
///
/// The default implementation, [`NullContext`], resolves nothing; an RPC
/// layer with a schema catalog supplies a [`SchemaRegistry`] instead.
pub trait Context {
    /// Finds a codec by numeric type id (used when decoding `@`).
    fn codec(&self, type_id: i32) -> Option<(CodecRef, String)>;

    /// Finds a codec by type name (used when encoding a record).
    fn named_codec(&self, type_name: &str) -> Option<(CodecRef, i32)>;
}

/// A context that resolves nothing: records always take the verbose,
/// fully self-describing form and incoming messages stay opaque.
pub struct NullContext;

impl Context for NullContext {
    fn codec(&self, _type_id: i32) -> Option<(CodecRef, String)> {
        None
    }

    fn named_codec(&self, _type_name: &str) -> Option<(CodecRef, i32)> {
        None
    }
}

/// A usable [`Context`] implementation: a catalog of named, numbered
/// types registered by the caller.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use varwire_codec::{Context, IntCodec, SchemaRegistry};
///
/// let mut schema = SchemaRegistry::new();
/// schema.register("point_id", 7, Arc::new(IntCodec::new(4, true).unwrap()));
/// assert!(schema.named_codec("point_id").is_some());
/// assert!(schema.codec(7).is_some());
/// ```
#[derive(Default)]
pub struct SchemaRegistry {
    by_name: HashMap<String, (CodecRef, i32)>,
    by_id: HashMap<i32, (CodecRef, String)>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, type_id: i32, codec: CodecRef) {
        let name = name.into();
        self.by_name.insert(name.clone(), (codec.clone(), type_id));
        self.by_id.insert(type_id, (codec, name));
    }
}

impl Context for SchemaRegistry {
    fn codec(&self, type_id: i32) -> Option<(CodecRef, String)> {
        self.by_id
            .get(&type_id)
            .map(|(c, n)| (c.clone(), n.clone()))
    }

    fn named_codec(&self, type_name: &str) -> Option<(CodecRef, i32)> {
        self.by_name
            .get(type_name)
            .map(|(c, id)| (c.clone(), *id))
    }
}
