//! The type registry: a byte-to-factory table used to parse type headers.
//!
//! Built once at startup with all built-in types and consulted whenever a
//! type header must be read from a stream. The table is an explicit,
//! ordinary value owned by whoever decodes; there is no global mutable
//! state.

use std::collections::HashMap;

use crate::codec::{CodecRef, DecodeState};
use crate::error::{CodecError, Result};
use crate::reader::Reader;
use crate::{any, compound, primitive, record, strings};

type BuildFn = Box<dyn Fn(&mut Reader<'_>, &DecodeState<'_>) -> Result<CodecRef> + Send + Sync>;

/// Owns one leading type byte and knows how to read any additional type
/// parameters from the stream to produce a ready codec.
pub struct CodecFactory {
    type_byte: u8,
    build: BuildFn,
}

impl std::fmt::Debug for CodecFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecFactory")
            .field("type_byte", &self.type_byte)
            .finish_non_exhaustive()
    }
}

impl CodecFactory {
    pub fn new(
        type_byte: u8,
        build: impl Fn(&mut Reader<'_>, &DecodeState<'_>) -> Result<CodecRef> + Send + Sync + 'static,
    ) -> Self {
        CodecFactory {
            type_byte,
            build: Box::new(build),
        }
    }

    /// The single leading byte this factory owns.
    pub fn type_byte(&self) -> u8 {
        self.type_byte
    }

    /// Reads any type parameters and returns the codec. For primitive
    /// types this consumes nothing; for compound types it recursively
    /// parses the parameter headers.
    pub fn decode_type(
        &self,
        input: &mut Reader<'_>,
        state: &DecodeState<'_>,
    ) -> Result<CodecRef> {
        (self.build)(input, state)
    }
}

/// Byte-to-factory lookup for parsing self-describing type headers.
///
/// # Example
///
/// ```
/// use varwire_codec::{NullContext, Reader, TypeRegistry, DecodeState};
///
/// let registry = TypeRegistry::with_builtins();
/// let state = DecodeState { registry: &registry, context: &NullContext };
/// // "Li" is the header of an array of signed 32-bit integers.
/// let mut reader = Reader::new(b"Li");
/// let codec = registry.parse_header(&mut reader, &state).unwrap();
/// assert_eq!(codec.type_name(), "LIST(INT32)");
/// ```
pub struct TypeRegistry {
    factories: HashMap<u8, CodecFactory>,
}

impl TypeRegistry {
    /// An empty registry. Most callers want [`TypeRegistry::with_builtins`].
    pub fn new() -> Self {
        TypeRegistry {
            factories: HashMap::new(),
        }
    }

    /// A registry populated with every built-in type.
    pub fn with_builtins() -> Self {
        let mut registry = TypeRegistry::new();
        for factory in primitive::factories() {
            registry.register(factory);
        }
        for factory in strings::factories() {
            registry.register(factory);
        }
        for factory in compound::factories() {
            registry.register(factory);
        }
        for factory in any::factories() {
            registry.register(factory);
        }
        for factory in record::factories() {
            registry.register(factory);
        }
        registry
    }

    /// Registers a factory on its byte. Last write wins.
    pub fn register(&mut self, factory: CodecFactory) {
        self.factories.insert(factory.type_byte(), factory);
    }

    /// Looks up the factory for a type byte.
    pub fn lookup(&self, type_byte: u8) -> Result<&CodecFactory> {
        self.factories
            .get(&type_byte)
            .ok_or(CodecError::UnknownTypeByte(type_byte))
    }

    /// Reads one type byte and delegates to its factory, which may
    /// recursively parse nested parameter headers.
    pub fn parse_header(
        &self,
        input: &mut Reader<'_>,
        state: &DecodeState<'_>,
    ) -> Result<CodecRef> {
        let type_byte = input.read_u8()?;
        self.lookup(type_byte)?.decode_type(input, state)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        TypeRegistry::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::NullContext;
    use std::sync::Arc;

    #[test]
    fn test_unknown_type_byte() {
        let registry = TypeRegistry::with_builtins();
        assert_eq!(
            registry.lookup(b'z').unwrap_err(),
            CodecError::UnknownTypeByte(b'z')
        );
    }

    #[test]
    fn test_register_last_write_wins() {
        let mut registry = TypeRegistry::with_builtins();
        registry.register(CodecFactory::new(b'-', |_, _| {
            Ok(Arc::new(crate::primitive::BoolCodec) as CodecRef)
        }));
        let state = DecodeState {
            registry: &registry,
            context: &NullContext,
        };
        let mut reader = Reader::new(b"-");
        let codec = registry.parse_header(&mut reader, &state).unwrap();
        assert_eq!(codec.type_name(), "BOOL");
    }

    #[test]
    fn test_parse_header_empty_input() {
        let registry = TypeRegistry::with_builtins();
        let state = DecodeState {
            registry: &registry,
            context: &NullContext,
        };
        let mut reader = Reader::new(b"");
        assert!(matches!(
            registry.parse_header(&mut reader, &state),
            Err(CodecError::UnexpectedEndOfData { .. })
        ));
    }

    #[test]
    fn test_nested_header_parses_recursively() {
        let registry = TypeRegistry::with_builtins();
        let state = DecodeState {
            registry: &registry,
            context: &NullContext,
        };
        // Map from token strings to arrays of doubles.
        let mut reader = Reader::new(b"MkLd");
        let codec = registry.parse_header(&mut reader, &state).unwrap();
        assert_eq!(codec.type_name(), "MAP(TOKEN, LIST(FLOAT))");
        assert!(reader.is_empty());
    }
}
