//! The cross-process exception taxonomy and its registry.
//!
//! Remote failures travel as data (`["TypeName", field1, ...]` encoded as
//! a value sequence) and are only re-raised as [`RemoteError`]s on the
//! proxy side. The [`ExceptionRegistry`] maps wire type names to
//! reconstructors so callers see the correct error type without
//! per-exception special cases; unregistered names fall back to a
//! generic error carrying the raw encoded array.

use std::collections::HashMap;

use thiserror::Error;
use varwire_codec::Value;

/// A failure that crossed (or is about to cross) a process boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("no method: {method}")]
    NoSuchMethod { method: String },

    #[error("method \"{method}\" called with {provided} arg(s), {required} required")]
    NotEnoughArgs {
        method: String,
        provided: i32,
        required: i32,
    },

    #[error("type error: {message}")]
    TypeError { message: String },

    #[error("node offline (code {code})")]
    NodeOffline { code: i32 },

    /// Catch-all for failures with no registered type of their own.
    #[error("{message}")]
    Exception { message: String },

    /// A wire exception whose type name the local registry does not
    /// know. The raw encoded fields are preserved.
    #[error("unregistered remote exception {name}: {fields:?}")]
    Unregistered { name: String, fields: Vec<Value> },
}

impl RemoteError {
    /// The wire type name this error encodes under.
    pub fn type_name(&self) -> &str {
        match self {
            RemoteError::NoSuchMethod { .. } => "NoSuchMethod",
            RemoteError::NotEnoughArgs { .. } => "NotEnoughArgs",
            RemoteError::TypeError { .. } => "TypeError",
            RemoteError::NodeOffline { .. } => "NodeOffline",
            RemoteError::Exception { .. } => "Exception",
            RemoteError::Unregistered { name, .. } => name,
        }
    }

    /// Encodes as `[type_name, field1, field2, ...]`.
    pub fn encode(&self) -> Value {
        let mut items = vec![Value::from(self.type_name())];
        match self {
            RemoteError::NoSuchMethod { method } => {
                items.push(Value::from(method.as_str()));
            }
            RemoteError::NotEnoughArgs {
                method,
                provided,
                required,
            } => {
                items.push(Value::from(method.as_str()));
                items.push(Value::Int32(*provided));
                items.push(Value::Int32(*required));
            }
            RemoteError::TypeError { message } | RemoteError::Exception { message } => {
                items.push(Value::from(message.as_str()));
            }
            RemoteError::NodeOffline { code } => {
                items.push(Value::Int32(*code));
            }
            RemoteError::Unregistered { fields, .. } => {
                items.extend(fields.iter().cloned());
            }
        }
        Value::Sequence(items)
    }
}

type DecodeFn = Box<dyn Fn(&[Value]) -> Option<RemoteError> + Send + Sync>;

/// Append-only table of exception reconstructors, built explicitly at
/// startup and owned by the components that need it.
///
/// # Example
///
/// ```
/// use varwire_codec::Value;
/// use varwire_rpc::{ExceptionRegistry, RemoteError};
///
/// let registry = ExceptionRegistry::with_builtins();
/// let wire = Value::Sequence(vec![Value::from("NoSuchMethod"), Value::from("foo")]);
/// assert_eq!(
///     registry.decode(&wire),
///     RemoteError::NoSuchMethod { method: "foo".to_string() }
/// );
/// ```
pub struct ExceptionRegistry {
    decoders: HashMap<String, DecodeFn>,
}

fn str_field(fields: &[Value], index: usize) -> Option<String> {
    fields.get(index)?.as_str_lossy()
}

fn int_field(fields: &[Value], index: usize) -> Option<i32> {
    match fields.get(index)? {
        Value::Byte(v) => Some(*v as i32),
        Value::Int32(v) => Some(*v),
        Value::Int64(v) => i32::try_from(*v).ok(),
        _ => None,
    }
}

impl ExceptionRegistry {
    /// An empty registry. Most callers want
    /// [`ExceptionRegistry::with_builtins`].
    pub fn new() -> Self {
        ExceptionRegistry {
            decoders: HashMap::new(),
        }
    }

    /// A registry knowing the built-in taxonomy.
    pub fn with_builtins() -> Self {
        let mut registry = ExceptionRegistry::new();
        registry.register("NoSuchMethod", |fields| {
            Some(RemoteError::NoSuchMethod {
                method: str_field(fields, 0)?,
            })
        });
        registry.register("NotEnoughArgs", |fields| {
            Some(RemoteError::NotEnoughArgs {
                method: str_field(fields, 0)?,
                provided: int_field(fields, 1)?,
                required: int_field(fields, 2)?,
            })
        });
        registry.register("TypeError", |fields| {
            Some(RemoteError::TypeError {
                message: str_field(fields, 0)?,
            })
        });
        registry.register("NodeOffline", |fields| {
            Some(RemoteError::NodeOffline {
                code: int_field(fields, 0)?,
            })
        });
        registry.register("Exception", |fields| {
            Some(RemoteError::Exception {
                message: str_field(fields, 0)?,
            })
        });
        registry
    }

    /// Registers a reconstructor for a wire type name. The table is
    /// append-only: an existing entry is never replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        decoder: impl Fn(&[Value]) -> Option<RemoteError> + Send + Sync + 'static,
    ) {
        self.decoders
            .entry(name.into())
            .or_insert_with(|| Box::new(decoder));
    }

    /// Reconstructs an error from its wire encoding. Anything malformed
    /// or unknown comes back as a fallback error preserving the input.
    pub fn decode(&self, encoded: &Value) -> RemoteError {
        let items = match encoded.as_sequence() {
            Some(items) if !items.is_empty() => items,
            _ => {
                return RemoteError::Exception {
                    message: format!("malformed exception encoding: {:?}", encoded),
                }
            }
        };
        let name = match items[0].as_str_lossy() {
            Some(name) => name,
            None => {
                return RemoteError::Exception {
                    message: format!("malformed exception encoding: {:?}", encoded),
                }
            }
        };
        let fields = &items[1..];
        match self.decoders.get(&name) {
            Some(decoder) => decoder(fields).unwrap_or_else(|| RemoteError::Unregistered {
                name: name.clone(),
                fields: fields.to_vec(),
            }),
            None => RemoteError::Unregistered {
                name,
                fields: fields.to_vec(),
            },
        }
    }
}

impl Default for ExceptionRegistry {
    fn default() -> Self {
        ExceptionRegistry::with_builtins()
    }
}
