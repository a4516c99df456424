//! The servant-side dispatch seam.
//!
//! A servant is anything implementing [`VarCallable`]: it receives a
//! method name and decoded argument values, and returns either a result
//! value or a [`RemoteError`] that the hub ships back to the caller.
//! The helpers here turn arity and argument-shape checks into the
//! standard taxonomy errors.

use varwire_codec::Value;

use crate::exceptions::RemoteError;
use crate::extract::FromValue;
use crate::future::CallResult;

/// A dynamically-callable object exposed over the wire.
///
/// # Example
///
/// ```
/// use varwire_codec::Value;
/// use varwire_rpc::{arg, require_args, CallResult, RemoteError, VarCallable};
///
/// struct Adder;
///
/// impl VarCallable for Adder {
///     fn call(&mut self, method: &str, args: &[Value]) -> CallResult<Value> {
///         match method {
///             "add" => {
///                 require_args(method, args, 2)?;
///                 let a: i64 = arg(args, 0)?;
///                 let b: i64 = arg(args, 1)?;
///                 Ok(Value::Int64(a + b))
///             }
///             _ => Err(RemoteError::NoSuchMethod { method: method.to_string() }),
///         }
///     }
/// }
///
/// let mut adder = Adder;
/// assert_eq!(
///     adder.call("add", &[Value::Int32(2), Value::Int32(3)]),
///     Ok(Value::Int64(5))
/// );
/// ```
pub trait VarCallable: Send {
    fn call(&mut self, method: &str, args: &[Value]) -> CallResult<Value>;
}

/// Fails with `NotEnoughArgs` unless at least `required` arguments were
/// provided.
pub fn require_args(method: &str, args: &[Value], required: usize) -> Result<(), RemoteError> {
    if args.len() < required {
        Err(RemoteError::NotEnoughArgs {
            method: method.to_string(),
            provided: args.len() as i32,
            required: required as i32,
        })
    } else {
        Ok(())
    }
}

/// Extracts argument `index` as `T`. A missing argument (past the
/// length check) or a shape mismatch is a `TypeError`.
pub fn arg<T: FromValue>(args: &[Value], index: usize) -> Result<T, RemoteError> {
    match args.get(index) {
        Some(value) => T::from_value(value.clone()),
        None => Err(RemoteError::TypeError {
            message: format!("missing argument {}", index),
        }),
    }
}
