//! Varwire asynchronous remote calls
//!
//! This crate layers a remote-call protocol over the `varwire-codec`
//! value model. Methods are dispatched by name against dynamically
//! registered servants, results come back through single-assignment
//! futures, and remote failures travel as data and re-materialize as
//! typed errors on the calling side.
//!
//! # Overview
//!
//! - [`CallFuture`]: write-once handle for one in-flight call.
//! - [`RemoteError`] / [`ExceptionRegistry`]: the cross-process
//!   exception taxonomy and its wire reconstruction table.
//! - [`VarCallable`]: the servant-side dispatch seam.
//! - [`Proxy`] / [`VarCaller`]: the client-side call seam.
//! - [`RpcHub`]: ties it together: servant table, reply-address
//!   correlation, and encoding/decoding of call payloads, on top of a
//!   pluggable [`MessageSender`].
//!
//! # Example
//!
//! ```
//! use varwire_codec::Value;
//! use varwire_rpc::{arg, require_args, CallResult, RemoteError, VarCallable};
//!
//! struct Calculator;
//!
//! impl VarCallable for Calculator {
//!     fn call(&mut self, method: &str, args: &[Value]) -> CallResult<Value> {
//!         match method {
//!             "sum" => {
//!                 require_args(method, args, 1)?;
//!                 let items: Vec<i64> = arg(args, 0)?;
//!                 Ok(Value::Int64(items.iter().sum()))
//!             }
//!             _ => Err(RemoteError::NoSuchMethod { method: method.to_string() }),
//!         }
//!     }
//! }
//! ```

pub mod callable;
pub mod error;
pub mod exceptions;
pub mod extract;
pub mod future;
pub mod hub;
pub mod proxy;

pub use callable::{arg, require_args, VarCallable};
pub use error::{Result, RpcError};
pub use exceptions::{ExceptionRegistry, RemoteError};
pub use extract::FromValue;
pub use future::{CallFuture, CallResult, FutureError};
pub use hub::{MessageSender, RpcHub};
pub use proxy::{Proxy, VarCaller};
