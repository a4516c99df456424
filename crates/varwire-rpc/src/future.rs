//! Single-assignment call futures.
//!
//! A [`CallFuture`] is the client-side handle for an in-flight remote
//! call. It is resolved exactly once, with either the call's return
//! value or a [`RemoteError`], and it notifies at most one callback.
//! Callbacks fire synchronously: on the resolving thread if the result
//! arrives after [`CallFuture::then`], or immediately on the attaching
//! thread if the result is already in.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::exceptions::RemoteError;

/// What a remote call ultimately produced.
pub type CallResult<T> = std::result::Result<T, RemoteError>;

/// Misuse of a [`CallFuture`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FutureError {
    #[error("a callback is already attached")]
    CallbackAlreadySet,

    #[error("the future is already resolved")]
    AlreadyResolved,

    #[error("the future is not resolved yet")]
    NotYetResolved,
}

type Callback<T> = Box<dyn FnOnce(CallResult<T>) + Send>;

struct Inner<T> {
    result: Option<CallResult<T>>,
    callback: Option<Callback<T>>,
    callback_set: bool,
}

/// A write-once future for one remote call.
///
/// Cloning yields another handle to the same underlying slot, so the
/// issuing side can keep one clone in its pending table while handing
/// the other to the caller.
///
/// # Example
///
/// ```
/// use varwire_rpc::{CallFuture, FutureError};
///
/// let future: CallFuture<i32> = CallFuture::new();
/// assert_eq!(future.get(), Err(FutureError::NotYetResolved));
///
/// future.resolve_ok(9).unwrap();
/// assert_eq!(future.get(), Ok(Ok(9)));
/// assert_eq!(future.resolve_ok(10), Err(FutureError::AlreadyResolved));
/// ```
pub struct CallFuture<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for CallFuture<T> {
    fn clone(&self) -> Self {
        CallFuture {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> CallFuture<T> {
    pub fn new() -> Self {
        CallFuture {
            inner: Arc::new(Mutex::new(Inner {
                result: None,
                callback: None,
                callback_set: false,
            })),
        }
    }

    /// Stores the result and fires the callback, if one is attached.
    /// The lock is released before the callback runs, so callbacks may
    /// touch the future again (e.g. call [`CallFuture::get`]).
    pub fn resolve(&self, result: CallResult<T>) -> Result<(), FutureError> {
        let callback = {
            let mut inner = self
                .inner
                .lock()
                .expect("future lock should never be poisoned");
            if inner.result.is_some() {
                return Err(FutureError::AlreadyResolved);
            }
            inner.result = Some(result.clone());
            inner.callback.take()
        };
        if let Some(callback) = callback {
            callback(result);
        }
        Ok(())
    }

    pub fn resolve_ok(&self, value: T) -> Result<(), FutureError> {
        self.resolve(Ok(value))
    }

    pub fn resolve_err(&self, error: RemoteError) -> Result<(), FutureError> {
        self.resolve(Err(error))
    }

    /// Attaches the single callback. If the result is already in, the
    /// callback runs before `then` returns.
    pub fn then(
        &self,
        callback: impl FnOnce(CallResult<T>) + Send + 'static,
    ) -> Result<(), FutureError> {
        let mut inner = self
            .inner
            .lock()
            .expect("future lock should never be poisoned");
        if inner.callback_set {
            return Err(FutureError::CallbackAlreadySet);
        }
        inner.callback_set = true;
        match inner.result.clone() {
            Some(result) => {
                drop(inner);
                callback(result);
            }
            None => {
                inner.callback = Some(Box::new(callback));
            }
        }
        Ok(())
    }

    /// The stored result, or `NotYetResolved`.
    pub fn get(&self) -> Result<CallResult<T>, FutureError> {
        self.inner
            .lock()
            .expect("future lock should never be poisoned")
            .result
            .clone()
            .ok_or(FutureError::NotYetResolved)
    }

    pub fn is_resolved(&self) -> bool {
        self.inner
            .lock()
            .expect("future lock should never be poisoned")
            .result
            .is_some()
    }
}

impl<T: Clone + Send + 'static> Default for CallFuture<T> {
    fn default() -> Self {
        CallFuture::new()
    }
}
