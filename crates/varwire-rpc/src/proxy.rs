//! Client-side proxies.
//!
//! A [`Proxy`] stands in for one remote servant, identified by the pair
//! (node name, servant address). It builds nothing of the wire format
//! itself; it hands method and arguments to a [`VarCaller`] (in
//! practice the hub) and returns the future the caller produced.

use std::sync::{Arc, Mutex};

use varwire_codec::Value;

use crate::extract::FromValue;
use crate::future::CallFuture;

/// Something that can issue remote calls. Implemented by the hub;
/// abstracted so proxies can be exercised against fakes.
pub trait VarCaller {
    fn call_remote(
        &mut self,
        node: &str,
        addr: &[u8],
        method: &str,
        args: Vec<Value>,
    ) -> CallFuture<Value>;
}

/// A handle to one servant on one node.
#[derive(Clone)]
pub struct Proxy {
    caller: Arc<Mutex<dyn VarCaller + Send>>,
    node: String,
    addr: Vec<u8>,
}

impl Proxy {
    pub fn new(
        caller: Arc<Mutex<dyn VarCaller + Send>>,
        node: impl Into<String>,
        addr: impl Into<Vec<u8>>,
    ) -> Self {
        Proxy {
            caller,
            node: node.into(),
            addr: addr.into(),
        }
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn addr(&self) -> &[u8] {
        &self.addr
    }

    /// Issues a call and returns the raw-value future.
    pub fn call(&self, method: &str, args: Vec<Value>) -> CallFuture<Value> {
        let mut caller = self
            .caller
            .lock()
            .expect("caller lock should never be poisoned");
        caller.call_remote(&self.node, &self.addr, method, args)
    }

    /// Issues a call and extracts the result as `T`. A result of the
    /// wrong shape resolves the future with a `TypeError`.
    pub fn call_typed<T>(&self, method: &str, args: Vec<Value>) -> CallFuture<T>
    where
        T: FromValue + Clone + Send + 'static,
    {
        let typed = CallFuture::new();
        let sink = typed.clone();
        let raw = self.call(method, args);
        raw.then(move |result| {
            let _ = sink.resolve(result.and_then(T::from_value));
        })
        .expect("fresh future accepts exactly one callback");
        typed
    }
}
