//! The RPC hub: servant table, call correlation, reply routing.
//!
//! The hub sits between the value codecs and a message transport. On
//! the way out it assigns each call a fresh reply address, parks the
//! caller's future in a pending table keyed by `(node, reply address)`,
//! and encodes the call payload. On the way in it tells replies apart
//! from incoming calls by that same table: a payload addressed to a
//! pending reply address resolves its future; anything else is
//! dispatched to the servant at the target address.
//!
//! Wire shape of a payload: two self-described values back to back,
//! first the target address string, then the body mapping. A call body
//! carries `"m"` (method), `"a"` (arguments) and, unless the call is
//! one-way, `"O"` (reply address). A reply body carries either `"r"`
//! (result) or `"e"` (encoded exception).

use std::collections::HashMap;

use rand::Rng;
use tracing::{debug, warn};
use varwire_codec::{
    decode_value, encode_value, DecodeState, NullContext, Reader, TypeRegistry, Value,
};

use crate::callable::VarCallable;
use crate::error::{Result, RpcError};
use crate::exceptions::{ExceptionRegistry, RemoteError};
use crate::future::CallFuture;
use crate::proxy::VarCaller;

const REPLY_ADDR_LEN: usize = 12;
const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Outbound edge of the transport, as the hub sees it.
pub trait MessageSender: Send {
    fn send(&mut self, node: &str, payload: Vec<u8>) -> Result<()>;
}

/// One hub per process: owns the local servants and correlates calls
/// with replies.
///
/// Share a hub between proxies and the transport loop behind
/// `Arc<Mutex<RpcHub>>`; every entry point takes `&mut self`.
pub struct RpcHub {
    node_name: String,
    sender: Box<dyn MessageSender>,
    servants: HashMap<Vec<u8>, Box<dyn VarCallable>>,
    pending: HashMap<(String, String), CallFuture<Value>>,
    registry: TypeRegistry,
    exceptions: ExceptionRegistry,
}

impl RpcHub {
    pub fn new(node_name: impl Into<String>, sender: Box<dyn MessageSender>) -> Self {
        RpcHub {
            node_name: node_name.into(),
            sender,
            servants: HashMap::new(),
            pending: HashMap::new(),
            registry: TypeRegistry::with_builtins(),
            exceptions: ExceptionRegistry::with_builtins(),
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// For registering application exception types beyond the built-in
    /// taxonomy.
    pub fn exceptions_mut(&mut self) -> &mut ExceptionRegistry {
        &mut self.exceptions
    }

    /// Exposes a servant at `addr`. A later registration at the same
    /// address replaces the earlier one.
    pub fn register_servant(&mut self, addr: impl Into<Vec<u8>>, servant: Box<dyn VarCallable>) {
        let addr = addr.into();
        debug!(node = %self.node_name, addr = %String::from_utf8_lossy(&addr), "servant registered");
        self.servants.insert(addr, servant);
    }

    pub fn remove_servant(&mut self, addr: &[u8]) -> Option<Box<dyn VarCallable>> {
        self.servants.remove(addr)
    }

    /// Calls the hub does not yet have an answer for.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Handles one inbound payload from `node`: a reply if it targets a
    /// pending reply address, otherwise a call to a local servant.
    pub fn handle(&mut self, node: &str, payload: &[u8]) -> Result<()> {
        let (addr, body) = self.decode_payload(node, payload)?;
        let addr_str = String::from_utf8_lossy(&addr).into_owned();

        if let Some(future) = self.pending.remove(&(node.to_string(), addr_str.clone())) {
            self.finish_call(node, &addr_str, &future, body);
            return Ok(());
        }

        let mapping = body.as_mapping().ok_or_else(|| RpcError::MalformedMessage {
            node: node.to_string(),
            reason: format!("call body is {}, not a mapping", body.variant_name()),
        })?;
        // A reply-shaped body with no pending entry is stale, e.g. the
        // node was declared offline while the reply was in flight.
        if mapping.contains_key(b"r".as_slice()) || mapping.contains_key(b"e".as_slice()) {
            warn!(node, addr = %addr_str, "reply for unknown call dropped");
            return Ok(());
        }
        let method = mapping
            .get(b"m".as_slice())
            .and_then(Value::as_str_lossy)
            .ok_or_else(|| RpcError::MalformedMessage {
                node: node.to_string(),
                reason: "call body has no method string".to_string(),
            })?;
        let args = match mapping.get(b"a".as_slice()) {
            Some(value) => value
                .as_sequence()
                .map(<[Value]>::to_vec)
                .ok_or_else(|| RpcError::MalformedMessage {
                    node: node.to_string(),
                    reason: format!("call arguments are {}, not a sequence", value.variant_name()),
                })?,
            None => Vec::new(),
        };
        let origin = mapping.get(b"O".as_slice()).and_then(Value::as_str_lossy);

        let outcome = match self.servants.get_mut(addr.as_slice()) {
            Some(servant) => {
                debug!(node, addr = %addr_str, method = %method, "dispatching call");
                servant.call(&method, &args)
            }
            None => Err(RemoteError::Exception {
                message: format!("no servant at address {}", addr_str),
            }),
        };

        match origin {
            Some(origin) => {
                let reply = match outcome {
                    Ok(result) => Value::mapping([("r", result)]),
                    Err(error) => Value::mapping([("e", error.encode())]),
                };
                let payload = encode_payload(origin.as_bytes(), &reply)?;
                self.sender.send(node, payload)
            }
            None => {
                if let Err(error) = outcome {
                    warn!(node, method = %method, %error, "one-way call failed");
                }
                Ok(())
            }
        }
    }

    /// Resolves every pending call to `node` with `NodeOffline`.
    pub fn offline(&mut self, node: &str, code: i32) {
        let keys: Vec<_> = self
            .pending
            .keys()
            .filter(|(n, _)| n == node)
            .cloned()
            .collect();
        debug!(node, code, count = keys.len(), "resolving pending calls as offline");
        for key in keys {
            if let Some(future) = self.pending.remove(&key) {
                let _ = future.resolve_err(RemoteError::NodeOffline { code });
            }
        }
    }

    fn finish_call(&self, node: &str, addr: &str, future: &CallFuture<Value>, body: Value) {
        let result = match body.as_mapping() {
            Some(mapping) => {
                if let Some(result) = mapping.get(b"r".as_slice()) {
                    Ok(result.clone())
                } else if let Some(encoded) = mapping.get(b"e".as_slice()) {
                    Err(self.exceptions.decode(encoded))
                } else {
                    Err(RemoteError::Exception {
                        message: "reply carries neither result nor exception".to_string(),
                    })
                }
            }
            None => Err(RemoteError::Exception {
                message: format!("reply body is {}, not a mapping", body.variant_name()),
            }),
        };
        if future.resolve(result).is_err() {
            warn!(node, addr, "duplicate reply ignored");
        }
    }

    fn decode_payload(&self, node: &str, payload: &[u8]) -> Result<(Vec<u8>, Value)> {
        let state = DecodeState {
            registry: &self.registry,
            context: &NullContext,
        };
        let mut input = Reader::new(payload);
        let addr = decode_value(&mut input, &state)?;
        let addr = addr
            .as_bytes()
            .ok_or_else(|| RpcError::MalformedMessage {
                node: node.to_string(),
                reason: format!("target address is {}, not a string", addr.variant_name()),
            })?
            .to_vec();
        let body = decode_value(&mut input, &state)?;
        if !input.is_empty() {
            return Err(RpcError::MalformedMessage {
                node: node.to_string(),
                reason: format!("{} trailing byte(s) after body", input.remaining()),
            });
        }
        Ok((addr, body))
    }

    fn fresh_reply_addr(&self, node: &str) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let addr: String = (0..REPLY_ADDR_LEN)
                .map(|_| ALPHANUMERIC[rng.gen_range(0..ALPHANUMERIC.len())] as char)
                .collect();
            if !self.pending.contains_key(&(node.to_string(), addr.clone())) {
                return addr;
            }
        }
    }
}

impl VarCaller for RpcHub {
    fn call_remote(
        &mut self,
        node: &str,
        addr: &[u8],
        method: &str,
        args: Vec<Value>,
    ) -> CallFuture<Value> {
        let future = CallFuture::new();
        let reply_addr = self.fresh_reply_addr(node);
        // Parked before sending, so a reply arriving mid-send still
        // finds its future.
        self.pending
            .insert((node.to_string(), reply_addr.clone()), future.clone());

        let call = Value::mapping([
            ("m", Value::from(method)),
            ("a", Value::Sequence(args)),
            ("O", Value::from(reply_addr.as_str())),
        ]);
        let sent = encode_payload(addr, &call)
            .and_then(|payload| self.sender.send(node, payload));
        if let Err(error) = sent {
            self.pending.remove(&(node.to_string(), reply_addr));
            let remote = match error {
                RpcError::Unreachable { code, .. } => RemoteError::NodeOffline { code },
                other => RemoteError::Exception {
                    message: other.to_string(),
                },
            };
            let _ = future.resolve_err(remote);
        }
        future
    }
}

fn encode_payload(addr: &[u8], body: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_value(&mut out, &Value::String(addr.to_vec()), &NullContext)?;
    encode_value(&mut out, body, &NullContext)?;
    Ok(out)
}
