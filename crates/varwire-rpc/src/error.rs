//! Local error type for the RPC layer.
//!
//! [`RpcError`] covers failures in the machinery itself: undecodable
//! payloads, unreachable peers. Failures of the remote computation
//! travel as [`crate::RemoteError`] inside call results instead.

use thiserror::Error;
use varwire_codec::CodecError;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("malformed message from {node}: {reason}")]
    MalformedMessage { node: String, reason: String },

    #[error("node {node} unreachable (code {code})")]
    Unreachable { node: String, code: i32 },
}

pub type Result<T> = std::result::Result<T, RpcError>;
