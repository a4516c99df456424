//! Varwire TCP transport
//!
//! Connects RPC hubs over framed TCP. Each connection opens with a
//! node-name handshake in both directions; after that, every frame is
//! either an opaque message payload for the hub or an orderly close.
//!
//! # Overview
//!
//! - [`Frame`] / [`read_frame`] / [`write_frame`]: the length-prefixed
//!   frame layer.
//! - [`MessageRouter`]: accepts and dials connections, keeps the peer
//!   table, reports [`RouterEvent`]s.
//! - [`RouterSender`]: the hub-facing outbound seam.
//! - [`drive`]: pumps router events into an `RpcHub`.

pub mod error;
pub mod frame;
pub mod router;

pub use error::{Result, TransportError};
pub use frame::{read_frame, write_frame, Frame, MAX_FRAME_SIZE};
pub use router::{
    drive, MessageRouter, RouterEvent, RouterSender, CODE_CLOSED, CODE_CONNECTION_LOST,
    CODE_UNKNOWN_PEER,
};
