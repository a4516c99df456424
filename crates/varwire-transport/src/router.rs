//! Peer connection management and message routing.
//!
//! A [`MessageRouter`] owns the TCP side of one node: it accepts and
//! dials connections, exchanges node names as the first frame in each
//! direction, and keeps a peer table of outbound writer channels.
//! Inbound traffic surfaces as [`RouterEvent`]s on a channel; [`drive`]
//! pumps those events into an [`RpcHub`].
//!
//! The hub's [`MessageSender`] seam is implemented by [`RouterSender`],
//! a cheap clone of the peer table, so the hub can be constructed
//! before any connection exists.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use varwire_rpc::{MessageSender, RpcError, RpcHub};

use crate::error::{Result, TransportError};
use crate::frame::{read_frame, write_frame, Frame};

/// Offline code: the connection failed or was dropped without a close
/// frame.
pub const CODE_CONNECTION_LOST: i32 = 1;
/// Offline code: the peer closed the connection in an orderly way.
pub const CODE_CLOSED: i32 = 2;
/// Offline code: no connection to the peer exists.
pub const CODE_UNKNOWN_PEER: i32 = 3;

type PeerMap = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<Vec<u8>>>>>;

/// What the transport tells the layer above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterEvent {
    Message { node: String, payload: Vec<u8> },
    Offline { node: String, code: i32 },
}

/// Connection manager for one node.
#[derive(Clone)]
pub struct MessageRouter {
    node_name: String,
    peers: PeerMap,
    events: mpsc::UnboundedSender<RouterEvent>,
}

impl MessageRouter {
    /// Creates the router and the event stream it reports on.
    pub fn new(node_name: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<RouterEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (
            MessageRouter {
                node_name: node_name.into(),
                peers: Arc::new(Mutex::new(HashMap::new())),
                events,
            },
            receiver,
        )
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// The outbound seam to hand to [`RpcHub::new`].
    pub fn sender(&self) -> RouterSender {
        RouterSender {
            peers: Arc::clone(&self.peers),
        }
    }

    /// Accepts connections forever. Each accepted connection runs its
    /// handshake and pumps on its own task.
    pub async fn listen(&self, listener: TcpListener) -> std::io::Result<()> {
        loop {
            let (stream, peer_addr) = listener.accept().await?;
            debug!(node = %self.node_name, %peer_addr, "inbound connection");
            let router = self.clone();
            tokio::spawn(async move {
                if let Err(error) = router.establish(stream).await {
                    warn!(%error, "connection setup failed");
                }
            });
        }
    }

    /// Dials a peer and completes the name handshake before returning
    /// the peer's node name.
    pub async fn connect(&self, addr: &str) -> Result<String> {
        let stream = TcpStream::connect(addr).await?;
        self.establish(stream).await
    }

    /// Drops the connection to `node`, if any. The peer sees an
    /// orderly close.
    pub fn disconnect(&self, node: &str) {
        self.lock_peers().remove(node);
    }

    async fn establish(&self, mut stream: TcpStream) -> Result<String> {
        write_frame(&mut stream, &Frame::NodeName(self.node_name.clone())).await?;
        let peer = match read_frame(&mut stream).await? {
            Frame::NodeName(name) => name,
            other => {
                return Err(TransportError::Protocol(format!(
                    "expected node name frame, got {:?}",
                    other
                )))
            }
        };
        debug!(node = %self.node_name, peer = %peer, "peer connected");

        let (tx, rx) = mpsc::unbounded_channel();
        self.lock_peers().insert(peer.clone(), tx);
        let (reader, writer) = stream.into_split();
        tokio::spawn(write_loop(writer, rx));
        let router = self.clone();
        let read_peer = peer.clone();
        tokio::spawn(async move { router.read_loop(reader, read_peer).await });
        Ok(peer)
    }

    async fn read_loop(self, mut reader: OwnedReadHalf, peer: String) {
        let code = loop {
            match read_frame(&mut reader).await {
                Ok(Frame::Message(payload)) => {
                    let _ = self.events.send(RouterEvent::Message {
                        node: peer.clone(),
                        payload,
                    });
                }
                Ok(Frame::Close) => break CODE_CLOSED,
                Ok(Frame::NodeName(_)) => {
                    warn!(peer = %peer, "unexpected rename frame");
                    break CODE_CONNECTION_LOST;
                }
                Err(error) => {
                    debug!(peer = %peer, %error, "connection lost");
                    break CODE_CONNECTION_LOST;
                }
            }
        };
        self.lock_peers().remove(&peer);
        let _ = self.events.send(RouterEvent::Offline { node: peer, code });
    }

    fn lock_peers(&self) -> std::sync::MutexGuard<'_, HashMap<String, mpsc::UnboundedSender<Vec<u8>>>> {
        self.peers
            .lock()
            .expect("peer table lock should never be poisoned")
    }
}

async fn write_loop(mut writer: OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(payload) = rx.recv().await {
        if let Err(error) = write_frame(&mut writer, &Frame::Message(payload)).await {
            warn!(%error, "dropping outbound message");
            return;
        }
    }
    // The peer entry was removed; tell the other side we are done.
    let _ = write_frame(&mut writer, &Frame::Close).await;
}

/// Implements the hub's outbound seam on top of the peer table.
#[derive(Clone)]
pub struct RouterSender {
    peers: PeerMap,
}

impl MessageSender for RouterSender {
    fn send(&mut self, node: &str, payload: Vec<u8>) -> varwire_rpc::Result<()> {
        let peers = self
            .peers
            .lock()
            .expect("peer table lock should never be poisoned");
        match peers.get(node) {
            Some(tx) => tx.send(payload).map_err(|_| RpcError::Unreachable {
                node: node.to_string(),
                code: CODE_CONNECTION_LOST,
            }),
            None => Err(RpcError::Unreachable {
                node: node.to_string(),
                code: CODE_UNKNOWN_PEER,
            }),
        }
    }
}

/// Pumps router events into a hub until the router goes away.
pub async fn drive(hub: Arc<Mutex<RpcHub>>, mut events: mpsc::UnboundedReceiver<RouterEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            RouterEvent::Message { node, payload } => {
                let result = hub
                    .lock()
                    .expect("hub lock should never be poisoned")
                    .handle(&node, &payload);
                if let Err(error) = result {
                    warn!(node = %node, %error, "dropping undecodable message");
                }
            }
            RouterEvent::Offline { node, code } => {
                hub.lock()
                    .expect("hub lock should never be poisoned")
                    .offline(&node, code);
            }
        }
    }
}
