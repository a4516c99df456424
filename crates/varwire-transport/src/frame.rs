//! Frame layer of the peer connection protocol.
//!
//! # Wire Protocol
//!
//! Every frame is a control byte, a 4-byte length prefix (big-endian
//! u32), then that many body bytes:
//!
//! ```text
//! [control] [4-byte length] [body]
//! ```
//!
//! Control bytes:
//!
//! - `0`: a message payload for the hub
//! - `1`: the sending peer's node name (the first frame on every
//!   connection, both directions)
//! - `2`: orderly close (empty body)

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, TransportError};

/// Upper bound on a frame body, to prevent allocation of excessively
/// large buffers from a hostile length prefix.
pub const MAX_FRAME_SIZE: usize = 100 * 1024 * 1024; // 100 MB

const CONTROL_MESSAGE: u8 = 0;
const CONTROL_NODE_NAME: u8 = 1;
const CONTROL_CLOSE: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Message(Vec<u8>),
    NodeName(String),
    Close,
}

/// Writes one frame and flushes.
pub async fn write_frame<W>(stream: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let (control, body): (u8, &[u8]) = match frame {
        Frame::Message(payload) => (CONTROL_MESSAGE, payload),
        Frame::NodeName(name) => (CONTROL_NODE_NAME, name.as_bytes()),
        Frame::Close => (CONTROL_CLOSE, &[]),
    };
    if body.len() > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge {
            len: body.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    stream.write_all(&[control]).await?;
    stream.write_all(&(body.len() as u32).to_be_bytes()).await?;
    stream.write_all(body).await?;
    stream.flush().await?;
    Ok(())
}

/// Reads one frame. EOF mid-frame surfaces as an io error.
pub async fn read_frame<R>(stream: &mut R) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut control = [0u8; 1];
    stream.read_exact(&mut control).await?;
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge {
            len,
            max: MAX_FRAME_SIZE,
        });
    }
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await?;

    match control[0] {
        CONTROL_MESSAGE => Ok(Frame::Message(body)),
        CONTROL_NODE_NAME => String::from_utf8(body)
            .map(Frame::NodeName)
            .map_err(|e| TransportError::Protocol(format!("node name is not utf-8: {}", e))),
        CONTROL_CLOSE => Ok(Frame::Close),
        other => Err(TransportError::Protocol(format!(
            "unknown control byte {}",
            other
        ))),
    }
}
