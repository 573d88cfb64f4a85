// src/backend/sway/ipc.rs
//! i3-ipc framing: `"i3-ipc"`, payload length (u32), message type (u32),
//! payload. Integers use the host byte order.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use log::debug;

use crate::error::{LayoutError, Result};

pub const MAGIC: &[u8; 6] = b"i3-ipc";
pub const HEADER_LEN: usize = MAGIC.len() + 8;
pub const GET_OUTPUTS: u32 = 3;

// GET_OUTPUTS 的回复不会接近这个大小
const MAX_PAYLOAD: u32 = 16 * 1024 * 1024;

pub fn encode_message(kind: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&(payload.len() as u32).to_ne_bytes());
    buf.extend_from_slice(&kind.to_ne_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Read one reply frame and check that it answers `expected`.
pub fn read_reply<R: Read>(reader: &mut R, expected: u32) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_LEN];
    reader
        .read_exact(&mut header)
        .map_err(|e| LayoutError::platform_query(format!("Failed to read IPC header: {}", e)))?;
    if &header[..MAGIC.len()] != MAGIC {
        return Err(LayoutError::platform_query("IPC reply has a bad magic string"));
    }

    let mut len = [0u8; 4];
    len.copy_from_slice(&header[6..10]);
    let len = u32::from_ne_bytes(len);
    let mut kind = [0u8; 4];
    kind.copy_from_slice(&header[10..14]);
    let kind = u32::from_ne_bytes(kind);

    if kind != expected {
        return Err(LayoutError::platform_query(format!(
            "IPC reply type {} does not answer request type {}",
            kind, expected
        )));
    }
    if len > MAX_PAYLOAD {
        return Err(LayoutError::platform_query(format!(
            "IPC reply of {} bytes is too large",
            len
        )));
    }

    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .map_err(|e| LayoutError::platform_query(format!("Failed to read IPC payload: {}", e)))?;
    Ok(payload)
}

/// Send a single request over a fresh socket connection and return the reply
/// payload. The socket is closed before returning.
pub fn request(socket: &Path, kind: u32, timeout: Duration) -> Result<Vec<u8>> {
    let mut stream = UnixStream::connect(socket).map_err(|e| {
        LayoutError::platform_query(format!("Cannot connect to {}: {}", socket.display(), e))
    })?;
    stream
        .set_read_timeout(Some(timeout))
        .and_then(|_| stream.set_write_timeout(Some(timeout)))
        .map_err(|e| LayoutError::platform_query(format!("Cannot set IPC timeout: {}", e)))?;

    debug!("IPC request type {} on {}", kind, socket.display());
    stream
        .write_all(&encode_message(kind, &[]))
        .map_err(|e| LayoutError::platform_query(format!("Failed to send IPC request: {}", e)))?;
    read_reply(&mut stream, kind)
}
