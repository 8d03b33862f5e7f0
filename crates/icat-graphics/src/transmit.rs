//! Chunked payload transmission
//!
//! The protocol limits a single command to 4096 bytes of base64 payload, so
//! larger images are split. Only the first command of a transfer carries the
//! control keys; every following one repeats just the `m` (more data) flag.

use crate::protocol::{serialize_command, ControlData, Passthrough};
use crate::GraphicsError;
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Maximum base64 characters per command
pub const CHUNK_SIZE: usize = 4096;

/// The exact commands written to the terminal for one image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireChunks {
    chunks: Vec<Bytes>,
}

impl WireChunks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: Bytes) {
        self.chunks.push(chunk);
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.chunks.iter()
    }

    /// Total bytes across all commands
    pub fn byte_len(&self) -> usize {
        self.chunks.iter().map(Bytes::len).sum()
    }

    /// All commands concatenated, as they appear on the device
    pub fn concat(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for chunk in &self.chunks {
            out.extend_from_slice(chunk);
        }
        out
    }
}

impl FromIterator<Bytes> for WireChunks {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        Self {
            chunks: iter.into_iter().collect(),
        }
    }
}

/// Raised by the owner of a transmission to stop it before the next chunk
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Splits payloads into protocol commands and writes them to a device
#[derive(Debug, Clone, Default)]
pub struct ChunkedTransmitter {
    passthrough: Passthrough,
    abort: AbortFlag,
}

impl ChunkedTransmitter {
    pub fn new(passthrough: Passthrough) -> Self {
        Self {
            passthrough,
            abort: AbortFlag::new(),
        }
    }

    /// Stop writing when `abort` is raised
    pub fn with_abort(mut self, abort: AbortFlag) -> Self {
        self.abort = abort;
        self
    }

    /// Build the commands for `data` without writing them
    pub fn encode(&self, control: &ControlData, data: &[u8]) -> WireChunks {
        encode_chunks(control, data, self.passthrough.wraps())
    }

    /// Encode `data`, write every command to `device` with a flush after each,
    /// and return what was written.
    pub fn send<W: Write + ?Sized>(
        &self,
        device: &mut W,
        control: &ControlData,
        data: &[u8],
    ) -> Result<WireChunks, GraphicsError> {
        let wire = self.encode(control, data);
        let total = wire.len();

        for (sent, chunk) in wire.iter().enumerate() {
            if self.abort.is_raised() {
                warn!("Transmission aborted after {} of {} chunks", sent, total);
                if sent > 0 {
                    self.close_transfer(device);
                }
                return Err(GraphicsError::Aborted { sent, total });
            }
            if let Err(e) = device.write_all(chunk).and_then(|()| device.flush()) {
                warn!("Write of chunk {}/{} failed: {}", sent + 1, total, e);
                if sent > 0 {
                    self.close_transfer(device);
                }
                return Err(e.into());
            }
            trace!("Wrote chunk {}/{} ({} bytes)", sent + 1, total, chunk.len());
        }

        debug!(
            "Transmitted {} bytes of image data in {} chunks",
            data.len(),
            total
        );
        Ok(wire)
    }

    /// End a transfer whose last written chunk still announced more data,
    /// so the terminal does not read the next command as its continuation
    fn close_transfer<W: Write + ?Sized>(&self, device: &mut W) {
        let control = ControlData::new().with('m', 0u32);
        let close = serialize_command(&control, b"", self.passthrough.wraps());
        match device.write_all(&close).and_then(|()| device.flush()) {
            Ok(()) => debug!("Closed interrupted transfer"),
            Err(e) => warn!("Could not close interrupted transfer: {}", e),
        }
    }
}

fn encode_chunks(control: &ControlData, data: &[u8], tmux: bool) -> WireChunks {
    let encoded = general_purpose::STANDARD.encode(data);
    let pieces: Vec<&[u8]> = encoded.as_bytes().chunks(CHUNK_SIZE).collect();
    let last = pieces.len().saturating_sub(1);

    pieces
        .iter()
        .enumerate()
        .map(|(i, piece)| {
            let more = u32::from(i != last);
            let chunk_control = if i == 0 {
                control.clone().with('m', more)
            } else {
                ControlData::new().with('m', more)
            };
            Bytes::from(serialize_command(&chunk_control, piece, tmux))
        })
        .collect()
}

/// Write previously transmitted commands again, byte for byte
pub fn replay<W: Write + ?Sized>(device: &mut W, wire: &WireChunks) -> Result<(), GraphicsError> {
    for chunk in wire.iter() {
        device.write_all(chunk)?;
        device.flush()?;
    }
    debug!("Replayed {} chunks ({} bytes)", wire.len(), wire.byte_len());
    Ok(())
}
