//! Kitty graphics protocol support for icat
//! 
//! Serializes graphics commands, transmits image payloads in protocol-sized
//! chunks and produces the Unicode placeholder text that makes a terminal
//! draw a previously transmitted image.

pub mod cells;
pub mod id;
pub mod protocol;
pub mod transmit;

pub use cells::{cell_marker, marker_lines, MAX_CELLS, PLACEHOLDER};
pub use id::ImageId;
pub use protocol::{
    in_tmux, serialize_command, virtual_placement, ControlData, ControlValue, Passthrough,
};
pub use transmit::{replay, AbortFlag, ChunkedTransmitter, WireChunks, CHUNK_SIZE};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphicsError {
    #[error("Terminal write failed: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("Transmission aborted after {sent} of {total} chunks")]
    Aborted { sent: usize, total: usize },
    
    #[error("Placement of {columns}x{rows} cells exceeds the {max} cell limit")]
    TooLarge { columns: u16, rows: u16, max: u16 },
}
