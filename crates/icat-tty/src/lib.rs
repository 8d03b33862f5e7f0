//! Controlling-terminal access for icat
//! 
//! Queries the terminal geometry (cells and pixels) and opens the terminal
//! device that graphics commands are written to.

pub mod device;
pub mod size;

pub use device::{DeviceOpener, TtyDevice, CONTROLLING_TERMINAL};
pub use size::{probe_fd, FdProbe, TerminalProbe, TerminalSize};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtyError {
    #[error("Failed to query terminal size: {0}")]
    SizeQuery(#[source] std::io::Error),
    
    #[error("Failed to open terminal device {}: {source}", path.display())]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    
    #[error("Terminal I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
