//! Terminal device handles
//!
//! Graphics commands bypass stdout and go straight to the controlling
//! terminal, so a host that captures or redirects stdout still gets images.

use crate::TtyError;
use nix::fcntl::OFlag;
use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path of the process's controlling terminal
pub const CONTROLLING_TERMINAL: &str = "/dev/tty";

/// Opens a writable handle to the terminal for one transmission
pub trait DeviceOpener: Send + Sync {
    fn open(&self) -> Result<Box<dyn Write + Send>, TtyError>;
}

/// A terminal device addressed by path
#[derive(Debug, Clone)]
pub struct TtyDevice {
    path: PathBuf,
}

impl TtyDevice {
    /// The controlling terminal of this process
    pub fn controlling() -> Self {
        Self::at(CONTROLLING_TERMINAL)
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for TtyDevice {
    fn default() -> Self {
        Self::controlling()
    }
}

impl DeviceOpener for TtyDevice {
    fn open(&self) -> Result<Box<dyn Write + Send>, TtyError> {
        let file = OpenOptions::new()
            .write(true)
            .custom_flags(OFlag::O_NOCTTY.bits())
            .open(&self.path)
            .map_err(|source| TtyError::DeviceOpen {
                path: self.path.clone(),
                source,
            })?;

        debug!("Opened terminal device {}", self.path.display());
        Ok(Box::new(file))
    }
}
