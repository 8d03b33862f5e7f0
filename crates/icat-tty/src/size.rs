//! Terminal geometry queries
//!
//! The terminal reports its size in character cells and, on terminals that
//! support it, in pixels. Both are needed to convert an image's pixel size
//! into a cell extent.

use crate::TtyError;
use nix::pty::Winsize;
use std::io;
use std::os::unix::io::RawFd;
use tracing::debug;

/// Snapshot of the terminal geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminalSize {
    pub rows: u16,
    pub columns: u16,
    pub pixel_width: u16,
    pub pixel_height: u16,
}

impl TerminalSize {
    pub fn new(rows: u16, columns: u16, pixel_width: u16, pixel_height: u16) -> Self {
        Self {
            rows,
            columns,
            pixel_width,
            pixel_height,
        }
    }

    /// Whether the terminal reported enough to compute a cell's pixel size.
    /// Many terminals leave the pixel fields at zero.
    pub fn has_pixel_geometry(&self) -> bool {
        self.rows > 0 && self.columns > 0 && self.pixel_width > 0 && self.pixel_height > 0
    }

    /// Size of a single cell in pixels as (width, height)
    pub fn cell_pixels(&self) -> Option<(f64, f64)> {
        if !self.has_pixel_geometry() {
            return None;
        }
        Some((
            f64::from(self.pixel_width) / f64::from(self.columns),
            f64::from(self.pixel_height) / f64::from(self.rows),
        ))
    }
}

impl From<Winsize> for TerminalSize {
    fn from(ws: Winsize) -> Self {
        Self {
            rows: ws.ws_row,
            columns: ws.ws_col,
            pixel_width: ws.ws_xpixel,
            pixel_height: ws.ws_ypixel,
        }
    }
}

/// Query the window size of the terminal behind `fd`
pub fn probe_fd(fd: RawFd) -> Result<TerminalSize, TtyError> {
    let mut winsize = Winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };

    unsafe {
        let ret = libc::ioctl(fd, libc::TIOCGWINSZ, &mut winsize as *mut Winsize);
        if ret < 0 {
            return Err(TtyError::SizeQuery(io::Error::last_os_error()));
        }
    }

    let size = TerminalSize::from(winsize);
    debug!(
        "Terminal size on fd {}: {}x{} cells, {}x{} px",
        fd, size.columns, size.rows, size.pixel_width, size.pixel_height
    );
    Ok(size)
}

/// Source of terminal geometry snapshots
pub trait TerminalProbe: Send + Sync {
    fn size(&self) -> Result<TerminalSize, TtyError>;
}

/// Probe that issues `TIOCGWINSZ` on a fixed file descriptor
#[derive(Debug, Clone, Copy)]
pub struct FdProbe {
    fd: RawFd,
}

impl FdProbe {
    pub fn new(fd: RawFd) -> Self {
        Self { fd }
    }

    /// Probe standard output
    pub fn stdout() -> Self {
        Self::new(libc::STDOUT_FILENO)
    }
}

impl Default for FdProbe {
    fn default() -> Self {
        Self::stdout()
    }
}

impl TerminalProbe for FdProbe {
    fn size(&self) -> Result<TerminalSize, TtyError> {
        probe_fd(self.fd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_from_winsize() {
        let ws = Winsize {
            ws_row: 50,
            ws_col: 100,
            ws_xpixel: 1000,
            ws_ypixel: 500,
        };
        let size = TerminalSize::from(ws);
        assert_eq!(size, TerminalSize::new(50, 100, 1000, 500));
        assert_eq!(size.cell_pixels(), Some((10.0, 10.0)));
    }

    #[test]
    fn test_missing_pixel_geometry() {
        let size = TerminalSize::new(24, 80, 0, 0);
        assert!(!size.has_pixel_geometry());
        assert_eq!(size.cell_pixels(), None);

        let size = TerminalSize::new(24, 80, 800, 0);
        assert!(!size.has_pixel_geometry());
    }
}
