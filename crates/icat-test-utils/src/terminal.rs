use icat_placement::ChatBuffer;
use icat_tty::{DeviceOpener, TerminalProbe, TerminalSize, TtyError};
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Terminal device that records every byte written through any handle it
/// opened
#[derive(Debug, Clone, Default)]
pub struct RecordingDevice {
    bytes: Arc<Mutex<Vec<u8>>>,
    opens: Arc<AtomicUsize>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Number of times a handle was opened
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        if let Ok(mut bytes) = self.bytes.lock() {
            bytes.clear();
        }
    }
}

struct RecordingHandle {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl Write for RecordingHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "recording poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl DeviceOpener for RecordingDevice {
    fn open(&self) -> Result<Box<dyn Write + Send>, TtyError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingHandle {
            bytes: self.bytes.clone(),
        }))
    }
}

/// Terminal device that opens but rejects every write
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingDevice;

struct BrokenHandle;

impl Write for BrokenHandle {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal went away"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl DeviceOpener for FailingDevice {
    fn open(&self) -> Result<Box<dyn Write + Send>, TtyError> {
        Ok(Box::new(BrokenHandle))
    }
}

/// Terminal device whose first handle stalls inside its first write. Every
/// write is recorded together with the index of the handle that made it.
#[derive(Debug, Clone)]
pub struct StallingDevice {
    stall: Duration,
    opens: Arc<AtomicUsize>,
    writes: Arc<Mutex<Vec<(usize, Vec<u8>)>>>,
}

impl StallingDevice {
    pub fn new(stall: Duration) -> Self {
        Self {
            stall,
            opens: Arc::default(),
            writes: Arc::default(),
        }
    }

    /// `(handle index, bytes)` for every write, in the order they happened
    pub fn writes(&self) -> Vec<(usize, Vec<u8>)> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

struct StallingHandle {
    index: usize,
    stall: Option<Duration>,
    writes: Arc<Mutex<Vec<(usize, Vec<u8>)>>>,
}

impl Write for StallingHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(stall) = self.stall.take() {
            std::thread::sleep(stall);
        }
        self.writes
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "recording poisoned"))?
            .push((self.index, buf.to_vec()));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl DeviceOpener for StallingDevice {
    fn open(&self) -> Result<Box<dyn Write + Send>, TtyError> {
        let index = self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StallingHandle {
            index,
            stall: (index == 0).then_some(self.stall),
            writes: self.writes.clone(),
        }))
    }
}

/// Probe reporting a fixed geometry
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub TerminalSize);

impl FixedProbe {
    /// 100x50 cells of 10x10 pixels
    pub fn kitty() -> Self {
        Self(TerminalSize::new(50, 100, 1000, 500))
    }

    /// A terminal that reports cells but no pixels
    pub fn without_pixels() -> Self {
        Self(TerminalSize::new(24, 80, 0, 0))
    }
}

impl TerminalProbe for FixedProbe {
    fn size(&self) -> Result<TerminalSize, TtyError> {
        Ok(self.0)
    }
}

/// Chat buffer that keeps printed lines, errors and refresh requests.
/// Clones share the same transcript.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Rc<RefCell<Vec<String>>>,
    errors: Rc<RefCell<Vec<String>>>,
    refreshes: Rc<RefCell<usize>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }

    pub fn refreshes(&self) -> usize {
        *self.refreshes.borrow()
    }
}

impl ChatBuffer for Transcript {
    fn print_line(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }

    fn print_error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }

    fn refresh(&self) {
        *self.refreshes.borrow_mut() += 1;
    }
}
