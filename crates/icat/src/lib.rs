//! Inline terminal images for chat clients
//!
//! A [`Session`] accepts image requests on the foreground, transmits the
//! images to the terminal one at a time on a background thread, and prints
//! placeholder lines into a chat buffer once each transmission finishes.

pub mod cli;
pub mod config;
pub mod decoder;
pub mod queue;
pub mod session;
pub mod worker;

pub use config::IcatConfig;
pub use decoder::{DecodedImage, ImageDecoder, PngDecoder};
pub use queue::{Finished, JobId, JobQueue, Worker};
pub use session::{Created, Session, ShowOutcome};
pub use worker::{CreateJob, ImageWorker, Job, JobOutput};

use icat_graphics::GraphicsError;
use icat_placement::PlacementError;
use icat_tty::TtyError;
use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IcatError {
    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("{0}")]
    InvalidGeometry(String),
}

impl IcatError {
    /// The single line shown to the user when `action` failed
    pub fn report_line(&self, action: &str) -> String {
        format!("icat: failed {action}: {self}")
    }

    /// An equivalent error for a second recipient of the same failure
    pub fn duplicate(&self) -> Self {
        match self {
            IcatError::Decode(msg) => IcatError::Decode(msg.clone()),
            IcatError::Io(e) => IcatError::Io(io::Error::new(e.kind(), e.to_string())),
            IcatError::Timeout(after) => IcatError::Timeout(*after),
            IcatError::InvalidGeometry(msg) => IcatError::InvalidGeometry(msg.clone()),
        }
    }
}

impl From<TtyError> for IcatError {
    fn from(err: TtyError) -> Self {
        match err {
            TtyError::SizeQuery(e) | TtyError::IoError(e) => IcatError::Io(e),
            TtyError::DeviceOpen { path, source } => IcatError::Io(io::Error::new(
                source.kind(),
                format!("cannot open {}: {source}", path.display()),
            )),
        }
    }
}

impl From<GraphicsError> for IcatError {
    fn from(err: GraphicsError) -> Self {
        match err {
            GraphicsError::Io(e) => IcatError::Io(e),
            aborted @ GraphicsError::Aborted { .. } => {
                IcatError::Io(io::Error::new(io::ErrorKind::Interrupted, aborted.to_string()))
            }
            too_large @ GraphicsError::TooLarge { .. } => {
                IcatError::InvalidGeometry(too_large.to_string())
            }
        }
    }
}

impl From<PlacementError> for IcatError {
    fn from(err: PlacementError) -> Self {
        match err {
            PlacementError::InvalidGeometry(msg) => IcatError::InvalidGeometry(msg),
            empty @ PlacementError::EmptyImage { .. } => IcatError::Decode(empty.to_string()),
            PlacementError::Render(e) => e.into(),
        }
    }
}
