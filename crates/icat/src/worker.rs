//! Background phase of image jobs

use crate::decoder::ImageDecoder;
use crate::queue::Worker;
use crate::IcatError;
use icat_graphics::{replay, AbortFlag, ChunkedTransmitter, GraphicsError, ImageId, Passthrough};
use icat_placement::{CellExtent, ImagePlacement, PlacementSizer};
use icat_tty::{DeviceOpener, TerminalSize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Parameters for creating and transmitting one placement
#[derive(Debug, Clone)]
pub struct CreateJob {
    pub path: PathBuf,
    pub image_id: ImageId,
    pub columns: Option<u16>,
    pub rows: Option<u16>,
    /// Geometry captured when the job was submitted
    pub terminal: TerminalSize,
}

#[derive(Debug, Clone)]
pub enum Job {
    Create(CreateJob),
    /// Replay stored placements into a fresh terminal
    Restore(Vec<ImagePlacement>),
}

#[derive(Debug)]
pub enum JobOutput {
    Created(ImagePlacement),
    /// Number of placements replayed
    Restored(usize),
}

pub struct ImageWorker {
    decoder: Arc<dyn ImageDecoder>,
    device: Arc<dyn DeviceOpener>,
    passthrough: Passthrough,
    sizer: PlacementSizer,
}

impl ImageWorker {
    pub fn new(
        decoder: Arc<dyn ImageDecoder>,
        device: Arc<dyn DeviceOpener>,
        passthrough: Passthrough,
        sizer: PlacementSizer,
    ) -> Self {
        Self {
            decoder,
            device,
            passthrough,
            sizer,
        }
    }

    fn create(&self, job: CreateJob, abort: AbortFlag) -> Result<ImagePlacement, IcatError> {
        let decoded = self.decoder.decode(&job.path)?;

        let extent = match (job.columns, job.rows) {
            (Some(columns), Some(rows)) => CellExtent { columns, rows },
            (columns, rows) => self.sizer.size(
                decoded.width,
                decoded.height,
                &job.terminal,
                columns,
                rows,
            )?,
        };

        let placement =
            ImagePlacement::new(job.path, job.image_id, extent.columns, extent.rows)?;

        let mut device = self.device.open()?;
        let wire = ChunkedTransmitter::new(self.passthrough)
            .with_abort(abort)
            .send(&mut *device, &placement.control_data(), &decoded.png)?;

        info!(
            "Transmitted {} as image {} ({}x{} cells)",
            placement.source_path().display(),
            placement.image_id(),
            placement.columns(),
            placement.rows()
        );
        Ok(placement.with_wire(wire))
    }

    fn restore(
        &self,
        placements: Vec<ImagePlacement>,
        abort: AbortFlag,
    ) -> Result<usize, IcatError> {
        let mut device = self.device.open()?;
        let total = placements.len();
        let mut replayed = 0;

        for placement in &placements {
            if abort.is_raised() {
                return Err(GraphicsError::Aborted {
                    sent: replayed,
                    total,
                }
                .into());
            }
            if !placement.is_transmitted() {
                debug!(
                    "Skipping image {} which is still being transmitted",
                    placement.image_id()
                );
                continue;
            }
            replay(&mut *device, placement.wire())?;
            replayed += 1;
        }

        info!("Restored {} of {} placements", replayed, total);
        Ok(replayed)
    }
}

impl Worker for ImageWorker {
    type Job = Job;
    type Output = JobOutput;

    fn run(&self, job: Job, abort: AbortFlag) -> Result<JobOutput, IcatError> {
        match job {
            Job::Create(create) => self.create(create, abort).map(JobOutput::Created),
            Job::Restore(placements) => self.restore(placements, abort).map(JobOutput::Restored),
        }
    }
}
