//! Foreground image session
//!
//! Owns the placement store and the job queue. Requests return as soon as
//! their job is queued; results are applied to the store and handed to the
//! caller's completion when the foreground drives [`Session::pump`].

use crate::config::IcatConfig;
use crate::decoder::{ImageDecoder, PngDecoder};
use crate::queue::{Finished, JobId, JobQueue};
use crate::worker::{CreateJob, ImageWorker, Job, JobOutput};
use crate::IcatError;
use icat_graphics::{ImageId, MAX_CELLS};
use icat_placement::{render, ChatBuffer, ImagePlacement, PlacementSizer, PlacementStore};
use icat_tty::{DeviceOpener, FdProbe, TerminalProbe, TerminalSize, TtyDevice};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Completion of a create request
pub type Completion = Box<dyn FnOnce(Result<Created, IcatError>)>;

/// Completion of a restore request, given the number of placements replayed
pub type RestoreCompletion = Box<dyn FnOnce(Result<usize, IcatError>)>;

#[derive(Debug, Clone)]
pub struct Created {
    pub placement: ImagePlacement,
    /// The placement's geometry was fixed before any background work ran,
    /// either because it was already stored or because it was reserved and
    /// printed up front. Callers that already printed it only need a refresh.
    pub size_was_known: bool,
}

/// What [`Session::show`] did with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    /// Printed from a stored placement without transmitting anything
    Reused,
    /// Printed now; the image appears once the job has transmitted it.
    /// Also returned when the request joined a job that is already
    /// transmitting the same reserved placement.
    Reserved(JobId),
    /// Printed when the job finishes
    Scheduled(JobId),
}

struct Reservation {
    path: PathBuf,
    image_id: ImageId,
}

impl Reservation {
    fn key(&self) -> (PathBuf, ImageId) {
        (self.path.clone(), self.image_id)
    }
}

/// Requests that matched a reserved placement while its job was running.
/// They get the job's result after the request that reserved it.
struct InFlight {
    job: JobId,
    waiters: Vec<Completion>,
}

enum Pending {
    Create {
        completion: Completion,
        reservation: Option<Reservation>,
    },
    Restore(RestoreCompletion),
}

pub struct Session {
    config: IcatConfig,
    probe: Box<dyn TerminalProbe>,
    store: PlacementStore,
    queue: JobQueue<ImageWorker, Pending>,
    in_flight: HashMap<(PathBuf, ImageId), InFlight>,
}

impl Session {
    /// A session writing to the configured terminal device and sizing
    /// against the terminal on stdout
    pub fn new(config: IcatConfig) -> Self {
        let device = TtyDevice::at(config.device.clone());
        Self::with_parts(
            config,
            Arc::new(PngDecoder),
            Arc::new(device),
            Box::new(FdProbe::stdout()),
        )
    }

    pub fn with_parts(
        config: IcatConfig,
        decoder: Arc<dyn ImageDecoder>,
        device: Arc<dyn DeviceOpener>,
        probe: Box<dyn TerminalProbe>,
    ) -> Self {
        let worker = ImageWorker::new(
            decoder,
            device,
            config.passthrough,
            PlacementSizer::new(config.default_rows),
        );
        let queue = JobQueue::new(worker, config.job_timeout);

        Self {
            config,
            probe,
            store: PlacementStore::new(),
            queue,
            in_flight: HashMap::new(),
        }
    }

    pub fn config(&self) -> &IcatConfig {
        &self.config
    }

    pub fn store(&self) -> &PlacementStore {
        &self.store
    }

    /// Jobs queued or running
    pub fn pending_jobs(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Create a placement of `path`, reusing a stored one when it matches.
    /// A transmitted match completes immediately and returns `None`. A
    /// reserved match joins the job transmitting it; otherwise a job is
    /// queued. Either way the completion runs from [`Session::pump`].
    pub fn create_placement<F>(
        &mut self,
        path: impl Into<PathBuf>,
        columns: Option<u16>,
        rows: Option<u16>,
        on_complete: F,
    ) -> Result<Option<JobId>, IcatError>
    where
        F: FnOnce(Result<Created, IcatError>) + 'static,
    {
        check_cells("columns", columns)?;
        check_cells("rows", rows)?;
        let path = path.into();

        if let Some(placement) = self.store.find(&path, columns, rows) {
            if placement.is_transmitted() {
                debug!("Reusing image {} for {}", placement.image_id(), path.display());
                on_complete(Ok(Created {
                    placement: placement.clone(),
                    size_was_known: true,
                }));
                return Ok(None);
            }
            let key = (path.clone(), placement.image_id());
            if let Some(job) = self.join_in_flight(&key, Box::new(on_complete)) {
                return Ok(Some(job));
            }
            return Err(unexpected_reservation(&path));
        }

        let id = self.submit_create(
            path,
            ImageId::random(),
            columns,
            rows,
            None,
            Box::new(on_complete),
        );
        Ok(Some(id))
    }

    /// Display `path` in `buffer`.
    ///
    /// With `print_immediately` the placeholder lines are printed before the
    /// image is transmitted, which needs both `columns` and `rows`. Failures
    /// of the background job are reported through `buffer`.
    pub fn show<B>(
        &mut self,
        buffer: Rc<B>,
        path: impl AsRef<Path>,
        columns: Option<u16>,
        rows: Option<u16>,
        print_immediately: bool,
    ) -> Result<ShowOutcome, IcatError>
    where
        B: ChatBuffer + 'static,
    {
        check_cells("columns", columns)?;
        check_cells("rows", rows)?;
        let path = path.as_ref();

        if print_immediately && (columns.is_none() || rows.is_none()) {
            return Err(IcatError::InvalidGeometry(
                "both columns and rows must be given to print immediately".to_string(),
            ));
        }
        if !path.is_file() {
            return Err(IcatError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not an existing file", path.display()),
            )));
        }

        if let Some(placement) = self.store.find(path, columns, rows) {
            render(&*buffer, placement)?;
            if placement.is_transmitted() {
                debug!("Showing stored image {} for {}", placement.image_id(), path.display());
                return Ok(ShowOutcome::Reused);
            }
            let key = (path.to_path_buf(), placement.image_id());
            return match self.join_in_flight(&key, show_completion(buffer)) {
                Some(job) => Ok(ShowOutcome::Reserved(job)),
                None => Err(unexpected_reservation(path)),
            };
        }

        match (print_immediately, columns, rows) {
            (true, Some(columns), Some(rows)) => {
                let placement = ImagePlacement::new(path, ImageId::random(), columns, rows)?;
                render(&*buffer, &placement)?;

                let image_id = placement.image_id();
                let reservation = Reservation {
                    path: path.to_path_buf(),
                    image_id,
                };
                let key = reservation.key();
                self.store.insert(placement);

                let job = self.submit_create(
                    path.to_path_buf(),
                    image_id,
                    Some(columns),
                    Some(rows),
                    Some(reservation),
                    show_completion(buffer),
                );
                self.in_flight.insert(
                    key,
                    InFlight {
                        job,
                        waiters: Vec::new(),
                    },
                );
                Ok(ShowOutcome::Reserved(job))
            }
            _ => {
                let job = self.submit_create(
                    path.to_path_buf(),
                    ImageId::random(),
                    columns,
                    rows,
                    None,
                    show_completion(buffer),
                );
                Ok(ShowOutcome::Scheduled(job))
            }
        }
    }

    /// Transmit every stored placement again, for a terminal that has never
    /// seen them. Completes immediately with `Ok(0)` when nothing is stored.
    pub fn restore_all<F>(&mut self, on_complete: F) -> Option<JobId>
    where
        F: FnOnce(Result<usize, IcatError>) + 'static,
    {
        if self.store.is_empty() {
            debug!("Nothing to restore");
            on_complete(Ok(0));
            return None;
        }

        let placements: Vec<ImagePlacement> = self.store.iter().cloned().collect();
        info!("Restoring {} placements", placements.len());
        Some(
            self.queue
                .submit(Job::Restore(placements), Pending::Restore(Box::new(on_complete))),
        )
    }

    /// Deliver the result of the running job, if any. Returns false when
    /// there was nothing to wait for.
    pub async fn pump(&mut self) -> bool {
        let store = &mut self.store;
        let in_flight = &mut self.in_flight;
        self.queue
            .complete_next(|finished| deliver(store, in_flight, finished))
            .await
            .is_some()
    }

    /// Deliver results until every queued job has finished
    pub async fn run_until_idle(&mut self) {
        while self.pump().await {}
    }

    fn terminal_size(&self) -> TerminalSize {
        self.probe.size().unwrap_or_else(|e| {
            warn!("Terminal size unavailable, sizing without pixels: {}", e);
            TerminalSize::default()
        })
    }

    /// Attach `completion` to the job transmitting the reserved placement
    /// `key`. Returns that job, or `None` if nothing is transmitting it.
    fn join_in_flight(
        &mut self,
        key: &(PathBuf, ImageId),
        completion: Completion,
    ) -> Option<JobId> {
        let in_flight = self.in_flight.get_mut(key)?;
        debug!(
            "Waiting on job {} for reserved image {} of {}",
            in_flight.job,
            key.1,
            key.0.display()
        );
        in_flight.waiters.push(completion);
        Some(in_flight.job)
    }

    fn submit_create(
        &mut self,
        path: PathBuf,
        image_id: ImageId,
        columns: Option<u16>,
        rows: Option<u16>,
        reservation: Option<Reservation>,
        completion: Completion,
    ) -> JobId {
        let job = Job::Create(CreateJob {
            path,
            image_id,
            columns,
            rows,
            terminal: self.terminal_size(),
        });
        self.queue.submit(
            job,
            Pending::Create {
                completion,
                reservation,
            },
        )
    }
}

fn check_cells(what: &str, value: Option<u16>) -> Result<(), IcatError> {
    match value {
        Some(n) if n == 0 || n > MAX_CELLS => Err(IcatError::InvalidGeometry(format!(
            "{what} must be a positive integer no larger than {MAX_CELLS}"
        ))),
        _ => Ok(()),
    }
}

fn show_completion<B: ChatBuffer + 'static>(buffer: Rc<B>) -> Completion {
    Box::new(move |result| {
        let shown = result.and_then(|created| {
            if created.size_was_known {
                buffer.refresh();
                Ok(())
            } else {
                render(&*buffer, &created.placement).map_err(IcatError::from)
            }
        });
        if let Err(e) = shown {
            buffer.print_error(&e.report_line("displaying image"));
        }
    })
}

fn deliver(
    store: &mut PlacementStore,
    in_flight: &mut HashMap<(PathBuf, ImageId), InFlight>,
    finished: Finished<JobOutput, Pending>,
) {
    let Finished {
        id,
        result,
        elapsed,
        handle,
    } = finished;

    match handle {
        Pending::Create {
            completion,
            reservation,
        } => {
            let created = match result {
                Ok(JobOutput::Created(placement)) => {
                    if reservation.is_some() {
                        store.complete(placement.clone());
                    } else {
                        store.insert(placement.clone());
                    }
                    Ok(Created {
                        placement,
                        size_was_known: reservation.is_some(),
                    })
                }
                Ok(JobOutput::Restored(_)) => Err(unexpected_output(id)),
                Err(e) => Err(e),
            };

            match &created {
                Ok(c) => info!("Image {} ready after {:?}", c.placement.image_id(), elapsed),
                Err(e) => {
                    warn!("Job {} failed after {:?}: {}", id, elapsed, e);
                    if let Some(r) = &reservation {
                        store.remove(&r.path, r.image_id);
                    }
                }
            }

            let waiters = reservation
                .and_then(|r| in_flight.remove(&r.key()))
                .map(|f| f.waiters)
                .unwrap_or_default();
            let shared: Vec<_> = waiters
                .into_iter()
                .map(|waiter| (waiter, share(&created)))
                .collect();

            completion(created);
            for (waiter, result) in shared {
                waiter(result);
            }
        }
        Pending::Restore(completion) => {
            let restored = match result {
                Ok(JobOutput::Restored(count)) => Ok(count),
                Ok(JobOutput::Created(_)) => Err(unexpected_output(id)),
                Err(e) => Err(e),
            };
            if let Err(e) = &restored {
                warn!("Restore job {} failed after {:?}: {}", id, elapsed, e);
            }
            completion(restored);
        }
    }
}

fn share(created: &Result<Created, IcatError>) -> Result<Created, IcatError> {
    match created {
        Ok(c) => Ok(c.clone()),
        Err(e) => Err(e.duplicate()),
    }
}

fn unexpected_reservation(path: &Path) -> IcatError {
    IcatError::Io(io::Error::new(
        io::ErrorKind::Other,
        format!("{} is reserved but no job is transmitting it", path.display()),
    ))
}

fn unexpected_output(id: JobId) -> IcatError {
    IcatError::Io(io::Error::new(
        io::ErrorKind::Other,
        format!("job {id} returned output of the wrong kind"),
    ))
}
