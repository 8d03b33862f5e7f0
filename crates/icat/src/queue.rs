//! Single-flight job queue
//!
//! Every job writes to the same terminal device, so at most one runs at a
//! time. Jobs run on Tokio's blocking pool; their results are handed back to
//! the foreground in submission order by [`JobQueue::complete_next`], and the
//! next job is only started after the previous result has been delivered.
//!
//! A job that times out is reported straight away but keeps its thread until
//! it notices the abort flag. The next job starts only once that thread has
//! returned, so two jobs never write to the device at the same time.

use crate::IcatError;
use icat_graphics::AbortFlag;
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Background phase of a job. Runs on a blocking thread.
pub trait Worker: Send + Sync + 'static {
    type Job: Send + 'static;
    type Output: Send + 'static;

    /// Run `job` to completion. `abort` is raised if the queue gave up
    /// waiting; the worker should stop writing as soon as it notices.
    fn run(&self, job: Self::Job, abort: AbortFlag) -> Result<Self::Output, IcatError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A completed job together with the handle it was submitted with
#[derive(Debug)]
pub struct Finished<O, H> {
    pub id: JobId,
    pub result: Result<O, IcatError>,
    pub elapsed: Duration,
    pub handle: H,
}

struct Queued<J, H> {
    id: JobId,
    job: J,
    handle: H,
}

/// A timed out job whose thread has not returned yet
struct Draining<O> {
    id: JobId,
    task: JoinHandle<Result<O, IcatError>>,
}

struct Running<O, H> {
    id: JobId,
    handle: H,
    task: JoinHandle<Result<O, IcatError>>,
    abort: AbortFlag,
    started: Instant,
    deadline: tokio::time::Instant,
}

pub struct JobQueue<W: Worker, H> {
    worker: Arc<W>,
    timeout: Duration,
    pending: VecDeque<Queued<W::Job, H>>,
    running: Option<Running<W::Output, H>>,
    draining: Option<Draining<W::Output>>,
}

impl<W: Worker, H> JobQueue<W, H> {
    pub fn new(worker: W, timeout: Duration) -> Self {
        Self {
            worker: Arc::new(worker),
            timeout,
            pending: VecDeque::new(),
            running: None,
            draining: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Queue `job`. It starts right away when nothing else is queued or
    /// running. Must be called from within a Tokio runtime.
    pub fn submit(&mut self, job: W::Job, handle: H) -> JobId {
        let id = JobId::new();
        self.pending.push_back(Queued { id, job, handle });
        debug!("Queued job {} ({} waiting)", id, self.pending.len());

        if self.running.is_none() && self.draining.is_none() {
            self.start_next();
        }
        id
    }

    /// Wait for the running job, pass its result to `deliver`, then start the
    /// next queued job. Returns `None` when nothing is queued or running.
    pub async fn complete_next<F, R>(&mut self, deliver: F) -> Option<R>
    where
        F: FnOnce(Finished<W::Output, H>) -> R,
    {
        if self.drain().await {
            self.start_next();
        }
        let mut running = self.running.take()?;

        let outcome = tokio::time::timeout_at(running.deadline, &mut running.task).await;
        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                error!("Job {} failed: {}", running.id, join_error);
                Err(IcatError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    format!("background job failed: {join_error}"),
                )))
            }
            Err(_) => {
                warn!("Job {} timed out after {:?}", running.id, self.timeout);
                running.abort.raise();
                self.draining = Some(Draining {
                    id: running.id,
                    task: running.task,
                });
                Err(IcatError::Timeout(self.timeout))
            }
        };

        let elapsed = running.started.elapsed();
        debug!("Job {} completed in {:?}", running.id, elapsed);

        let delivered = deliver(Finished {
            id: running.id,
            result,
            elapsed,
            handle: running.handle,
        });

        if self.draining.is_none() {
            self.start_next();
        }
        Some(delivered)
    }

    /// Wait for an abandoned job's thread to return. Returns true if there
    /// was one.
    async fn drain(&mut self) -> bool {
        let Some(Draining { id, task }) = self.draining.take() else {
            return false;
        };
        debug!("Waiting for timed out job {} to stop", id);
        match task.await {
            Ok(Ok(_)) => debug!("Timed out job {} finished anyway", id),
            Ok(Err(e)) => debug!("Timed out job {} stopped: {}", id, e),
            Err(join_error) => error!("Timed out job {} failed: {}", id, join_error),
        }
        true
    }

    /// Jobs queued or running, including a timed out job that has not
    /// stopped yet
    pub fn len(&self) -> usize {
        self.pending.len()
            + usize::from(self.running.is_some())
            + usize::from(self.draining.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_none() && self.draining.is_none()
    }

    pub fn running_id(&self) -> Option<JobId> {
        self.running.as_ref().map(|r| r.id)
    }

    fn start_next(&mut self) {
        let Some(Queued { id, job, handle }) = self.pending.pop_front() else {
            return;
        };

        let worker = Arc::clone(&self.worker);
        let abort = AbortFlag::new();
        let task = {
            let abort = abort.clone();
            tokio::task::spawn_blocking(move || worker.run(job, abort))
        };

        debug!("Started job {}", id);
        self.running = Some(Running {
            id,
            handle,
            task,
            abort,
            started: Instant::now(),
            deadline: tokio::time::Instant::now() + self.timeout,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Double;

    impl Worker for Double {
        type Job = u32;
        type Output = u32;

        fn run(&self, job: u32, _abort: AbortFlag) -> Result<u32, IcatError> {
            if job == 0 {
                return Err(IcatError::InvalidGeometry("zero".into()));
            }
            Ok(job * 2)
        }
    }

    struct Panics;

    impl Worker for Panics {
        type Job = ();
        type Output = ();

        fn run(&self, _job: (), _abort: AbortFlag) -> Result<(), IcatError> {
            panic!("worker exploded");
        }
    }

    #[tokio::test]
    async fn test_idle_queue_has_nothing_to_complete() {
        let mut queue: JobQueue<Double, ()> = JobQueue::new(Double, Duration::from_secs(5));
        assert!(queue.is_idle());
        assert!(queue.is_empty());
        assert!(queue.complete_next(|_| ()).await.is_none());
    }

    #[tokio::test]
    async fn test_only_head_runs() {
        let mut queue = JobQueue::new(Double, Duration::from_secs(5));
        let first = queue.submit(1, "first");
        let second = queue.submit(2, "second");

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.running_id(), Some(first));

        let done = queue.complete_next(|f| (f.id, f.handle, f.result.unwrap())).await;
        assert_eq!(done, Some((first, "first", 2)));
        assert_eq!(queue.running_id(), Some(second));

        let done = queue.complete_next(|f| (f.id, f.handle, f.result.unwrap())).await;
        assert_eq!(done, Some((second, "second", 4)));
        assert!(queue.is_idle());
    }

    #[tokio::test]
    async fn test_error_does_not_stop_queue() {
        let mut queue = JobQueue::new(Double, Duration::from_secs(5));
        queue.submit(0, ());
        queue.submit(3, ());

        let failed = queue.complete_next(|f| f.result).await.unwrap();
        assert!(matches!(failed, Err(IcatError::InvalidGeometry(_))));
        let ok = queue.complete_next(|f| f.result).await.unwrap();
        assert_eq!(ok.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_panic_becomes_io_error() {
        let mut queue = JobQueue::new(Panics, Duration::from_secs(5));
        queue.submit((), ());
        let result = queue.complete_next(|f| f.result).await.unwrap();
        assert!(matches!(result, Err(IcatError::Io(_))));
        assert!(queue.is_idle());
    }
}
