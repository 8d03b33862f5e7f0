//! Ordering and timeout behaviour of the job queue

use icat::{IcatError, JobQueue, Worker};
use icat_graphics::AbortFlag;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records when each job starts and checks that no two run at once
#[derive(Clone, Default)]
struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

impl Recorder {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl Worker for Recorder {
    type Job = u32;
    type Output = u32;

    fn run(&self, job: u32, _abort: AbortFlag) -> Result<u32, IcatError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.push(format!("start {job}"));

        // Later jobs finish faster, so any overlap would reorder results
        std::thread::sleep(Duration::from_millis(u64::from(40 - job * 10)));

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(job)
    }
}

#[tokio::test]
async fn test_callbacks_fire_in_submission_order() {
    let recorder = Recorder::default();
    let mut queue = JobQueue::new(recorder.clone(), Duration::from_secs(10));

    for job in 1..=3 {
        queue.submit(job, job);
    }

    while queue
        .complete_next(|finished| {
            let result = finished.result.unwrap();
            assert_eq!(result, finished.handle);
            recorder.push(format!("done {result}"));
        })
        .await
        .is_some()
    {}

    assert_eq!(
        recorder.events(),
        vec!["start 1", "done 1", "start 2", "done 2", "start 3", "done 3"]
    );
    assert_eq!(recorder.max_active.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_submit_while_running_waits_for_delivery() {
    let recorder = Recorder::default();
    let mut queue = JobQueue::new(recorder.clone(), Duration::from_secs(10));

    let first = queue.submit(1, 1);
    assert_eq!(queue.running_id(), Some(first));

    let second = queue.submit(2, 2);
    assert_eq!(queue.running_id(), Some(first));
    assert_eq!(queue.len(), 2);

    queue.complete_next(|_| ()).await;
    assert_eq!(queue.running_id(), Some(second));
    queue.complete_next(|_| ()).await;
    assert!(queue.is_empty());
}

/// Blocks until released, then records whether it was told to abort
struct Stuck {
    release: Mutex<mpsc::Receiver<()>>,
    events: Arc<Mutex<Vec<String>>>,
}

impl Worker for Stuck {
    type Job = bool;
    type Output = &'static str;

    fn run(&self, block: bool, abort: AbortFlag) -> Result<&'static str, IcatError> {
        if !block {
            self.events.lock().unwrap().push("quick ran".to_string());
            return Ok("quick");
        }
        let _ = self.release.lock().unwrap().recv_timeout(Duration::from_secs(5));
        self.events
            .lock()
            .unwrap()
            .push(format!("stuck stopped, aborted={}", abort.is_raised()));
        Ok("late")
    }
}

#[tokio::test]
async fn test_timeout_reports_at_once_but_next_job_waits_for_thread() {
    let (release_tx, release_rx) = mpsc::channel();
    let events = Arc::new(Mutex::new(Vec::new()));
    let worker = Stuck {
        release: Mutex::new(release_rx),
        events: events.clone(),
    };
    let mut queue = JobQueue::new(worker, Duration::from_millis(100));

    queue.submit(true, "stuck");
    queue.submit(false, "next");

    let (handle, result) = queue
        .complete_next(|f| (f.handle, f.result))
        .await
        .unwrap();
    assert_eq!(handle, "stuck");
    assert!(matches!(result, Err(IcatError::Timeout(d)) if d == Duration::from_millis(100)));

    // The abandoned thread still owns the device, so nothing new has started
    assert_eq!(queue.running_id(), None);
    assert!(!queue.is_idle());
    assert_eq!(queue.len(), 2);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(events.lock().unwrap().is_empty());

    release_tx.send(()).unwrap();
    let (handle, result) = queue
        .complete_next(|f| (f.handle, f.result))
        .await
        .unwrap();
    assert_eq!(handle, "next");
    assert_eq!(result.unwrap(), "quick");
    assert!(queue.complete_next(|_| ()).await.is_none());
    assert!(queue.is_idle());

    assert_eq!(
        *events.lock().unwrap(),
        vec!["stuck stopped, aborted=true", "quick ran"]
    );
}

#[tokio::test]
async fn test_timed_out_last_job_is_drained() {
    let (release_tx, release_rx) = mpsc::channel();
    let events = Arc::new(Mutex::new(Vec::new()));
    let worker = Stuck {
        release: Mutex::new(release_rx),
        events: events.clone(),
    };
    let mut queue = JobQueue::new(worker, Duration::from_millis(50));

    queue.submit(true, ());
    queue.complete_next(|_| ()).await.unwrap();
    assert!(!queue.is_idle());

    // A job submitted now waits for the abandoned one
    queue.submit(false, ());
    assert_eq!(queue.running_id(), None);

    release_tx.send(()).unwrap();
    queue.complete_next(|f| assert!(f.result.is_ok())).await.unwrap();
    assert!(queue.is_idle());
    assert_eq!(
        *events.lock().unwrap(),
        vec!["stuck stopped, aborted=true", "quick ran"]
    );
}
