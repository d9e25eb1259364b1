//! Debounced, single-worker pass scheduling.
//!
//! A timer thread owns the debounce deadline and starts passes; one worker
//! thread runs them. The two are joined by a one-slot mailbox and the
//! `Running` state, so at most one pass is ever in flight.

use crate::document::VersionedSpan;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::fmt;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, trace};

/// Default quiet period between the last schedule request and a pass.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Shortest wait before failed regions are retried, whatever the debounce.
const MIN_RETRY_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    /// A pass will start when the debounce deadline passes.
    Scheduled,
    Running,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::Idle => write!(f, "idle"),
            SchedulerState::Scheduled => write!(f, "scheduled"),
            SchedulerState::Running => write!(f, "running"),
        }
    }
}

/// The work a scheduler drives.
pub trait PassHost: Send + Sync + 'static {
    type Batch: Send + 'static;

    /// Collects the next pass's work, or `None` when nothing is dirty.
    fn begin_pass(&self) -> Option<Self::Batch>;

    /// Runs one pass and returns the regions that should be retried.
    fn run_pass(&self, batch: Self::Batch) -> Vec<VersionedSpan>;

    /// Whether work arrived since the pass began.
    fn has_pending(&self) -> bool;

    /// Queues failed regions again.
    fn retry(&self, failed: Vec<VersionedSpan>);
}

struct Control {
    state: SchedulerState,
    deadline: Option<Instant>,
    shutdown: bool,
}

struct Shared {
    control: Mutex<Control>,
    changed: Condvar,
    passes: AtomicU64,
    debounce: Duration,
}

impl Shared {
    fn arm(&self, control: &mut Control, delay: Duration) {
        control.deadline = Some(Instant::now() + delay);
        if control.state == SchedulerState::Idle {
            control.state = SchedulerState::Scheduled;
        }
        self.changed.notify_all();
    }

    fn settle(&self, control: &mut Control) {
        control.state = if control.deadline.is_some() {
            SchedulerState::Scheduled
        } else {
            SchedulerState::Idle
        };
        self.changed.notify_all();
    }
}

/// Runs passes of a [`PassHost`] on a background worker.
pub struct AnalysisScheduler {
    shared: Arc<Shared>,
    timer: Option<JoinHandle<()>>,
    worker: Option<JoinHandle<()>>,
}

impl AnalysisScheduler {
    pub fn new<H: PassHost>(host: Arc<H>, debounce: Duration) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            control: Mutex::new(Control {
                state: SchedulerState::Idle,
                deadline: None,
                shutdown: false,
            }),
            changed: Condvar::new(),
            passes: AtomicU64::new(0),
            debounce,
        });

        let (tx, rx) = bounded::<H::Batch>(1);

        let worker = {
            let shared = Arc::clone(&shared);
            let host = Arc::clone(&host);
            thread::Builder::new()
                .name("livespell-worker".into())
                .spawn(move || run_worker(&shared, &*host, rx))?
        };

        let timer = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("livespell-timer".into())
                .spawn(move || run_timer(&shared, &*host, tx))
        };

        let timer = match timer {
            Ok(handle) => handle,
            Err(e) => {
                // the worker exits once its mailbox sender is gone
                let _ = worker.join();
                return Err(e);
            }
        };

        Ok(Self {
            shared,
            timer: Some(timer),
            worker: Some(worker),
        })
    }

    /// Requests a pass after the debounce delay, restarting the delay if one
    /// is already pending.
    pub fn schedule(&self) {
        self.schedule_after(self.shared.debounce);
    }

    /// Requests a pass without waiting for the debounce delay.
    pub fn schedule_now(&self) {
        self.schedule_after(Duration::ZERO);
    }

    fn schedule_after(&self, delay: Duration) {
        let mut control = self.shared.control.lock();
        if control.shutdown {
            return;
        }
        self.shared.arm(&mut control, delay);
    }

    pub fn state(&self) -> SchedulerState {
        self.shared.control.lock().state
    }

    /// Number of passes handed to the worker so far.
    pub fn passes_started(&self) -> u64 {
        self.shared.passes.load(Ordering::SeqCst)
    }

    pub fn debounce(&self) -> Duration {
        self.shared.debounce
    }

    /// Blocks until the scheduler is idle. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let until = Instant::now() + timeout;
        let mut control = self.shared.control.lock();
        while control.state != SchedulerState::Idle {
            if self.shared.changed.wait_until(&mut control, until).timed_out() {
                return control.state == SchedulerState::Idle;
            }
        }
        true
    }
}

impl Drop for AnalysisScheduler {
    fn drop(&mut self) {
        {
            let mut control = self.shared.control.lock();
            control.shutdown = true;
            self.shared.changed.notify_all();
        }
        if let Some(timer) = self.timer.take() {
            let _ = timer.join();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_timer<H: PassHost>(shared: &Shared, host: &H, tx: Sender<H::Batch>) {
    let mut control = shared.control.lock();

    loop {
        if control.shutdown {
            break;
        }

        let Some(deadline) = control.deadline else {
            shared.changed.wait(&mut control);
            continue;
        };

        if Instant::now() < deadline {
            shared.changed.wait_until(&mut control, deadline);
            continue;
        }

        control.deadline = None;
        if control.state == SchedulerState::Running {
            // the worker reschedules when it finishes if work is left
            trace!("deadline reached during a pass, deferring");
            continue;
        }

        control.state = SchedulerState::Running;
        let batch = MutexGuard::unlocked(&mut control, || host.begin_pass());

        let Some(batch) = batch else {
            trace!("nothing dirty");
            shared.settle(&mut control);
            continue;
        };

        let pass = shared.passes.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(pass, "starting analysis pass");
        let sent = MutexGuard::unlocked(&mut control, || tx.send(batch));
        if sent.is_err() {
            error!("analysis worker is gone");
            control.shutdown = true;
            shared.settle(&mut control);
        }
    }
}

fn run_worker<H: PassHost>(shared: &Shared, host: &H, rx: Receiver<H::Batch>) {
    for batch in rx.iter() {
        let failed = match catch_unwind(AssertUnwindSafe(|| host.run_pass(batch))) {
            Ok(failed) => failed,
            Err(_) => {
                error!("analysis pass panicked");
                Vec::new()
            }
        };

        // checked under the lock so a mark racing with the end of the pass
        // is either seen here or followed by a schedule request
        let mut control = shared.control.lock();
        let more = host.has_pending();
        let retry = !failed.is_empty();
        if retry {
            host.retry(failed);
        }

        control.state = SchedulerState::Idle;
        if control.shutdown {
            shared.settle(&mut control);
            continue;
        }
        if more {
            shared.arm(&mut control, Duration::ZERO);
        } else if retry && control.deadline.is_none() {
            shared.arm(&mut control, shared.debounce.max(MIN_RETRY_DELAY));
        } else {
            shared.settle(&mut control);
        }
        trace!(state = %control.state, "analysis pass finished");
    }
}
