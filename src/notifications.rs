//! Scheduled-notification capability and its in-process implementation.
//!
//! The scheduler never fires chimes itself. It hands future requests to a
//! [`NotificationCenter`], which owns them until they are due. The shipped
//! [`BackgroundNotifier`] runs on its own thread, so chimes keep sounding
//! while the terminal is unfocused or the UI loop is busy.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

/// Most requests a center will hold at once.
pub const MAX_PENDING: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chime-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChimeRequest {
    pub id: RequestId,
    pub fire_at: Instant,
    pub title: String,
    pub body: String,
}

/// Something that can hold future chime requests and fire them on time.
pub trait NotificationCenter {
    fn schedule(&mut self, request: ChimeRequest) -> Result<()>;
    fn cancel(&mut self, ids: &[RequestId]);
    fn cancel_all(&mut self);
    fn pending_count(&self) -> usize;
    /// Whether `id` is still waiting to fire or is ringing and has not
    /// been reported as delivered yet.
    fn is_pending(&self, id: RequestId) -> bool;
}

/// What happens when a request comes due.
pub trait Alert {
    fn ring(&self, request: &ChimeRequest);
}

#[derive(Default)]
struct Queue {
    /// Sorted by `fire_at`, earliest first.
    pending: Vec<ChimeRequest>,
    /// Taken off `pending` and ringing; cleared once its delivery is sent.
    ringing: Option<RequestId>,
    shutdown: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct BackgroundNotifier {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundNotifier {
    /// Start the notifier thread. `make_alert` runs on that thread, so the
    /// alert itself need not be `Send` (audio output streams are not).
    /// Delivered request ids arrive on the returned receiver.
    pub fn spawn<A, F>(make_alert: F) -> Result<(Self, Receiver<RequestId>)>
    where
        A: Alert + 'static,
        F: FnOnce() -> A + Send + 'static,
    {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue::default()),
            wake: Condvar::new(),
        });
        let (deliveries, receiver) = crossbeam_channel::unbounded();

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("chime-notifier".into())
            .spawn(move || {
                let alert = make_alert();
                run_worker(&worker_shared, &alert, &deliveries);
            })?;

        debug!("background notifier started");
        Ok((
            Self {
                shared,
                worker: Some(worker),
            },
            receiver,
        ))
    }
}

impl NotificationCenter for BackgroundNotifier {
    fn schedule(&mut self, request: ChimeRequest) -> Result<()> {
        let mut queue = self.shared.lock();
        if queue.shutdown {
            return Err(Error::NotifierStopped);
        }
        if queue.pending.len() >= MAX_PENDING {
            return Err(Error::PendingLimit(MAX_PENDING));
        }
        if queue.pending.iter().any(|r| r.id == request.id) {
            return Err(Error::DuplicateRequest(request.id));
        }

        let at = queue
            .pending
            .partition_point(|r| r.fire_at <= request.fire_at);
        trace!(id = %request.id, position = at, "request queued");
        queue.pending.insert(at, request);
        drop(queue);

        self.shared.wake.notify_one();
        Ok(())
    }

    fn cancel(&mut self, ids: &[RequestId]) {
        let mut queue = self.shared.lock();
        queue.pending.retain(|r| !ids.contains(&r.id));
        drop(queue);
        self.shared.wake.notify_one();
    }

    fn cancel_all(&mut self) {
        let mut queue = self.shared.lock();
        let cancelled = queue.pending.len();
        queue.pending.clear();
        drop(queue);

        debug!(cancelled, "all pending requests cancelled");
        self.shared.wake.notify_one();
    }

    fn pending_count(&self) -> usize {
        self.shared.lock().pending.len()
    }

    fn is_pending(&self, id: RequestId) -> bool {
        let queue = self.shared.lock();
        queue.ringing == Some(id) || queue.pending.iter().any(|r| r.id == id)
    }
}

impl Drop for BackgroundNotifier {
    fn drop(&mut self) {
        self.shared.lock().shutdown = true;
        self.shared.wake.notify_all();

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("notifier thread panicked");
            }
        }
    }
}

fn run_worker<A: Alert>(shared: &Shared, alert: &A, deliveries: &Sender<RequestId>) {
    let mut queue = shared.lock();
    loop {
        if queue.shutdown {
            debug!("background notifier stopping");
            return;
        }

        let now = Instant::now();
        match queue.pending.first().map(|r| r.fire_at) {
            None => {
                queue = shared
                    .wake
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            Some(fire_at) if fire_at <= now => {
                let request = queue.pending.remove(0);
                queue.ringing = Some(request.id);
                drop(queue);

                debug!(id = %request.id, "chime due");
                alert.ring(&request);
                if deliveries.send(request.id).is_err() {
                    trace!(id = %request.id, "delivery receiver gone");
                }

                queue = shared.lock();
                queue.ringing = None;
            }
            Some(fire_at) => {
                let (guard, _) = shared
                    .wake
                    .wait_timeout(queue, fire_at - now)
                    .unwrap_or_else(PoisonError::into_inner);
                queue = guard;
            }
        }
    }
}
