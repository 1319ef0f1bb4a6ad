//! Keeps a rolling window of randomized future chimes queued with a
//! [`NotificationCenter`].
//!
//! Each new request fires a random delay after the previous one, so the
//! queued requests form a chain. Deliveries shrink the window; once it
//! drops below the replenish threshold (or the app regains focus) the chain
//! is extended back to the full batch size.

use std::collections::VecDeque;
use std::time::Instant;

use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::interval::IntervalRange;
use crate::notifications::{ChimeRequest, NotificationCenter, RequestId};

pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_REPLENISH_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Requests to keep queued while running.
    pub batch_size: usize,
    /// Top up once fewer than this many remain.
    pub replenish_threshold: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            replenish_threshold: DEFAULT_REPLENISH_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Outstanding {
    id: RequestId,
    fire_at: Instant,
}

pub struct ChimeScheduler<N, R> {
    center: N,
    rng: R,
    interval: IntervalRange,
    settings: SchedulerSettings,
    /// Chain order, which is also `fire_at` order.
    outstanding: VecDeque<Outstanding>,
    running: bool,
    next_id: u64,
    delivered: u64,
    last_error: Option<String>,
}

impl<N: NotificationCenter, R: Rng> ChimeScheduler<N, R> {
    pub fn new(center: N, rng: R, interval: IntervalRange, settings: SchedulerSettings) -> Self {
        Self {
            center,
            rng,
            interval,
            settings,
            outstanding: VecDeque::new(),
            running: false,
            next_id: 0,
            delivered: 0,
            last_error: None,
        }
    }

    pub fn start(&mut self, now: Instant) {
        if self.running {
            return;
        }
        self.running = true;
        info!(interval = %self.interval, "chimes started");
        self.top_up(now);
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.cancel_outstanding();
        info!("chimes stopped");
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.running {
            self.stop();
        } else {
            self.start(now);
        }
    }

    /// Adopt new bounds. Everything queued under the old bounds is dropped.
    pub fn set_interval(&mut self, interval: IntervalRange, now: Instant) {
        if interval == self.interval {
            return;
        }
        self.cancel_outstanding();
        info!(from = %self.interval, to = %interval, "interval changed");
        self.interval = interval;

        if self.running {
            self.top_up(now);
        }
    }

    pub fn on_delivered(&mut self, id: RequestId, now: Instant) {
        let Some(pos) = self.outstanding.iter().position(|o| o.id == id) else {
            debug!(%id, "delivery for untracked request ignored");
            return;
        };
        self.outstanding.remove(pos);
        self.delivered += 1;
        debug!(%id, remaining = self.outstanding.len(), "chime delivered");

        if self.running && self.outstanding.len() < self.settings.replenish_threshold {
            self.top_up(now);
        }
    }

    /// Called when the app returns to the foreground, after pending
    /// deliveries have been handed to [`Self::on_delivered`].
    ///
    /// Overdue requests the center still holds are left alone: they have
    /// not rung yet. Only ones it no longer knows about are forgotten.
    pub fn on_resume(&mut self, now: Instant) {
        let before = self.outstanding.len();
        let center = &self.center;
        self.outstanding
            .retain(|o| o.fire_at > now || center.is_pending(o.id));

        let pruned = before - self.outstanding.len();
        if pruned > 0 {
            debug!(pruned, "forgot overdue requests the center no longer holds");
        }

        if self.running {
            self.top_up(now);
        }
    }

    #[cfg(test)]
    pub fn center(&self) -> &N {
        &self.center
    }

    #[cfg(test)]
    pub fn center_mut(&mut self) -> &mut N {
        &mut self.center
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Requests the notification center still holds, including any that
    /// fired but whose delivery has not been seen yet.
    pub fn queued(&self) -> usize {
        self.center.pending_count()
    }

    pub fn next_fire(&self) -> Option<Instant> {
        self.outstanding.front().map(|o| o.fire_at)
    }

    pub fn interval(&self) -> IntervalRange {
        self.interval
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn cancel_outstanding(&mut self) {
        self.center.cancel_all();
        self.outstanding.clear();
    }

    fn top_up(&mut self, now: Instant) {
        let mut base = self
            .outstanding
            .back()
            .map_or(now, |o| o.fire_at.max(now));
        let before = self.outstanding.len();

        while self.outstanding.len() < self.settings.batch_size {
            let fire_at = base + self.interval.sample(&mut self.rng);
            let request = self.request(fire_at);
            let id = request.id;

            if let Err(err) = self.submit(request) {
                self.last_error = Some(err.to_string());
                break;
            }
            self.last_error = None;
            self.outstanding.push_back(Outstanding { id, fire_at });
            base = fire_at;
        }

        debug!(
            added = self.outstanding.len() - before,
            outstanding = self.outstanding.len(),
            "batch topped up"
        );
    }

    /// Schedule with a single retry.
    fn submit(&mut self, request: ChimeRequest) -> Result<()> {
        let id = request.id;
        if let Err(err) = self.center.schedule(request.clone()) {
            warn!(%id, %err, "scheduling failed, retrying once");
            self.center
                .schedule(request)
                .inspect_err(|err| error!(%id, %err, "scheduling failed"))?;
        }
        Ok(())
    }

    fn request(&mut self, fire_at: Instant) -> ChimeRequest {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        ChimeRequest {
            id,
            fire_at,
            title: "Chime".to_string(),
            body: format!("Random chime every {}", self.interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::error::Error;
    use crate::notifications::MAX_PENDING;

    #[derive(Default)]
    struct RecordingCenter {
        pending: Vec<ChimeRequest>,
        scheduled: usize,
        cancel_all_calls: usize,
        cancelled: Vec<RequestId>,
        fail_next: usize,
    }

    impl NotificationCenter for RecordingCenter {
        fn schedule(&mut self, request: ChimeRequest) -> Result<()> {
            if self.fail_next > 0 {
                self.fail_next -= 1;
                return Err(Error::NotifierStopped);
            }
            if self.pending.len() >= MAX_PENDING {
                return Err(Error::PendingLimit(MAX_PENDING));
            }
            self.scheduled += 1;
            self.pending.push(request);
            Ok(())
        }

        fn cancel(&mut self, ids: &[RequestId]) {
            self.cancelled.extend_from_slice(ids);
            self.pending.retain(|r| !ids.contains(&r.id));
        }

        fn cancel_all(&mut self) {
            self.cancel_all_calls += 1;
            self.pending.clear();
        }

        fn pending_count(&self) -> usize {
            self.pending.len()
        }

        fn is_pending(&self, id: RequestId) -> bool {
            self.pending.iter().any(|r| r.id == id)
        }
    }

    impl RecordingCenter {
        /// Pretend the earliest request fired.
        fn deliver_next(&mut self) -> ChimeRequest {
            let idx = self
                .pending
                .iter()
                .enumerate()
                .min_by_key(|(_, r)| r.fire_at)
                .map(|(i, _)| i)
                .unwrap();
            self.pending.remove(idx)
        }
    }

    fn scheduler(min: u32, max: u32) -> ChimeScheduler<RecordingCenter, StdRng> {
        ChimeScheduler::new(
            RecordingCenter::default(),
            StdRng::seed_from_u64(42),
            IntervalRange::new(min, max).unwrap(),
            SchedulerSettings {
                batch_size: 8,
                replenish_threshold: 4,
            },
        )
    }

    #[test]
    fn start_fills_a_chain_of_increasing_fire_times() {
        let mut s = scheduler(10, 20);
        let now = Instant::now();
        s.start(now);

        assert!(s.is_running());
        assert_eq!(s.outstanding(), 8);
        assert_eq!(s.queued(), 8);

        let mut previous = now;
        for request in &s.center.pending {
            let gap = request.fire_at - previous;
            assert!(gap >= Duration::from_secs(10) && gap <= Duration::from_secs(20));
            previous = request.fire_at;
        }
        assert_eq!(s.next_fire(), Some(s.center.pending[0].fire_at));
    }

    #[test]
    fn start_twice_does_not_double_the_batch() {
        let mut s = scheduler(5, 5);
        let now = Instant::now();
        s.start(now);
        s.start(now);
        assert_eq!(s.center.scheduled, 8);
    }

    #[test]
    fn stop_cancels_everything() {
        let mut s = scheduler(5, 10);
        s.start(Instant::now());
        s.stop();

        assert!(!s.is_running());
        assert_eq!(s.outstanding(), 0);
        assert_eq!(s.center.cancel_all_calls, 1);
        assert_eq!(s.center.pending_count(), 0);
        assert_eq!(s.next_fire(), None);
    }

    #[test]
    fn replenishes_only_below_threshold() {
        let mut s = scheduler(5, 10);
        let now = Instant::now();
        s.start(now);

        // 8 -> 4 deliveries leave exactly the threshold: no top-up yet
        for _ in 0..4 {
            let fired = s.center.deliver_next();
            s.on_delivered(fired.id, fired.fire_at);
        }
        assert_eq!(s.outstanding(), 4);
        assert_eq!(s.center.scheduled, 8);

        let fired = s.center.deliver_next();
        s.on_delivered(fired.id, fired.fire_at);
        assert_eq!(s.outstanding(), 8);
        assert_eq!(s.center.scheduled, 13);
        assert_eq!(s.delivered(), 5);
    }

    #[test]
    fn replenished_requests_extend_the_chain() {
        let mut s = scheduler(5, 10);
        let now = Instant::now();
        s.start(now);
        let tail = s.center.pending.last().unwrap().fire_at;

        for _ in 0..5 {
            let fired = s.center.deliver_next();
            s.on_delivered(fired.id, fired.fire_at);
        }

        let new_requests = &s.center.pending[s.center.pending.len() - 5..];
        assert!(new_requests[0].fire_at >= tail + Duration::from_secs(5));
        assert!(new_requests.windows(2).all(|w| w[0].fire_at < w[1].fire_at));
    }

    #[test]
    fn deliveries_after_stop_do_not_reschedule() {
        let mut s = scheduler(5, 10);
        let now = Instant::now();
        s.start(now);
        let fired = s.center.deliver_next();
        s.stop();

        s.on_delivered(fired.id, now);
        assert_eq!(s.center.pending_count(), 0);
        assert_eq!(s.delivered(), 0);
    }

    #[test]
    fn interval_change_cancels_and_reschedules_with_new_bounds() {
        let mut s = scheduler(5, 10);
        let now = Instant::now();
        s.start(now);

        s.set_interval(IntervalRange::new(100, 100).unwrap(), now);
        assert_eq!(s.center.cancel_all_calls, 1);
        assert_eq!(s.outstanding(), 8);
        assert_eq!(s.next_fire(), Some(now + Duration::from_secs(100)));

        // unchanged bounds are a no-op
        s.set_interval(IntervalRange::new(100, 100).unwrap(), now);
        assert_eq!(s.center.cancel_all_calls, 1);
    }

    #[test]
    fn interval_change_while_stopped_schedules_nothing() {
        let mut s = scheduler(5, 10);
        s.set_interval(IntervalRange::new(20, 30).unwrap(), Instant::now());
        assert_eq!(s.center.scheduled, 0);
        assert_eq!(s.interval(), IntervalRange::new(20, 30).unwrap());
    }

    #[test]
    fn resume_forgets_requests_that_already_fired() {
        let mut s = scheduler(10, 10);
        let start = Instant::now();
        s.start(start);

        // 3 chimes rang but their deliveries were never seen
        for _ in 0..3 {
            s.center.deliver_next();
        }
        let resumed = start + Duration::from_secs(35);
        s.on_resume(resumed);

        assert!(s.center.cancelled.is_empty());
        assert_eq!(s.outstanding(), 8);
        assert_eq!(s.next_fire(), Some(start + Duration::from_secs(40)));
        assert_eq!(
            s.center.pending.last().map(|r| r.fire_at),
            Some(start + Duration::from_secs(110))
        );
    }

    #[test]
    fn resume_keeps_overdue_requests_the_center_still_holds() {
        let mut s = scheduler(10, 10);
        let start = Instant::now();
        s.start(start);

        s.on_resume(start + Duration::from_secs(35));

        assert!(s.center.cancelled.is_empty());
        assert_eq!(s.center.scheduled, 8);
        assert_eq!(s.outstanding(), 8);
        assert_eq!(s.next_fire(), Some(start + Duration::from_secs(10)));
    }

    #[test]
    fn resume_after_everything_fired_chains_from_now() {
        let mut s = scheduler(10, 10);
        let start = Instant::now();
        s.start(start);
        for _ in 0..8 {
            s.center.deliver_next();
        }

        let resumed = start + Duration::from_secs(1000);
        s.on_resume(resumed);
        assert_eq!(s.next_fire(), Some(resumed + Duration::from_secs(10)));
    }

    #[test]
    fn resume_does_not_drop_a_chime_waiting_behind_a_slow_alert() {
        use std::sync::{Arc, Mutex};
        use std::thread;

        use crate::notifications::{Alert, BackgroundNotifier};

        struct SlowAlert {
            rung: Arc<Mutex<Vec<RequestId>>>,
        }

        impl Alert for SlowAlert {
            fn ring(&self, request: &ChimeRequest) {
                self.rung.lock().unwrap().push(request.id);
                thread::sleep(Duration::from_millis(1500));
            }
        }

        let rung = Arc::new(Mutex::new(Vec::new()));
        let worker_rung = Arc::clone(&rung);
        let (notifier, deliveries) =
            BackgroundNotifier::spawn(move || SlowAlert { rung: worker_rung }).unwrap();
        let mut s = ChimeScheduler::new(
            notifier,
            StdRng::seed_from_u64(9),
            IntervalRange::new(1, 1).unwrap(),
            SchedulerSettings {
                batch_size: 3,
                replenish_threshold: 1,
            },
        );

        // chime 0 rings at +1s and holds the worker until +2.5s, so at
        // +2.2s chime 0 is mid-ring and chime 1 (due at +2s) is overdue
        s.start(Instant::now());
        thread::sleep(Duration::from_millis(2200));
        s.on_resume(Instant::now());
        assert!(s.center().is_pending(RequestId(0)));
        assert!(s.center().is_pending(RequestId(1)));
        assert_eq!(s.outstanding(), 3);

        let timeout = Duration::from_secs(5);
        assert_eq!(deliveries.recv_timeout(timeout).unwrap(), RequestId(0));
        assert_eq!(deliveries.recv_timeout(timeout).unwrap(), RequestId(1));
        assert_eq!(rung.lock().unwrap()[..2], [RequestId(0), RequestId(1)]);
    }

    #[test]
    fn single_failure_is_retried() {
        let mut s = scheduler(5, 10);
        s.center.fail_next = 1;
        s.start(Instant::now());

        assert_eq!(s.outstanding(), 8);
        assert_eq!(s.last_error(), None);
    }

    #[test]
    fn repeated_failure_stops_the_round_and_is_reported() {
        let mut s = scheduler(5, 10);
        s.center.fail_next = 2;
        let now = Instant::now();
        s.start(now);

        assert_eq!(s.outstanding(), 0);
        assert!(s.last_error().is_some());

        s.on_resume(now);
        assert_eq!(s.outstanding(), 8);
        assert_eq!(s.last_error(), None);
    }

    #[test]
    fn capacity_limit_caps_the_batch() {
        let mut s = scheduler(5, 10);
        s.settings.batch_size = MAX_PENDING + 10;
        s.start(Instant::now());

        assert_eq!(s.outstanding(), MAX_PENDING);
        assert!(s.last_error().is_some());
    }
}
