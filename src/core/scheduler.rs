//! Bounded-concurrency scheduler.
//!
//! The scheduler owns a FIFO queue of pending [`Task`]s and a fixed limit on
//! how many of them may execute at once. Producers call
//! [`Scheduler::add_task`] from any thread; a single drain thread consumes the
//! queue with [`Scheduler::run`], [`Scheduler::drain_once`] or
//! [`Scheduler::execute_tasks`].
//!
//! # Design
//!
//! - **One queue lock**: every append, batch removal and length check goes
//!   through the queue's `parking_lot::Mutex`; a `Condvar` on the same mutex
//!   wakes the idle drain loop on submission or stop.
//! - **Counting semaphore**: tasks acquire one of `limit` permits before they
//!   are handed to an execution thread, in queue order.
//! - **Join barrier**: execution threads are scoped to the batch, pass or
//!   drain loop that spawned them, so nothing outlives its caller.
//! - **Fault isolation**: failures and panics are contained by
//!   [`Task::execute`] and only ever show up as outcomes.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, info};

use crate::config::{DrainMode, SchedulerConfig};
use crate::core::stats::SchedulerCounters;
use crate::core::{
    SchedulerError, SchedulerStats, Semaphore, Task, TaskId, TaskObserver, TaskOutcome,
    TracingObserver,
};

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No task in flight.
    Idle,
    /// A batch or pass is executing, or tasks admitted by `run` are in flight.
    Draining,
    /// `stop` was requested and no task is in flight.
    Stopped,
}

/// Outcomes of one batch or pass.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    /// Outcomes in dispatch (FIFO) order.
    pub outcomes: Vec<TaskOutcome>,
    /// Wall time of the pass.
    pub elapsed: Duration,
    /// Most tasks executing at once during the pass.
    pub peak_in_flight: usize,
}

impl PassReport {
    /// Number of tasks executed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether the pass executed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of tasks that succeeded.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    /// Number of tasks that failed or panicked.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Outcome of the first task with the given id.
    #[must_use]
    pub fn outcome(&self, id: TaskId) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }
}

/// Concurrent task scheduler with a hard cap on simultaneously running tasks.
///
/// Share it between producers and the drain thread with an `Arc`.
pub struct Scheduler {
    config: SchedulerConfig,
    /// Pending tasks; only ever touched under this lock.
    queue: Mutex<VecDeque<Task>>,
    /// Signaled on submission and stop, paired with `queue`.
    queue_ready: Condvar,
    /// Serializes drains so two drain callers never jointly exceed the limit.
    pass_lock: Mutex<()>,
    observer: Arc<dyn TaskObserver>,
    counters: SchedulerCounters,
    draining: AtomicBool,
    stopped: AtomicBool,
}

impl Scheduler {
    /// Create a scheduler with the given concurrency limit and default settings.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` if `limit` is zero.
    pub fn new(limit: usize) -> Result<Self, SchedulerError> {
        Self::with_config(SchedulerConfig::new(limit))
    }

    /// Create a scheduler from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` if the configuration is invalid.
    pub fn with_config(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;

        info!(
            limit = config.limit,
            drain_mode = ?config.drain_mode,
            idle_backoff_ms = config.idle_backoff_ms,
            "Scheduler initialized"
        );

        Ok(Self {
            config,
            queue: Mutex::new(VecDeque::new()),
            queue_ready: Condvar::new(),
            pass_lock: Mutex::new(()),
            observer: Arc::new(TracingObserver),
            counters: SchedulerCounters::default(),
            draining: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        })
    }

    /// Replace the task observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn TaskObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Concurrency limit.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.config.limit
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Number of tasks waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Append a task to the tail of the queue.
    ///
    /// Safe to call from any number of threads; append order is the lock's
    /// serialization order.
    pub fn add_task(&self, task: Task) {
        let task_id = task.id();
        let depth = {
            let mut queue = self.queue.lock();
            queue.push_back(task);
            queue.len()
        };
        self.counters.record_submit();
        self.queue_ready.notify_one();
        debug!(task_id = task_id, queue_depth = depth, "Task submitted");
    }

    /// Execute the current queue snapshot, at most `limit` tasks at a time.
    ///
    /// Each task acquires a semaphore permit in queue order and a new task
    /// starts as soon as a permit frees. Returns once every task of the
    /// snapshot has completed; an empty queue yields an empty report
    /// immediately.
    pub fn execute_tasks(&self) -> PassReport {
        let _pass = self.pass_lock.lock();
        let tasks: Vec<Task> = self.queue.lock().drain(..).collect();
        if tasks.is_empty() {
            return PassReport::default();
        }
        self.dispatch(tasks)
    }

    /// Run one bounded step in the configured mode.
    ///
    /// `Batched` takes the front `min(limit, len)` tasks; `Semaphore` runs a
    /// single pass over the whole queue snapshot. Returns `None` when the
    /// queue was empty.
    pub fn drain_once(&self) -> Option<PassReport> {
        let _pass = self.pass_lock.lock();
        let tasks: Vec<Task> = {
            let mut queue = self.queue.lock();
            let take = match self.config.drain_mode {
                DrainMode::Batched => queue.len().min(self.config.limit),
                DrainMode::Semaphore => queue.len(),
            };
            queue.drain(..take).collect()
        };
        if tasks.is_empty() {
            return None;
        }
        Some(self.dispatch(tasks))
    }

    /// Drain the queue until [`Scheduler::stop`] is called.
    ///
    /// `Batched` repeats [`Scheduler::drain_once`], so the batch in flight
    /// when stop is requested completes first. `Semaphore` keeps one set of
    /// `limit` permits for the whole loop and takes the queue front only once
    /// a permit is held, so a late submission starts as soon as any slot is
    /// free. After stop no new task is taken off the queue; tasks already
    /// running are joined before `run` returns and unstarted tasks stay queued.
    ///
    /// While the queue is empty the loop waits for a submission, the stop
    /// signal, or the configured idle backoff, whichever comes first.
    pub fn run(&self) {
        info!(
            limit = self.config.limit,
            drain_mode = ?self.config.drain_mode,
            "Scheduler drain loop started"
        );

        match self.config.drain_mode {
            DrainMode::Batched => {
                while !self.is_stop_requested() {
                    if self.drain_once().is_none() {
                        self.idle_wait();
                    }
                }
            }
            DrainMode::Semaphore => self.run_admission_loop(),
        }

        info!(
            pending = self.pending(),
            "Scheduler drain loop stopped"
        );
    }

    /// Ask the drain loop to exit before its next dispatch.
    ///
    /// Submission stays open; queued tasks remain and can still be drained.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("Stopping scheduler drain loop");
        // Take the lock so a drain loop between its empty check and its wait
        // cannot miss the notification.
        let _queue = self.queue.lock();
        self.queue_ready.notify_all();
    }

    /// Whether `stop` has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        if self.draining.load(Ordering::Acquire) || self.counters.in_flight() > 0 {
            SchedulerState::Draining
        } else if self.is_stop_requested() {
            SchedulerState::Stopped
        } else {
            SchedulerState::Idle
        }
    }

    /// Get current scheduler statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.counters.snapshot(self.config.limit, self.pending())
    }

    /// Continuous admission: permit first, then the queue front, then spawn.
    fn run_admission_loop(&self) {
        let _pass = self.pass_lock.lock();
        let semaphore = Semaphore::new(self.config.limit);

        thread::scope(|scope| loop {
            let permit = semaphore.acquire();
            let Some(task) = self.next_admitted() else {
                break;
            };
            let in_flight = self.counters.record_dispatch();
            debug!(
                task_id = task.id(),
                in_flight = in_flight,
                "Task dispatched"
            );

            scope.spawn(move || {
                let _permit = permit;
                let outcome = task.execute(self.observer.as_ref());
                self.counters.record_finish(&outcome);
            });
        });
    }

    /// Pop the queue front, waiting while the queue is empty.
    ///
    /// Returns `None` once stop is requested; the queue is left untouched.
    fn next_admitted(&self) -> Option<Task> {
        let mut queue = self.queue.lock();
        loop {
            if self.is_stop_requested() {
                return None;
            }
            if let Some(task) = queue.pop_front() {
                return Some(task);
            }
            let _ = self
                .queue_ready
                .wait_for(&mut queue, self.config.idle_backoff());
        }
    }

    fn idle_wait(&self) {
        let mut queue = self.queue.lock();
        if queue.is_empty() && !self.is_stop_requested() {
            let _ = self
                .queue_ready
                .wait_for(&mut queue, self.config.idle_backoff());
        }
    }

    /// Execute `tasks` in FIFO dispatch order under the semaphore and join them all.
    fn dispatch(&self, tasks: Vec<Task>) -> PassReport {
        let started = Instant::now();
        let total = tasks.len();
        let semaphore = Semaphore::new(self.config.limit);
        let (outcome_tx, outcome_rx) = unbounded::<(usize, TaskOutcome)>();
        let mut peak_in_flight = 0;

        self.draining.store(true, Ordering::Release);
        debug!(batch_size = total, limit = self.config.limit, "Dispatching tasks");

        thread::scope(|scope| {
            for (index, task) in tasks.into_iter().enumerate() {
                let permit = semaphore.acquire();
                let in_flight = self.counters.record_dispatch();
                peak_in_flight = peak_in_flight.max(in_flight);
                debug!(
                    task_id = task.id(),
                    in_flight = in_flight,
                    "Task dispatched"
                );

                let outcome_tx = outcome_tx.clone();
                scope.spawn(move || {
                    // Released last, after the in-flight count has dropped.
                    let _permit = permit;
                    let outcome = task.execute(self.observer.as_ref());
                    self.counters.record_finish(&outcome);
                    let _ = outcome_tx.send((index, outcome));
                });
            }
        });
        drop(outcome_tx);

        let mut indexed: Vec<(usize, TaskOutcome)> = outcome_rx.iter().collect();
        indexed.sort_unstable_by_key(|(index, _)| *index);
        let report = PassReport {
            outcomes: indexed.into_iter().map(|(_, outcome)| outcome).collect(),
            elapsed: started.elapsed(),
            peak_in_flight,
        };

        self.draining.store(false, Ordering::Release);
        info!(
            total = report.len(),
            failed = report.failed(),
            elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            in_flight = self.counters.in_flight(),
            "Pass complete"
        );
        report
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("pending", &self.pending())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NoopObserver, TaskError};
    use std::sync::atomic::AtomicUsize;

    fn quiet(limit: usize) -> Scheduler {
        Scheduler::new(limit)
            .unwrap()
            .with_observer(Arc::new(NoopObserver))
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(matches!(
            Scheduler::new(0),
            Err(SchedulerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_add_task_preserves_fifo() {
        let scheduler = quiet(1);
        for id in 0..5 {
            scheduler.add_task(Task::new(id, format!("t{id}"), || Ok::<(), String>(())));
        }
        assert_eq!(scheduler.pending(), 5);

        let report = scheduler.execute_tasks();
        let ids: Vec<_> = report.outcomes.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_execute_tasks_empty_queue() {
        let scheduler = quiet(2);
        for _ in 0..3 {
            assert!(scheduler.execute_tasks().is_empty());
        }
        assert!(scheduler.drain_once().is_none());
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_batched_drain_once_takes_limit() {
        let scheduler = Scheduler::with_config(
            SchedulerConfig::new(2).with_drain_mode(DrainMode::Batched),
        )
        .unwrap()
        .with_observer(Arc::new(NoopObserver));
        for id in 0..5 {
            scheduler.add_task(Task::new(id, "t", || Ok::<(), String>(())));
        }

        assert_eq!(scheduler.drain_once().map(|r| r.len()), Some(2));
        assert_eq!(scheduler.pending(), 3);
        assert_eq!(scheduler.drain_once().map(|r| r.len()), Some(2));
        assert_eq!(scheduler.drain_once().map(|r| r.len()), Some(1));
        assert!(scheduler.drain_once().is_none());
    }

    #[test]
    fn test_semaphore_drain_once_takes_all() {
        let scheduler = quiet(2);
        for id in 0..5 {
            scheduler.add_task(Task::new(id, "t", || Ok::<(), String>(())));
        }
        let report = scheduler.drain_once().unwrap();
        assert_eq!(report.len(), 5);
        assert!(report.peak_in_flight <= 2);
    }

    #[test]
    fn test_failures_do_not_halt_pass() {
        let scheduler = quiet(2);
        scheduler.add_task(Task::new(1, "fails", || Err::<(), _>("boom")));
        scheduler.add_task(Task::new(2, "panics", || -> Result<(), String> {
            panic!("bad state")
        }));
        scheduler.add_task(Task::new(3, "ok", || Ok::<(), String>(())));

        let report = scheduler.execute_tasks();
        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 2);
        assert_eq!(
            report.outcome(1).unwrap().result,
            Err(TaskError::Failed("boom".into()))
        );
        assert!(report.outcome(2).unwrap().result.as_ref().unwrap_err().is_panic());

        let stats = scheduler.stats();
        assert_eq!(stats.failed_tasks, 1);
        assert_eq!(stats.panicked_tasks, 1);
        assert_eq!(stats.succeeded_tasks, 1);
        assert_eq!(stats.in_flight, 0);
    }

    #[test]
    fn test_panicking_error_callback_does_not_halt_pass() {
        let scheduler = quiet(2);
        scheduler.add_task(
            Task::builder(1)
                .name("fails")
                .work(|| Err::<(), _>("disk full"))
                .on_error(|_| panic!("callback bug"))
                .build()
                .unwrap(),
        );
        for id in 2..=4 {
            scheduler.add_task(Task::new(id, "ok", || Ok::<(), String>(())));
        }

        let report = scheduler.execute_tasks();
        assert_eq!(report.len(), 4);
        assert_eq!(
            report.outcome(1).unwrap().result,
            Err(TaskError::Failed("disk full".into()))
        );
        assert_eq!(report.succeeded(), 3);
        assert_eq!(scheduler.stats().in_flight, 0);
    }

    #[test]
    fn test_stop_before_run_returns() {
        let scheduler = quiet(1);
        scheduler.stop();
        scheduler.run();
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[test]
    fn test_state_draining_during_pass() {
        let scheduler = Arc::new(quiet(1));
        let seen = Arc::new(AtomicUsize::new(0));

        let probe = Arc::clone(&scheduler);
        let flag = Arc::clone(&seen);
        scheduler.add_task(Task::new(1, "probe", move || {
            if probe.state() == SchedulerState::Draining {
                flag.fetch_add(1, Ordering::SeqCst);
            }
            Ok::<(), String>(())
        }));

        let report = scheduler.execute_tasks();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }
}
