//! Scheduler statistics backed by lock-free atomic counters.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::core::{TaskError, TaskOutcome};

/// Snapshot of scheduler utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Configured concurrency limit.
    pub limit: usize,
    /// Tasks waiting in the queue.
    pub queued_tasks: usize,
    /// Tasks currently executing.
    pub in_flight: usize,
    /// Highest number of tasks ever executing at once.
    pub peak_in_flight: usize,
    /// Total tasks submitted.
    pub submitted_tasks: u64,
    /// Total tasks handed to an execution thread.
    pub dispatched_tasks: u64,
    /// Total tasks that returned `Ok`.
    pub succeeded_tasks: u64,
    /// Total tasks that returned an error.
    pub failed_tasks: u64,
    /// Total tasks that panicked.
    pub panicked_tasks: u64,
}

impl SchedulerStats {
    /// Tasks that finished, whatever the outcome.
    #[must_use]
    pub const fn completed_tasks(&self) -> u64 {
        self.succeeded_tasks + self.failed_tasks + self.panicked_tasks
    }
}

/// Internal counters for scheduler statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct SchedulerCounters {
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    submitted: AtomicU64,
    dispatched: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
}

impl SchedulerCounters {
    pub fn record_submit(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark one task as dispatched; returns the in-flight count including it.
    pub fn record_dispatch(&self) -> usize {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::AcqRel);
        now
    }

    pub fn record_finish(&self, outcome: &TaskOutcome) {
        match &outcome.result {
            Ok(()) => self.succeeded.fetch_add(1, Ordering::Relaxed),
            Err(TaskError::Failed(_)) => self.failed.fetch_add(1, Ordering::Relaxed),
            Err(TaskError::Panicked(_)) => self.panicked.fetch_add(1, Ordering::Relaxed),
        };
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, limit: usize, queued_tasks: usize) -> SchedulerStats {
        SchedulerStats {
            limit,
            queued_tasks,
            in_flight: self.in_flight.load(Ordering::Acquire),
            peak_in_flight: self.peak_in_flight.load(Ordering::Acquire),
            submitted_tasks: self.submitted.load(Ordering::Relaxed),
            dispatched_tasks: self.dispatched.load(Ordering::Relaxed),
            succeeded_tasks: self.succeeded.load(Ordering::Relaxed),
            failed_tasks: self.failed.load(Ordering::Relaxed),
            panicked_tasks: self.panicked.load(Ordering::Relaxed),
        }
    }
}
