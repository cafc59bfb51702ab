//! Task lifecycle observers.
//!
//! The scheduler notifies an injected [`TaskObserver`] when a task starts and
//! when it completes. Notifications are best-effort: a panicking observer is
//! contained and never affects task execution.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{TaskError, TaskId};

/// Severity of a task event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    /// Routine lifecycle detail.
    Debug,
    /// Notable but expected.
    Info,
    /// Task failure.
    Error,
}

/// Lifecycle point the event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEventKind {
    /// Execution is about to start.
    Started,
    /// Execution finished with an outcome.
    Completed,
}

/// Structured task lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    /// Event identifier.
    pub event_id: Uuid,
    /// Severity.
    pub level: EventLevel,
    /// Lifecycle point.
    pub kind: TaskEventKind,
    /// Related task identifier.
    pub task_id: TaskId,
    /// Related task name.
    pub task_name: String,
    /// Human-readable message.
    pub message: String,
    /// Outcome, present on completion events only.
    pub outcome: Option<Result<(), TaskError>>,
}

impl TaskEvent {
    /// Build a "started" event.
    #[must_use]
    pub fn started(task_id: TaskId, task_name: &str) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            level: EventLevel::Debug,
            kind: TaskEventKind::Started,
            task_id,
            task_name: task_name.to_string(),
            message: format!("executing task: {task_name}"),
            outcome: None,
        }
    }

    /// Build a "completed" event carrying the outcome.
    #[must_use]
    pub fn completed(task_id: TaskId, task_name: &str, outcome: &Result<(), TaskError>) -> Self {
        let (level, message) = match outcome {
            Ok(()) => (
                EventLevel::Debug,
                format!("task execution completed: {task_name}"),
            ),
            Err(err) => (
                EventLevel::Error,
                format!("error executing task {task_name}: {err}"),
            ),
        };
        Self {
            event_id: Uuid::new_v4(),
            level,
            kind: TaskEventKind::Completed,
            task_id,
            task_name: task_name.to_string(),
            message,
            outcome: Some(outcome.clone()),
        }
    }
}

/// Sink for task lifecycle events.
pub trait TaskObserver: Send + Sync {
    /// Receive one event.
    fn notify(&self, event: &TaskEvent);
}

/// Deliver an event, containing any panic raised by the observer.
pub(crate) fn notify_observer(observer: &dyn TaskObserver, event: &TaskEvent) {
    if panic::catch_unwind(AssertUnwindSafe(|| observer.notify(event))).is_err() {
        tracing::warn!(
            task_id = event.task_id,
            kind = ?event.kind,
            "task observer panicked; event dropped"
        );
    }
}

/// Observer forwarding events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TaskObserver for TracingObserver {
    fn notify(&self, event: &TaskEvent) {
        match event.level {
            EventLevel::Debug => tracing::debug!(
                task_id = event.task_id,
                task_name = %event.task_name,
                "{}",
                event.message
            ),
            EventLevel::Info => tracing::info!(
                task_id = event.task_id,
                task_name = %event.task_name,
                "{}",
                event.message
            ),
            EventLevel::Error => tracing::error!(
                task_id = event.task_id,
                task_name = %event.task_name,
                "{}",
                event.message
            ),
        }
    }
}

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl TaskObserver for NoopObserver {
    fn notify(&self, _event: &TaskEvent) {}
}

/// In-memory observer with a bounded buffer, for testing and dev.
#[derive(Debug)]
pub struct InMemoryObserver {
    events: Mutex<VecDeque<TaskEvent>>,
    max_events: usize,
}

impl InMemoryObserver {
    /// Create an observer keeping at most `max_events` events (oldest dropped first).
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Snapshot of stored events in arrival order.
    #[must_use]
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Stored events for one task.
    #[must_use]
    pub fn events_for(&self, task_id: TaskId) -> Vec<TaskEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.task_id == task_id)
            .cloned()
            .collect()
    }
}

impl TaskObserver for InMemoryObserver {
    fn notify(&self, event: &TaskEvent) {
        let mut events = self.events.lock();
        if self.max_events == 0 {
            return;
        }
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}
