//! Task record and the single-task execution boundary.
//!
//! A [`Task`] is built fully formed, owned by the scheduler queue until it is
//! dispatched, then consumed by exactly one call to [`Task::execute`].

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crate::builders::TaskBuilder;
use crate::core::{notify_observer, TaskError, TaskEvent, TaskObserver};

/// Task identifier. Uniqueness is the submitter's responsibility.
pub type TaskId = u64;

/// Unit of work carried by a [`Task`].
///
/// Implemented for every `FnOnce() -> Result<(), E>` closure whose error
/// implements `Display`, so most callers never implement it by hand.
pub trait Work: Send + 'static {
    /// Run the work once, returning the failure reason on error.
    ///
    /// # Errors
    ///
    /// Returns the reason reported by the underlying operation.
    fn run(self: Box<Self>) -> Result<(), String>;
}

impl<F, E> Work for F
where
    F: FnOnce() -> Result<(), E> + Send + 'static,
    E: fmt::Display,
{
    fn run(self: Box<Self>) -> Result<(), String> {
        (*self)().map_err(|e| e.to_string())
    }
}

/// Callback invoked with the error of a failed task.
pub type ErrorCallback = Box<dyn Fn(&TaskError) + Send + 'static>;

/// An immutable unit of work with identity, display name and callable.
pub struct Task {
    id: TaskId,
    name: String,
    work: Box<dyn Work>,
    on_error: Option<ErrorCallback>,
}

impl Task {
    /// Create a task from an id, a display name and its work.
    pub fn new<W: Work>(id: TaskId, name: impl Into<String>, work: W) -> Self {
        Self::from_parts(id, name.into(), Box::new(work), None)
    }

    /// Start building a task with optional parts (error callback, boxed work).
    #[must_use]
    pub fn builder(id: TaskId) -> TaskBuilder {
        TaskBuilder::new(id)
    }

    pub(crate) fn from_parts(
        id: TaskId,
        name: String,
        work: Box<dyn Work>,
        on_error: Option<ErrorCallback>,
    ) -> Self {
        Self {
            id,
            name,
            work,
            on_error,
        }
    }

    /// Task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the work exactly once on the calling thread and report the outcome.
    ///
    /// Panics raised by the work are caught here and turned into
    /// [`TaskError::Panicked`]. The observer receives a started event before
    /// the call and a completed event after it.
    pub fn execute(self, observer: &dyn TaskObserver) -> TaskOutcome {
        let Self {
            id,
            name,
            work,
            on_error,
        } = self;

        notify_observer(observer, &TaskEvent::started(id, &name));

        let started_at = Instant::now();
        let result = match panic::catch_unwind(AssertUnwindSafe(move || work.run())) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(TaskError::Failed(reason)),
            Err(payload) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
        };
        let finished_at = Instant::now();

        if let (Err(err), Some(callback)) = (&result, on_error.as_ref()) {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(err))).is_err() {
                tracing::warn!(task_id = id, "task error callback panicked");
            }
        }

        notify_observer(observer, &TaskEvent::completed(id, &name, &result));

        TaskOutcome {
            id,
            name,
            result,
            started_at,
            finished_at,
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("has_error_callback", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

/// Outcome of one task execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Task identifier.
    pub id: TaskId,
    /// Task display name.
    pub name: String,
    /// `Ok` on success, the failure otherwise.
    pub result: Result<(), TaskError>,
    /// When the work was invoked.
    pub started_at: Instant,
    /// When the work returned (or panicked).
    pub finished_at: Instant,
}

impl TaskOutcome {
    /// Whether the task succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Time spent inside the work callable.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.finished_at.saturating_duration_since(self.started_at)
    }
}

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
