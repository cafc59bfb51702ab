//! Builder for tasks with optional parts.

use crate::core::{ErrorCallback, SchedulerError, Task, TaskError, TaskId, Work};

/// Builds a [`Task`], rejecting one without work.
///
/// ```rust,ignore
/// let task = TaskBuilder::new(7)
///     .name("reindex")
///     .work(|| reindex())
///     .on_error(|err| eprintln!("reindex failed: {err}"))
///     .build()?;
/// ```
pub struct TaskBuilder {
    id: TaskId,
    name: Option<String>,
    work: Option<Box<dyn Work>>,
    on_error: Option<ErrorCallback>,
}

impl TaskBuilder {
    /// Start a builder for the given task id.
    #[must_use]
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            name: None,
            work: None,
            on_error: None,
        }
    }

    /// Display name. Defaults to `task-<id>`.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Work to run.
    #[must_use]
    pub fn work<W: Work>(mut self, work: W) -> Self {
        self.work = Some(Box::new(work));
        self
    }

    /// Already-boxed work, e.g. chosen at runtime.
    #[must_use]
    pub fn boxed_work(mut self, work: Option<Box<dyn Work>>) -> Self {
        self.work = work;
        self
    }

    /// Callback invoked with the error when the task fails or panics.
    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TaskError) + Send + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Finish the task.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::MissingWork` when no work was attached.
    pub fn build(self) -> Result<Task, SchedulerError> {
        let work = self.work.ok_or(SchedulerError::MissingWork { id: self.id })?;
        let name = self.name.unwrap_or_else(|| format!("task-{}", self.id));
        Ok(Task::from_parts(self.id, name, work, self.on_error))
    }
}
