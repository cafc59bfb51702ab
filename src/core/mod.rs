//! Core scheduling abstractions: tasks, admission control and the scheduler.

pub mod error;
pub mod observer;
pub mod scheduler;
pub mod semaphore;
pub mod stats;
pub mod task;

pub use error::{AppResult, SchedulerError, TaskError};
pub(crate) use observer::notify_observer;
pub use observer::{
    EventLevel, InMemoryObserver, NoopObserver, TaskEvent, TaskEventKind, TaskObserver,
    TracingObserver,
};
pub use scheduler::{PassReport, Scheduler, SchedulerState};
pub use semaphore::{Semaphore, SemaphorePermit};
pub use stats::SchedulerStats;
pub use task::{ErrorCallback, Task, TaskId, TaskOutcome, Work};
