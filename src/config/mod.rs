//! Configuration models for the scheduler.

pub mod scheduler;

pub use scheduler::{DrainMode, SchedulerConfig, DEFAULT_IDLE_BACKOFF_MS};
