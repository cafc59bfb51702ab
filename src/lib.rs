//! # Prometheus Task Scheduler
//!
//! A bounded-concurrency task scheduler for the Prometheus AI Platform.
//!
//! Callers register discrete units of work (tasks) and the scheduler runs them
//! in parallel on OS threads, never more than a configured limit at a time.
//! Producers submit from any thread; a single drain thread empties the queue.
//!
//! ## Key Features
//!
//! - **Hard concurrency ceiling**: at most `limit` tasks execute at any instant
//! - **FIFO admission**: tasks are dispatched in submission order
//! - **Two drain strategies**: fixed-size batches, or a counting semaphore
//!   that starts the next task the moment a slot frees
//! - **Fault isolation**: a failing or panicking task only affects its own outcome
//! - **Injected observer**: task lifecycle events go to a pluggable sink
//!   (`tracing` by default), never to process-wide state
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prometheus_task_scheduler::core::{Scheduler, Task};
//!
//! let scheduler = Arc::new(Scheduler::new(4)?);
//!
//! for id in 0..16 {
//!     scheduler.add_task(Task::new(id, format!("job-{id}"), move || {
//!         do_work(id)
//!     }));
//! }
//!
//! // One bounded pass over everything queued so far
//! let report = scheduler.execute_tasks();
//! assert_eq!(report.len(), 16);
//!
//! // Or keep draining on a dedicated thread until stopped
//! let drain = {
//!     let scheduler = Arc::clone(&scheduler);
//!     std::thread::spawn(move || scheduler.run())
//! };
//! scheduler.stop();
//! drain.join().unwrap();
//! ```
//!
//! For complete examples, see `tests/scheduler_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: tasks, admission control and the scheduler.
pub mod core;
/// Configuration models for the scheduler.
pub mod config;
/// Builders to construct tasks and schedulers.
pub mod builders;
/// Shared utilities.
pub mod util;
