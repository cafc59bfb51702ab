//! Builders to construct tasks and schedulers.

pub mod scheduler_builder;
pub mod task_builder;

pub use scheduler_builder::build_scheduler;
pub use task_builder::TaskBuilder;
