//! Builder to construct a scheduler from configuration.

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::core::{Scheduler, SchedulerError, TaskObserver};

/// Build a scheduler from configuration, attaching `observer` when given.
///
/// Without an observer the scheduler reports task events through `tracing`.
///
/// # Errors
///
/// Returns `SchedulerError::InvalidConfig` if the configuration is invalid.
pub fn build_scheduler(
    cfg: &SchedulerConfig,
    observer: Option<Arc<dyn TaskObserver>>,
) -> Result<Scheduler, SchedulerError> {
    let scheduler = Scheduler::with_config(cfg.clone())?;
    Ok(match observer {
        Some(observer) => scheduler.with_observer(observer),
        None => scheduler,
    })
}
