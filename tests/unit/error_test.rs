//! Tests for error types

use prometheus_task_scheduler::core::{SchedulerError, TaskError};

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("limit must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: limit must be greater than 0"
    );
}

#[test]
fn test_missing_work_error() {
    let err = SchedulerError::MissingWork { id: 42 };
    assert_eq!(format!("{}", err), "task 42 has no work attached");
}

#[test]
fn test_task_failed_error() {
    let err = TaskError::Failed("boom".to_string());
    assert_eq!(format!("{}", err), "task failed: boom");
    assert_eq!(err.reason(), "boom");
}

#[test]
fn test_task_panicked_error() {
    let err = TaskError::Panicked("attempt to divide by zero".to_string());
    assert_eq!(format!("{}", err), "task panicked: attempt to divide by zero");
    assert!(err.is_panic());
}
