//! Tests for task and scheduler builders

use std::sync::Arc;

use prometheus_task_scheduler::builders::{build_scheduler, TaskBuilder};
use prometheus_task_scheduler::config::SchedulerConfig;
use prometheus_task_scheduler::core::{NoopObserver, SchedulerError, Task, TaskObserver};

#[test]
fn test_task_builder_requires_work() {
    let result = Task::builder(3).name("no-op").build();
    assert!(matches!(result, Err(SchedulerError::MissingWork { id: 3 })));
}

#[test]
fn test_task_builder_builds() {
    let task = TaskBuilder::new(11)
        .name("compact")
        .work(|| Ok::<(), String>(()))
        .build()
        .unwrap();
    assert_eq!(task.id(), 11);
    assert_eq!(task.name(), "compact");
}

#[test]
fn test_build_scheduler_from_config() {
    let observer: Arc<dyn TaskObserver> = Arc::new(NoopObserver);
    let scheduler = build_scheduler(&SchedulerConfig::new(5), Some(observer)).unwrap();
    assert_eq!(scheduler.limit(), 5);
    assert_eq!(scheduler.stats().limit, 5);
}

#[test]
fn test_build_scheduler_without_observer() {
    let scheduler = build_scheduler(&SchedulerConfig::new(1), None).unwrap();
    scheduler.add_task(Task::new(1, "traced", || Ok::<(), String>(())));
    assert_eq!(scheduler.execute_tasks().succeeded(), 1);
}
