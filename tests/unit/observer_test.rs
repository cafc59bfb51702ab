//! Tests for task observers

use prometheus_task_scheduler::core::{
    EventLevel, InMemoryObserver, Task, TaskError, TaskEventKind, TaskObserver, TracingObserver,
};

#[test]
fn test_observer_receives_failure_event() {
    let observer = InMemoryObserver::new(8);
    let outcome = Task::new(1, "flaky", || Err::<(), _>("timeout talking to gpu")).execute(&observer);
    assert!(!outcome.is_ok());

    let events = observer.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, TaskEventKind::Started);
    assert_eq!(events[0].level, EventLevel::Debug);
    assert_eq!(events[1].kind, TaskEventKind::Completed);
    assert_eq!(events[1].level, EventLevel::Error);
    assert_eq!(
        events[1].outcome,
        Some(Err(TaskError::Failed("timeout talking to gpu".into())))
    );
    assert!(events[1].message.contains("flaky"));
}

#[test]
fn test_tracing_observer_accepts_events() {
    let observer = TracingObserver;
    let outcome = Task::new(2, "traced", || Ok::<(), String>(())).execute(&observer);
    assert!(outcome.is_ok());
    observer.notify(&prometheus_task_scheduler::core::TaskEvent::started(3, "direct"));
}
