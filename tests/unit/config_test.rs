//! Tests for configuration validation

use prometheus_task_scheduler::config::{DrainMode, SchedulerConfig, DEFAULT_IDLE_BACKOFF_MS};
use prometheus_task_scheduler::core::{Scheduler, SchedulerError};

#[test]
fn test_scheduler_config_validation() {
    let valid = SchedulerConfig {
        limit: 4,
        drain_mode: DrainMode::Semaphore,
        idle_backoff_ms: 100,
    };
    assert!(valid.validate().is_ok());
}

#[test]
fn test_scheduler_config_invalid_limit() {
    let invalid = SchedulerConfig {
        limit: 0,
        drain_mode: DrainMode::Batched,
        idle_backoff_ms: 100,
    };
    assert!(invalid.validate().is_err());
    assert!(matches!(
        Scheduler::with_config(invalid),
        Err(SchedulerError::InvalidConfig(_))
    ));
}

#[test]
fn test_scheduler_config_invalid_backoff() {
    let invalid = SchedulerConfig {
        limit: 2,
        drain_mode: DrainMode::Batched,
        idle_backoff_ms: 0,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "limit": 8,
        "drain_mode": "batched",
        "idle_backoff_ms": 250
    }"#;

    let config = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(config.limit, 8);
    assert_eq!(config.drain_mode, DrainMode::Batched);
    assert_eq!(config.idle_backoff_ms, 250);
}

#[test]
fn test_scheduler_config_from_json_defaults() {
    let config = SchedulerConfig::from_json_str(r#"{ "limit": 3 }"#).unwrap();
    assert_eq!(config.drain_mode, DrainMode::Semaphore);
    assert_eq!(config.idle_backoff_ms, DEFAULT_IDLE_BACKOFF_MS);
}

#[test]
fn test_scheduler_config_from_json_rejects_negative_limit() {
    let err = SchedulerConfig::from_json_str(r#"{ "limit": -1 }"#).unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_scheduler_config_from_json_rejects_zero_limit() {
    let err = SchedulerConfig::from_json_str(r#"{ "limit": 0 }"#).unwrap_err();
    assert_eq!(err, "limit must be greater than 0");
}

#[test]
fn test_scheduler_config_from_lookup_empty_uses_defaults() {
    let config = SchedulerConfig::from_lookup(|_| None).unwrap();
    assert_eq!(config, SchedulerConfig::default());
}
