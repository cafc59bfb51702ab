//! Scheduler configuration structures.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Idle wait between empty-queue checks of the drain loop.
pub const DEFAULT_IDLE_BACKOFF_MS: u64 = 1000;

const ENV_LIMIT: &str = "TASK_SCHEDULER_LIMIT";
const ENV_DRAIN_MODE: &str = "TASK_SCHEDULER_DRAIN_MODE";
const ENV_IDLE_BACKOFF_MS: &str = "TASK_SCHEDULER_IDLE_BACKOFF_MS";

/// How the drain loop takes work off the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainMode {
    /// Take the front `min(limit, len)` tasks, run them all, wait for the
    /// whole batch before taking the next one.
    Batched,
    /// Admit tasks through a counting semaphore of `limit` permits; the
    /// queue front starts as soon as a slot frees.
    #[default]
    Semaphore,
}

impl std::str::FromStr for DrainMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batched" => Ok(Self::Batched),
            "semaphore" => Ok(Self::Semaphore),
            other => Err(format!("unknown drain mode `{other}`")),
        }
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of tasks executing at once.
    pub limit: usize,
    /// Drain strategy used by `run` and `drain_once`.
    #[serde(default)]
    pub drain_mode: DrainMode,
    /// Idle wait of the drain loop while the queue is empty, in milliseconds.
    #[serde(default = "default_idle_backoff_ms")]
    pub idle_backoff_ms: u64,
}

const fn default_idle_backoff_ms() -> u64 {
    DEFAULT_IDLE_BACKOFF_MS
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            limit: num_cpus::get(),
            drain_mode: DrainMode::default(),
            idle_backoff_ms: DEFAULT_IDLE_BACKOFF_MS,
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration with the given limit and default settings otherwise.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Set the concurrency limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the drain strategy.
    #[must_use]
    pub const fn with_drain_mode(mut self, drain_mode: DrainMode) -> Self {
        self.drain_mode = drain_mode;
        self
    }

    /// Set the idle backoff of the drain loop.
    ///
    /// The value is stored in whole milliseconds, rounded up, so any non-zero
    /// duration stays non-zero.
    #[must_use]
    pub fn with_idle_backoff(mut self, backoff: Duration) -> Self {
        let millis = backoff.as_nanos().div_ceil(1_000_000);
        self.idle_backoff_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    /// Idle backoff as a `Duration`.
    #[must_use]
    pub const fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.limit == 0 {
            return Err("limit must be greater than 0".into());
        }
        if self.idle_backoff_ms == 0 {
            return Err("idle_backoff_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment, reading `.env` first.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails when a variable cannot be parsed or the result does not validate.
    pub fn from_env() -> AppResult<Self> {
        // A missing .env file is fine; real environment variables still apply.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup using the
    /// `TASK_SCHEDULER_*` variable names.
    ///
    /// # Errors
    ///
    /// Fails when a value cannot be parsed or the result does not validate.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_LIMIT) {
            cfg.limit = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_LIMIT} must be a positive integer, got `{raw}`"))?;
        }
        if let Some(raw) = lookup(ENV_DRAIN_MODE) {
            cfg.drain_mode = raw
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid {ENV_DRAIN_MODE}"))?;
        }
        if let Some(raw) = lookup(ENV_IDLE_BACKOFF_MS) {
            cfg.idle_backoff_ms = raw.trim().parse().with_context(|| {
                format!("{ENV_IDLE_BACKOFF_MS} must be a positive integer, got `{raw}`")
            })?;
        }
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}
