//! Pool configuration
//!
//! The per-task timeout is always explicit: there is no `Default` for
//! `PoolConfig`. The presets name their timeouts so callers can see which one
//! they picked.

use crate::errors::{PoolError, Result};
use std::time::Duration;

/// How the task source behaves when the work queue is full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnqueueMode {
    /// Wait for a worker to free a slot
    #[default]
    Blocking,
    /// Reject the target; it is reported as a `Rejected` failure
    NonBlocking,
}

impl std::str::FromStr for EnqueueMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blocking" | "" => Ok(EnqueueMode::Blocking),
            "non-blocking" | "nonblocking" | "non_blocking" => Ok(EnqueueMode::NonBlocking),
            _ => Err(format!("unknown enqueue mode '{}', use 'blocking' or 'non-blocking'", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub worker_count: usize,
    pub per_task_timeout: Duration,
    /// Result channel capacity; 0 is treated as 1
    pub result_buffer_size: usize,
    pub queue_capacity: usize,
    pub enqueue_mode: EnqueueMode,
}

impl PoolConfig {
    pub fn new(worker_count: usize, per_task_timeout: Duration) -> Self {
        Self {
            worker_count,
            per_task_timeout,
            result_buffer_size: worker_count,
            queue_capacity: worker_count.max(1),
            enqueue_mode: EnqueueMode::Blocking,
        }
    }

    /// TCP connect checks: many workers, short deadline
    pub fn tcp_reachability() -> Self {
        Self::new(100, Duration::from_millis(500))
    }

    /// HTTP health checks: few workers, longer deadline
    pub fn http_health() -> Self {
        Self::new(5, Duration::from_secs(3))
    }

    pub fn with_result_buffer(mut self, size: usize) -> Self {
        self.result_buffer_size = size;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_enqueue_mode(mut self, mode: EnqueueMode) -> Self {
        self.enqueue_mode = mode;
        self
    }

    /// Create configuration from environment variables
    ///
    /// `PROBE_TIMEOUT_MS` is required. `PROBE_WORKERS` defaults to twice the
    /// CPU count, buffer and queue sizes default to the worker count.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let worker_count = parse_var(&lookup, "PROBE_WORKERS")?.unwrap_or_else(|| num_cpus::get() * 2);
        let timeout_ms: u64 = parse_var(&lookup, "PROBE_TIMEOUT_MS")?.ok_or(PoolError::Env {
            var: "PROBE_TIMEOUT_MS",
            reason: "not set; the per-task timeout must be explicit".into(),
        })?;
        let result_buffer_size = parse_var(&lookup, "PROBE_RESULT_BUFFER")?.unwrap_or(worker_count);
        let queue_capacity = parse_var(&lookup, "PROBE_QUEUE_CAPACITY")?.unwrap_or(worker_count.max(1));
        let enqueue_mode = match lookup("PROBE_ENQUEUE_MODE") {
            Some(raw) => raw.parse().map_err(|reason| PoolError::Env {
                var: "PROBE_ENQUEUE_MODE",
                reason,
            })?,
            None => EnqueueMode::Blocking,
        };

        let config = Self {
            worker_count,
            per_task_timeout: Duration::from_millis(timeout_ms),
            result_buffer_size,
            queue_capacity,
            enqueue_mode,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(PoolError::InvalidConfig {
                field: "worker_count",
                reason: "must be at least 1".into(),
            });
        }
        if self.per_task_timeout.is_zero() {
            return Err(PoolError::InvalidConfig {
                field: "per_task_timeout",
                reason: "must be greater than zero".into(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::InvalidConfig {
                field: "queue_capacity",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Capacity handed to the bounded result channel
    #[inline]
    pub(crate) fn result_capacity(&self) -> usize {
        self.result_buffer_size.max(1)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| PoolError::Env {
                var,
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}
