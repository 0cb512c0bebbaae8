use super::{
    errors::ProbeError,
    result::{ProbeResult, ProbeSuccess},
};
use std::{fmt, sync::Arc, time::Duration};

/// One address to probe: a URL or `host:port`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(Arc<str>);

impl Target {
    pub fn new(addr: impl Into<Arc<str>>) -> Self {
        Self(addr.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_http(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Result of probing one target. Exactly one per enqueued target.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub target: Target,
    /// Worker that produced the outcome; `None` when the target never reached a worker
    pub worker: Option<usize>,
    pub elapsed: Duration,
    pub result: ProbeResult,
}

impl ProbeOutcome {
    pub fn new(target: Target, worker: Option<usize>, elapsed: Duration, result: ProbeResult) -> Self {
        Self {
            target,
            worker,
            elapsed,
            result,
        }
    }

    pub(crate) fn rejected(target: Target) -> Self {
        Self::new(target, None, Duration::ZERO, Err(ProbeError::Rejected))
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Counted as "up" by the sink: success with status 200 (or no status)
    #[inline]
    pub fn is_up(&self) -> bool {
        self.result.as_ref().is_ok_and(ProbeSuccess::is_healthy)
    }

    pub fn status(&self) -> Option<u16> {
        self.result.as_ref().ok().and_then(|s| s.status)
    }

    pub fn error(&self) -> Option<&ProbeError> {
        self.result.as_ref().err()
    }
}

/// Lifecycle of a pool. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum PoolState {
    Idle = 0,
    Running = 1,
    Draining = 2,
    Closed = 3,
}

impl PoolState {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => PoolState::Idle,
            1 => PoolState::Running,
            2 => PoolState::Draining,
            _ => PoolState::Closed,
        }
    }
}

/// Running up/down count kept by the sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub up: usize,
    pub down: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: &ProbeOutcome) {
        if outcome.is_up() {
            self.up += 1;
        } else {
            self.down += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.up + self.down
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} up, {} down", self.up, self.down)
    }
}

#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub workers: usize,
    pub idle_workers: usize,
    pub queued_targets: usize,
    pub in_flight: usize,
    pub completed: usize,
    pub failed: usize,
}

impl PoolMetrics {
    pub fn utilization(&self) -> f64 {
        if self.workers == 0 {
            return 0.0;
        }
        self.in_flight as f64 / self.workers as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed + self.failed;
        if total == 0 {
            return 1.0;
        }
        self.completed as f64 / total as f64
    }
}

/// Summary returned by the supervisor once the result channel is closed
#[derive(Debug, Clone, Default)]
pub struct PoolReport {
    pub workers_joined: usize,
    pub enqueued: usize,
    pub rejected: usize,
    /// Join errors of workers that died abnormally
    pub worker_failures: Vec<String>,
}
