//! Per-target deadline scope
//!
//! Each probe runs inside a `DeadlineScope`: a fixed instant plus a
//! cancellation token. The token is cancelled when the scope is dropped, on
//! every exit path, so anything the probe spawned off the deadline is torn
//! down with it. Scopes are independent; one expiring never touches another.

use super::{errors::ProbeError, result::ProbeResult};
use std::{future::Future, time::Duration};
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Deadline handed to a probe
#[derive(Debug, Clone)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
    token: CancellationToken,
}

impl Deadline {
    #[inline]
    pub fn at(&self) -> Instant {
        self.at
    }

    /// Full time budget the scope was opened with
    #[inline]
    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Cancelled when the owning scope closes
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Resolves when the deadline passes or the scope closes
    pub async fn expired(&self) {
        tokio::select! {
            _ = tokio::time::sleep_until(self.at) => {}
            _ = self.token.cancelled() => {}
        }
    }

    pub fn timeout_error(&self) -> ProbeError {
        ProbeError::Timeout { after: self.budget }
    }
}

pub struct DeadlineScope {
    deadline: Deadline,
    started: Instant,
    _guard: DropGuard,
}

impl DeadlineScope {
    pub fn open(budget: Duration) -> Self {
        let started = Instant::now();
        let token = CancellationToken::new();
        let guard = token.clone().drop_guard();
        Self {
            deadline: Deadline {
                at: started + budget,
                budget,
                token,
            },
            started,
            _guard: guard,
        }
    }

    pub fn deadline(&self) -> Deadline {
        self.deadline.clone()
    }

    /// Drive `fut` until it finishes or the deadline passes, then close the scope.
    /// Returns the elapsed time together with the result.
    pub async fn run<F>(self, fut: F) -> (Duration, ProbeResult)
    where
        F: Future<Output = ProbeResult>,
    {
        let result = match tokio::time::timeout_at(self.deadline.at, fut).await {
            Ok(result) => result,
            Err(_) => Err(self.deadline.timeout_error()),
        };
        (self.started.elapsed(), result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ProbeSuccess;

    #[tokio::test(start_paused = true)]
    async fn test_slow_future_times_out_at_deadline() {
        let scope = DeadlineScope::open(Duration::from_millis(300));
        let (elapsed, result) = scope
            .run(async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(ProbeSuccess::reachable())
            })
            .await;

        assert_eq!(
            result,
            Err(ProbeError::Timeout {
                after: Duration::from_millis(300)
            })
        );
        assert_eq!(elapsed, Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_cancelled_when_scope_closes() {
        let scope = DeadlineScope::open(Duration::from_secs(5));
        let deadline = scope.deadline();
        assert!(!deadline.token().is_cancelled());

        let (_, result) = scope.run(async { Ok(ProbeSuccess::with_status(200)) }).await;
        assert!(result.is_ok());
        assert!(deadline.token().is_cancelled());
        // scope is gone, so waiting on it returns at once
        deadline.expired().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_shrinks() {
        let scope = DeadlineScope::open(Duration::from_millis(100));
        let deadline = scope.deadline();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(deadline.remaining(), Duration::from_millis(60));
        assert!(!deadline.is_expired());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(deadline.is_expired());
    }
}
