use super::{
    config::EnqueueMode,
    errors::PoolError,
    model::{ProbeOutcome, Target},
    pool::Counters,
    queue::WorkQueue,
};
use std::{ops::RangeInclusive, sync::Arc};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Ordered set of targets fed into the work queue
pub struct TaskSource {
    targets: Box<dyn Iterator<Item = Target> + Send>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceReport {
    pub enqueued: usize,
    pub rejected: usize,
}

impl TaskSource {
    pub fn new<I, T>(targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
        T: Into<Target> + 'static,
    {
        Self {
            targets: Box::new(targets.into_iter().map(Into::into)),
        }
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty::<Target>())
    }

    /// `host:port` for every port in the range, in order
    pub fn tcp_ports(host: &str, ports: RangeInclusive<u16>) -> Self {
        let host = host.to_string();
        Self::new(ports.map(move |port| Target::from(format!("{}:{}", host, port))))
    }

    /// Push every target, then close the queue.
    ///
    /// Rejected targets (non-blocking mode, queue full) go straight to the
    /// result channel so they are still reported exactly once.
    pub(crate) async fn feed(
        self,
        queue: WorkQueue,
        mode: EnqueueMode,
        results: mpsc::Sender<ProbeOutcome>,
        counters: Arc<Counters>,
    ) -> SourceReport {
        let mut report = SourceReport::default();

        for target in self.targets {
            let pushed = match mode {
                EnqueueMode::Blocking => queue.push(target.clone()).await,
                EnqueueMode::NonBlocking => queue.try_push(target.clone()),
            };

            match pushed {
                Ok(()) => report.enqueued += 1,
                Err(e) => {
                    if e == PoolError::QueueFull {
                        warn!(addr = %target, "Work queue full, rejecting target");
                    } else {
                        warn!(addr = %target, error = %e, "Failed to enqueue target");
                    }
                    report.rejected += 1;
                    counters.record_rejected();
                    if results.send(ProbeOutcome::rejected(target)).await.is_err() {
                        debug!("Result stream dropped while reporting a rejected target");
                    }
                }
            }
        }

        queue.close();
        debug!(
            enqueued = report.enqueued,
            rejected = report.rejected,
            "Task source finished, work queue closed"
        );
        report
    }
}

impl<T: Into<Target>> FromIterator<T> for TaskSource {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let targets: Vec<Target> = iter.into_iter().map(Into::into).collect();
        Self::new(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_feed_enqueues_all_then_closes() {
        let queue = WorkQueue::new(8);
        let (tx, mut rx) = mpsc::channel(1);
        let source = TaskSource::tcp_ports("127.0.0.1", 1..=5);

        let counters = Arc::new(Counters::default());
        let report = source.feed(queue.clone(), EnqueueMode::Blocking, tx, counters.clone()).await;
        assert_eq!(report, SourceReport { enqueued: 5, rejected: 0 });
        assert_eq!(counters.failed(), 0);
        assert!(queue.is_closed());
        assert_eq!(queue.len(), 5);
        assert_eq!(queue.try_pop().unwrap().as_str(), "127.0.0.1:1");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_non_blocking_overflow_is_reported() {
        let queue = WorkQueue::new(2);
        let (tx, mut rx) = mpsc::channel(8);
        let source: TaskSource = ["a:1", "b:2", "c:3", "d:4"].into_iter().collect();

        let counters = Arc::new(Counters::default());
        let report = source
            .feed(queue.clone(), EnqueueMode::NonBlocking, tx, counters.clone())
            .await;
        assert_eq!(report, SourceReport { enqueued: 2, rejected: 2 });
        assert_eq!(counters.failed(), 2);

        let mut rejected = vec![];
        while let Some(outcome) = rx.recv().await {
            assert_eq!(outcome.error(), Some(&crate::errors::ProbeError::Rejected));
            assert!(outcome.worker.is_none());
            rejected.push(outcome.target.to_string());
        }
        assert_eq!(rejected, vec!["c:3", "d:4"]);
    }

    #[tokio::test]
    async fn test_empty_source_closes_queue() {
        let queue = WorkQueue::new(1);
        let (tx, _rx) = mpsc::channel(1);
        let report = TaskSource::empty()
            .feed(queue.clone(), EnqueueMode::Blocking, tx, Arc::default())
            .await;
        assert_eq!(report, SourceReport::default());
        assert!(queue.is_closed());
        assert!(queue.pop().await.is_none());
    }
}
