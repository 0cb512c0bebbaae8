use super::{
    config::PoolConfig,
    deadline::DeadlineScope,
    errors::{PoolError, ProbeError, Result},
    handle::{ResultStream, RunHandle, SupervisorHandle},
    model::{PoolMetrics, PoolReport, PoolState, ProbeOutcome, Target},
    probe::Probe,
    queue::WorkQueue,
    source::{SourceReport, TaskSource},
};
use std::{
    any::Any,
    sync::{
        atomic::{AtomicU8, AtomicUsize, Ordering},
        Arc, OnceLock,
    },
    time::Duration,
};
use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

#[derive(Default)]
pub(crate) struct Counters {
    idle_workers: AtomicUsize,
    in_flight: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl Counters {
    /// Rejected targets never reach a worker but still count as failed
    pub(crate) fn record_rejected(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Everything a worker needs, shared by all workers of one run
struct WorkerContext<P> {
    queue: WorkQueue,
    probe: P,
    timeout: Duration,
    counters: Arc<Counters>,
    shutdown: Option<CancellationToken>,
}

/// Fixed-size pool of probe workers.
///
/// A pool runs exactly once: `Idle → Running → Draining → Closed`.
/// Build a fresh pool for every run.
pub struct Pool {
    config: Arc<PoolConfig>,
    state: Arc<AtomicU8>,
    counters: Arc<Counters>,
    queue: OnceLock<WorkQueue>,
    shutdown: Option<CancellationToken>,
}

impl Pool {
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            state: Arc::new(AtomicU8::new(PoolState::Idle as u8)),
            counters: Arc::new(Counters::default()),
            queue: OnceLock::new(),
            shutdown: None,
        })
    }

    /// Attach an external stop signal. Once it fires, workers stop probing and
    /// report every remaining target as `Cancelled`.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    #[inline]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> PoolState {
        PoolState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Start the producer, the workers and the supervisor.
    ///
    /// Must be called from inside a tokio runtime. Fails with
    /// `AlreadyStarted` if this pool has run before.
    pub fn run<P>(&self, source: TaskSource, probe: P) -> Result<RunHandle>
    where
        P: Probe + 'static,
    {
        self.state
            .compare_exchange(
                PoolState::Idle as u8,
                PoolState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|current| PoolError::AlreadyStarted {
                state: PoolState::from_u8(current),
            })?;

        let config = &self.config;
        let queue = WorkQueue::new(config.queue_capacity);
        let _ = self.queue.set(queue.clone());
        let (results_tx, results_rx) = mpsc::channel(config.result_capacity());

        info!(
            workers = config.worker_count,
            timeout_ms = config.per_task_timeout.as_millis() as u64,
            queue_capacity = queue.capacity(),
            result_buffer = config.result_capacity(),
            "Starting probe pool"
        );

        let producer = tokio::spawn(source.feed(
            queue.clone(),
            config.enqueue_mode,
            results_tx.clone(),
            self.counters.clone(),
        ));

        let ctx = Arc::new(WorkerContext {
            queue: queue.clone(),
            probe,
            timeout: config.per_task_timeout,
            counters: self.counters.clone(),
            shutdown: self.shutdown.clone(),
        });

        let workers: Vec<JoinHandle<usize>> = (0..config.worker_count)
            .map(|id| tokio::spawn(worker_loop(id, ctx.clone(), results_tx.clone())))
            .collect();

        let supervisor = tokio::spawn(supervise(
            producer,
            workers,
            queue,
            results_tx,
            self.state.clone(),
        ));

        Ok(RunHandle {
            results: ResultStream::new(results_rx),
            supervisor: SupervisorHandle::new(supervisor),
        })
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            workers: self.config.worker_count,
            idle_workers: self.counters.idle_workers.load(Ordering::Relaxed),
            queued_targets: self.queue.get().map_or(0, WorkQueue::len),
            in_flight: self.counters.in_flight.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Periodically hand a metrics snapshot to `callback`.
    /// Cancel the returned token to stop the monitor.
    pub fn start_monitoring<F>(self: &Arc<Self>, interval: Duration, callback: F) -> CancellationToken
    where
        F: Fn(PoolMetrics) + Send + 'static,
    {
        let pool = Arc::clone(self);
        let token = CancellationToken::new();
        let token_clone = token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        callback(pool.metrics());
                        if pool.state() == PoolState::Closed {
                            break;
                        }
                    }
                    _ = token_clone.cancelled() => break,
                }
            }
        });

        token
    }

    pub fn stop_monitoring(token: CancellationToken) {
        token.cancel();
    }
}

/// Joins the producer and every worker, then drops the last result sender.
/// Dropping it is what closes the result channel, so it happens exactly once
/// and only after all producers are gone.
async fn supervise(
    producer: JoinHandle<SourceReport>,
    workers: Vec<JoinHandle<usize>>,
    queue: WorkQueue,
    results_tx: mpsc::Sender<ProbeOutcome>,
    state: Arc<AtomicU8>,
) -> PoolReport {
    let mut report = PoolReport::default();

    match producer.await {
        Ok(source) => {
            report.enqueued = source.enqueued;
            report.rejected = source.rejected;
        }
        Err(join_err) => {
            warn!(error = %join_err, "Task source terminated abnormally");
            report.worker_failures.push(format!("task source: {}", join_err));
            // workers would otherwise wait forever for more work
            queue.close();
        }
    }
    state.store(PoolState::Draining as u8, Ordering::Release);
    debug!("Probe pool draining");

    for (id, worker) in workers.into_iter().enumerate() {
        match worker.await {
            Ok(handled) => trace!(worker = id, handled, "Worker joined"),
            Err(join_err) => {
                warn!(worker = id, error = %join_err, "Worker terminated abnormally");
                report.worker_failures.push(format!("worker {}: {}", id, join_err));
            }
        }
        report.workers_joined += 1;
    }

    drop(results_tx);
    state.store(PoolState::Closed as u8, Ordering::Release);
    info!(
        workers = report.workers_joined,
        enqueued = report.enqueued,
        rejected = report.rejected,
        "Probe pool closed"
    );
    report
}

async fn worker_loop<P: Probe>(
    id: usize,
    ctx: Arc<WorkerContext<P>>,
    results: mpsc::Sender<ProbeOutcome>,
) -> usize {
    debug!(worker = id, "Worker started");
    let counters = &ctx.counters;
    let mut handled = 0usize;

    loop {
        counters.idle_workers.fetch_add(1, Ordering::Relaxed);
        let next = ctx.queue.pop().await;
        counters.idle_workers.fetch_sub(1, Ordering::Relaxed);

        let Some(target) = next else { break };

        // nobody is listening any more; keep draining so the producer never stalls
        if results.is_closed() {
            continue;
        }

        let outcome = if ctx.shutdown.as_ref().is_some_and(|t| t.is_cancelled()) {
            ProbeOutcome::new(target, Some(id), Duration::ZERO, Err(ProbeError::Cancelled))
        } else {
            counters.in_flight.fetch_add(1, Ordering::Relaxed);
            let outcome = probe_one(id, &ctx, target).await;
            counters.in_flight.fetch_sub(1, Ordering::Relaxed);
            outcome
        };

        if outcome.is_success() {
            counters.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            counters.failed.fetch_add(1, Ordering::Relaxed);
        }
        trace!(
            worker = id,
            addr = %outcome.target,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            ok = outcome.is_success(),
            "Probe finished"
        );

        if results.send(outcome).await.is_err() {
            debug!(worker = id, "Result stream dropped, draining remaining targets");
        }
        handled += 1;
    }

    debug!(worker = id, handled, "Worker exiting");
    handled
}

async fn probe_one<P: Probe>(id: usize, ctx: &WorkerContext<P>, target: Target) -> ProbeOutcome {
    let scope = DeadlineScope::open(ctx.timeout);
    let deadline = scope.deadline();

    let (elapsed, result) = scope
        .run(async {
            std::panic::AssertUnwindSafe(ctx.probe.probe(&target, deadline))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    let message = panic_message(panic);
                    warn!(worker = id, addr = %target, panic = %message, "Probe panicked");
                    Err(ProbeError::Panicked(message))
                })
        })
        .await;

    ProbeOutcome::new(target, Some(id), elapsed, result)
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in probe".into()
    }
}
