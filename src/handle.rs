use super::{
    model::{PoolReport, ProbeOutcome},
    sink::{Reporter, ResultSink, RunSummary},
};
use futures::Stream;
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::{sync::mpsc, task::JoinHandle};

/// Read side of the result channel. Not `Clone`: a run has one consumer.
pub struct ResultStream {
    receiver: mpsc::Receiver<ProbeOutcome>,
}

impl ResultStream {
    pub(crate) fn new(receiver: mpsc::Receiver<ProbeOutcome>) -> Self {
        Self { receiver }
    }

    /// Next outcome, or `None` once every producer has exited
    #[inline]
    pub async fn recv(&mut self) -> Option<ProbeOutcome> {
        self.receiver.recv().await
    }

    pub async fn collect_all(mut self) -> Vec<ProbeOutcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.recv().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}

impl Stream for ResultStream {
    type Item = ProbeOutcome;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

/// Resolves once every worker is joined and the result channel is closed
pub struct SupervisorHandle {
    inner: JoinHandle<PoolReport>,
}

impl SupervisorHandle {
    pub(crate) fn new(inner: JoinHandle<PoolReport>) -> Self {
        Self { inner }
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

impl Future for SupervisorHandle {
    type Output = PoolReport;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll(cx) {
            Poll::Ready(Ok(report)) => Poll::Ready(report),
            Poll::Ready(Err(join_err)) => Poll::Ready(PoolReport {
                worker_failures: vec![format!("supervisor: {}", join_err)],
                ..Default::default()
            }),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Everything a caller gets back from `Pool::run`
pub struct RunHandle {
    pub results: ResultStream,
    pub supervisor: SupervisorHandle,
}

impl RunHandle {
    pub fn into_parts(self) -> (ResultStream, SupervisorHandle) {
        (self.results, self.supervisor)
    }

    /// Drain every outcome through `reporter`, then wait for the supervisor
    pub async fn drain<R: Reporter>(self, reporter: R) -> RunSummary<R> {
        let (tally, reporter) = ResultSink::new(self.results, reporter).drain().await;
        let report = self.supervisor.await;
        RunSummary {
            tally,
            report,
            reporter,
        }
    }
}
