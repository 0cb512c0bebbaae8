//! The probe capability and its adapters
//!
//! The pool knows nothing about protocols. It hands each target and a
//! `Deadline` to a `Probe` and records whatever comes back. Failures are
//! values; a probe must not block past its deadline.

pub mod http;
pub mod tcp;

pub use http::HttpProbe;
pub use tcp::TcpProbe;

use crate::{deadline::Deadline, model::Target, result::ProbeResult};
use async_trait::async_trait;
use std::{future::Future, sync::Arc};

#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, target: &Target, deadline: Deadline) -> ProbeResult;
}

#[async_trait]
impl<P: Probe + ?Sized> Probe for Arc<P> {
    async fn probe(&self, target: &Target, deadline: Deadline) -> ProbeResult {
        (**self).probe(target, deadline).await
    }
}

/// A probe backed by a closure
pub struct FnProbe<F> {
    f: F,
}

/// Lift an async closure into a `Probe`
pub fn probe_fn<F, Fut>(f: F) -> FnProbe<F>
where
    F: Fn(Target, Deadline) -> Fut + Send + Sync,
    Fut: Future<Output = ProbeResult> + Send + 'static,
{
    FnProbe { f }
}

#[async_trait]
impl<F, Fut> Probe for FnProbe<F>
where
    F: Fn(Target, Deadline) -> Fut + Send + Sync,
    Fut: Future<Output = ProbeResult> + Send + 'static,
{
    async fn probe(&self, target: &Target, deadline: Deadline) -> ProbeResult {
        (self.f)(target.clone(), deadline).await
    }
}

/// Picks the HTTP adapter for `http(s)://` targets and TCP connect for the rest
#[derive(Clone, Default)]
pub struct AutoProbe {
    http: HttpProbe,
    tcp: TcpProbe,
}

impl AutoProbe {
    pub fn new(http: HttpProbe) -> Self {
        Self {
            http,
            tcp: TcpProbe,
        }
    }
}

#[async_trait]
impl Probe for AutoProbe {
    async fn probe(&self, target: &Target, deadline: Deadline) -> ProbeResult {
        if target.is_http() {
            self.http.probe(target, deadline).await
        } else {
            self.tcp.probe(target, deadline).await
        }
    }
}
