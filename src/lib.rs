//! Bounded concurrent probe pool
//!
//! # Features
//! - Fixed number of workers pulling targets from one bounded work queue
//! - Independent deadline per probe; a hung target only costs its own worker
//! - Single-consumer result stream with backpressure
//! - Deterministic shutdown: the result channel closes once, after every worker is joined
//! - TCP connect and HTTP GET adapters behind the `Probe` trait

pub mod config;
pub mod deadline;
pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod probe;
pub mod queue;
pub mod result;
pub mod sink;
pub mod source;

pub use config::{EnqueueMode, PoolConfig};
pub use deadline::Deadline;
pub use errors::{PoolError, ProbeError};
pub use handle::{ResultStream, RunHandle, SupervisorHandle};
pub use model::{PoolMetrics, PoolReport, PoolState, ProbeOutcome, Tally, Target};
pub use pool::Pool;
pub use probe::{probe_fn, AutoProbe, HttpProbe, Probe, TcpProbe};
pub use result::{ProbeResult, ProbeSuccess};
pub use sink::{ConsoleReporter, LineReporter, Reporter, ResultSink, RunSummary};
pub use source::{SourceReport, TaskSource};
