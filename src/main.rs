use anyhow::Result;
use probe_pool::{AutoProbe, ConsoleReporter, Pool, PoolConfig, TaskSource};
use std::time::Instant;
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_TARGETS: &[&str] = &[
    "https://www.google.com",
    "https://www.yahoo.com",
    "https://www.bing.com",
    "https://www.duckduckgo.com",
    "https://www.baidu.com",
    "https://www.ask.com",
    "https://www.aol.com",
];

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "probe_pool=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::var("PROBE_TIMEOUT_MS") {
        Ok(_) => PoolConfig::from_env()?,
        Err(_) => PoolConfig::http_health(),
    };

    let mut targets: Vec<String> = std::env::args().skip(1).collect();
    if targets.is_empty() {
        targets = DEFAULT_TARGETS.iter().map(|s| s.to_string()).collect();
    }

    let rt = Builder::new_multi_thread().enable_all().build()?;

    rt.block_on(async move {
        let now = Instant::now();
        let shutdown = CancellationToken::new();

        let stop = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, remaining targets will be reported as cancelled");
                stop.cancel();
            }
        });

        let pool = Pool::new(config)?.with_shutdown(shutdown);
        let run = pool.run(TaskSource::new(targets), AutoProbe::default())?;
        let summary = run.drain(ConsoleReporter).await;

        for failure in &summary.report.worker_failures {
            tracing::error!(%failure, "Pool did not shut down cleanly");
        }
        tracing::info!(elapsed = ?now.elapsed(), "Done");
        Ok::<(), anyhow::Error>(())
    })
}
