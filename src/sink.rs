//! Result sink: the single consumer of the result channel
//!
//! Classifies every outcome as up or down, keeps the tally and hands a
//! formatted line to a `Reporter`. The summary line is the tally's
//! `Display`: `"<up> up, <down> down"`.

use super::{
    handle::ResultStream,
    model::{PoolReport, ProbeOutcome, Tally},
};
use std::io::Write;
use tracing::trace;

pub trait Reporter: Send {
    fn report(&mut self, outcome: &ProbeOutcome);

    fn summary(&mut self, _tally: &Tally) {}
}

/// One report line per outcome
pub fn format_line(outcome: &ProbeOutcome) -> String {
    let latency = format!("{:.2?}", outcome.elapsed);
    match &outcome.result {
        Err(e) => format!("❌ ERROR: {} | {}", outcome.target, e),
        Ok(success) => {
            let icon = if success.is_error_status() { "⚠️" } else { "✅" };
            let status = success
                .status
                .map_or_else(|| "ok".to_string(), |s| s.to_string());
            format!("{} {} | {:>10} | {}", icon, status, latency, outcome.target)
        }
    }
}

/// Prints lines and the summary to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&mut self, outcome: &ProbeOutcome) {
        println!("{}", format_line(outcome));
    }

    fn summary(&mut self, tally: &Tally) {
        println!("{}", tally);
        let _ = std::io::stdout().flush();
    }
}

/// Keeps every line in memory, summary last
#[derive(Debug, Default, Clone)]
pub struct LineReporter {
    pub lines: Vec<String>,
}

impl Reporter for LineReporter {
    fn report(&mut self, outcome: &ProbeOutcome) {
        self.lines.push(format_line(outcome));
    }

    fn summary(&mut self, tally: &Tally) {
        self.lines.push(tally.to_string());
    }
}

pub struct ResultSink<R> {
    results: ResultStream,
    reporter: R,
    tally: Tally,
}

impl<R: Reporter> ResultSink<R> {
    pub fn new(results: ResultStream, reporter: R) -> Self {
        Self {
            results,
            reporter,
            tally: Tally::default(),
        }
    }

    /// Consume until the result channel closes
    pub async fn drain(mut self) -> (Tally, R) {
        while let Some(outcome) = self.results.recv().await {
            self.tally.record(&outcome);
            trace!(addr = %outcome.target, up = outcome.is_up(), "Outcome recorded");
            self.reporter.report(&outcome);
        }
        self.reporter.summary(&self.tally);
        (self.tally, self.reporter)
    }
}

pub struct RunSummary<R> {
    pub tally: Tally,
    pub report: PoolReport,
    pub reporter: R,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::ProbeError,
        model::Target,
        result::ProbeSuccess,
    };
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn outcome(target: &str, result: crate::result::ProbeResult) -> ProbeOutcome {
        ProbeOutcome::new(Target::from(target), Some(0), Duration::from_millis(12), result)
    }

    #[test]
    fn test_line_formats() {
        let up = format_line(&outcome("https://a.test", Ok(ProbeSuccess::with_status(200))));
        assert!(up.starts_with("✅ 200 |"));
        assert!(up.ends_with("| https://a.test"));

        let reach = format_line(&outcome("10.0.0.1:22", Ok(ProbeSuccess::reachable())));
        assert!(reach.starts_with("✅ ok |"));

        let warn = format_line(&outcome("https://b.test", Ok(ProbeSuccess::with_status(404))));
        assert!(warn.starts_with("⚠️ 404 |"));

        let err = format_line(&outcome(
            "https://c.test",
            Err(ProbeError::Timeout {
                after: Duration::from_millis(300),
            }),
        ));
        assert_eq!(err, "❌ ERROR: https://c.test | timeout after 300ms");
    }

    #[test]
    fn test_non_200_success_is_down() {
        let no_content = outcome("https://d.test", Ok(ProbeSuccess::with_status(204)));
        let moved = outcome("https://e.test", Ok(ProbeSuccess::with_status(301)));

        assert!(format_line(&no_content).starts_with("✅ 204 |"));
        assert!(format_line(&moved).starts_with("✅ 301 |"));

        let mut tally = Tally::default();
        tally.record(&no_content);
        tally.record(&moved);
        tally.record(&outcome("https://f.test", Ok(ProbeSuccess::with_status(200))));
        assert_eq!(tally, Tally { up: 1, down: 2 });
    }

    #[tokio::test]
    async fn test_drain_counts_and_summarizes() {
        let (tx, rx) = mpsc::channel(4);
        let sink = ResultSink::new(ResultStream::new(rx), LineReporter::default());

        tokio::spawn(async move {
            tx.send(outcome("a:1", Ok(ProbeSuccess::reachable()))).await.unwrap();
            tx.send(outcome("b:2", Ok(ProbeSuccess::with_status(500)))).await.unwrap();
            tx.send(outcome("c:3", Err(ProbeError::invocation("refused")))).await.unwrap();
        });

        let (tally, reporter) = sink.drain().await;
        assert_eq!(tally, Tally { up: 1, down: 2 });
        assert_eq!(reporter.lines.len(), 4);
        assert_eq!(reporter.lines.last().unwrap(), "1 up, 2 down");
    }

    #[tokio::test]
    async fn test_drain_empty_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        let (tally, reporter) = ResultSink::new(ResultStream::new(rx), LineReporter::default())
            .drain()
            .await;
        assert_eq!(tally.total(), 0);
        assert_eq!(reporter.lines, vec!["0 up, 0 down".to_string()]);
    }
}
