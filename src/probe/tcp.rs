use super::Probe;
use crate::{
    deadline::Deadline,
    errors::ProbeError,
    model::Target,
    result::{ProbeResult, ProbeSuccess},
};
use async_trait::async_trait;
use tokio::net::TcpStream;

/// Reachability check: a target is up if a TCP connection to `host:port` opens
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

#[async_trait]
impl Probe for TcpProbe {
    async fn probe(&self, target: &Target, deadline: Deadline) -> ProbeResult {
        tokio::select! {
            res = TcpStream::connect(target.as_str()) => match res {
                Ok(_stream) => Ok(ProbeSuccess::reachable()),
                Err(e) => Err(ProbeError::invocation(e)),
            },
            _ = deadline.expired() => Err(deadline.timeout_error()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::DeadlineScope;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_open_port_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target = Target::from(listener.local_addr().unwrap().to_string());

        let scope = DeadlineScope::open(Duration::from_secs(2));
        let result = TcpProbe.probe(&target, scope.deadline()).await;
        assert_eq!(result, Ok(ProbeSuccess::reachable()));
    }

    #[tokio::test]
    async fn test_closed_port_is_failure() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let target = Target::from(addr.to_string());

        let scope = DeadlineScope::open(Duration::from_secs(2));
        let result = TcpProbe.probe(&target, scope.deadline()).await;
        assert!(matches!(result, Err(ProbeError::Invocation(_))));
    }

    #[tokio::test]
    async fn test_malformed_target_is_invocation_error() {
        let scope = DeadlineScope::open(Duration::from_secs(2));
        let result = TcpProbe.probe(&Target::from("no-port-here"), scope.deadline()).await;
        assert!(matches!(result, Err(ProbeError::Invocation(_))));
    }
}
