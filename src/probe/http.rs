use super::Probe;
use crate::{
    deadline::Deadline,
    errors::ProbeError,
    model::Target,
    result::{ProbeResult, ProbeSuccess},
};
use async_trait::async_trait;

/// HTTP GET health check. Any response is a success carrying its status code;
/// the sink decides whether the status counts as up.
///
/// The client is owned here and passed in by the caller, never a process-wide static.
#[derive(Debug, Clone, Default)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, target: &Target, deadline: Deadline) -> ProbeResult {
        let request = self
            .client
            .get(target.as_str())
            .timeout(deadline.remaining());

        tokio::select! {
            res = request.send() => match res {
                Ok(response) => Ok(ProbeSuccess::with_status(response.status().as_u16())),
                Err(e) if e.is_timeout() => Err(deadline.timeout_error()),
                Err(e) => Err(ProbeError::invocation(e)),
            },
            _ = deadline.expired() => Err(deadline.timeout_error()),
        }
    }
}
