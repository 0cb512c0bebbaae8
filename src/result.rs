use super::errors::ProbeError;

/// What a successful probe reports back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeSuccess {
    /// Protocol status (HTTP status code); `None` for plain reachability checks
    pub status: Option<u16>,
}

impl ProbeSuccess {
    pub fn reachable() -> Self {
        Self { status: None }
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            status: Some(status),
        }
    }

    /// Exactly 200, or no status at all
    #[inline]
    pub fn is_healthy(&self) -> bool {
        self.status.map_or(true, |s| s == 200)
    }

    /// Client or server error status (4xx/5xx)
    #[inline]
    pub fn is_error_status(&self) -> bool {
        self.status.is_some_and(|s| s >= 400)
    }
}

pub type ProbeResult = Result<ProbeSuccess, ProbeError>;
