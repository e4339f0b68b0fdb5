//! Fixed-interval polling with an attempt bound and cancellation.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use geosong_core::defaults::{POLL_INTERVAL_SECS, POLL_MAX_ATTEMPTS};
use geosong_core::{Error, Result};

/// How often and how long to wait on a remote state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Total number of probes, including the first one.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(POLL_INTERVAL_SECS),
            max_attempts: POLL_MAX_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

/// Outcome of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    Ready(T),
    /// Not there yet; carries the observed remote status for logging.
    Pending(String),
}

/// Probe until it reports `Ready`, sleeping `policy.interval` between probes.
///
/// Errors from the probe end the wait immediately. Running out of attempts
/// yields [`Error::PollExhausted`]; cancellation, checked before each probe and
/// during each sleep, yields [`Error::Cancelled`].
pub async fn poll_until<T, F, Fut>(
    policy: &PollPolicy,
    cancel: &CancellationToken,
    what: &str,
    mut probe: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PollStatus<T>>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_status = String::from("none");

    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled(format!("waiting for {}", what)));
        }

        match probe(attempt).await? {
            PollStatus::Ready(value) => {
                debug!(attempt, what, "Poll target reached");
                return Ok(value);
            }
            PollStatus::Pending(status) => {
                debug!(attempt, what, status = %status, "Still waiting");
                last_status = status;
            }
        }

        if attempt < max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(Error::Cancelled(format!("waiting for {}", what)));
                }
                _ = tokio::time::sleep(policy.interval) => {}
            }
        }
    }

    Err(Error::PollExhausted {
        what: what.to_string(),
        attempts: max_attempts,
        last_status,
    })
}
