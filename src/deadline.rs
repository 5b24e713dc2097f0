use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Run-wide time budget plus the caller's cancellation signal.
///
/// Every blocking step of a run goes through [`Deadline::guard`] or
/// [`Deadline::sleep`], so a stuck fetch can never outlive the budget.
#[derive(Debug, Clone)]
pub struct Deadline {
    at: Instant,
    cancel: CancellationToken,
}

/// The budget ran out or the caller cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expired;

impl Deadline {
    pub fn after(budget: Duration, cancel: CancellationToken) -> Self {
        Self {
            at: Instant::now() + budget,
            cancel,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.cancel.is_cancelled() || Instant::now() >= self.at
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Drive `fut` to completion unless the deadline passes first.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Expired> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Expired),
            _ = sleep_until(self.at) => Err(Expired),
            output = fut => Ok(output),
        }
    }

    /// Sleep for `duration`, waking early with `Expired` if the deadline
    /// passes in the meantime.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Expired> {
        self.guard(tokio::time::sleep(duration)).await
    }
}
