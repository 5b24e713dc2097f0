use crate::config::PipelineConfig;
use crate::deadline::Deadline;
use crate::fetcher::{client::HttpFetcher, errors::FetchError, types::PageResponse};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Fixed retry schedule: one delay before the first retry, another before
/// every later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySchedule {
    pub first: Duration,
    pub later: Duration,
}

impl RetrySchedule {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            first: config.first_backoff,
            later: config.later_backoff,
        }
    }

    /// Delay before attempt number `attempt` (0 is the initial attempt).
    pub fn delay(&self, attempt: u32) -> Duration {
        match attempt {
            0 => Duration::ZERO,
            1 => self.first,
            _ => self.later,
        }
    }
}

/// Fetch `url`, retrying up to `max_retries` times on failure. Every attempt
/// and every wait is bounded by `deadline`; the last error is returned when
/// all attempts fail.
#[instrument(skip(fetcher, url, schedule, deadline), fields(url = %url))]
pub async fn fetch_with_retry(
    fetcher: &HttpFetcher,
    url: &str,
    max_retries: u32,
    schedule: RetrySchedule,
    deadline: &Deadline,
) -> Result<PageResponse, FetchError> {
    let mut last_error = FetchError::DeadlineExceeded;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = schedule.delay(attempt);
            debug!(
                attempt,
                ?delay,
                remaining = ?deadline.remaining(),
                "waiting before retry"
            );
            if deadline.sleep(delay).await.is_err() {
                return Err(FetchError::DeadlineExceeded);
            }
        }

        match deadline.guard(fetcher.fetch(url)).await {
            Err(_) => return Err(FetchError::DeadlineExceeded),
            Ok(Ok(response)) => return Ok(response),
            Ok(Err(error)) => {
                warn!(attempt, error = %error, "fetch attempt failed");
                let retry = error.should_retry();
                last_error = error;
                if !retry {
                    break;
                }
            }
        }
    }

    Err(last_error)
}
