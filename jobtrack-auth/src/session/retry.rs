use jobtrack_api::ClassifiedError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const MAX_DELAY: Duration = Duration::from_secs(30);

/// Exponential delay schedule: `base * 2^(attempt - 2)` before attempt 2 onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
}

impl Backoff {
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            cap: MAX_DELAY,
        }
    }

    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 2).unwrap_or(u32::MAX);
        self.base.checked_mul(factor).unwrap_or(self.cap).min(self.cap)
    }
}

pub(crate) enum RetryOutcome<T> {
    Success(T),
    /// A non-network failure; never retried.
    Terminal(ClassifiedError),
    /// Every attempt failed with a network error, or the abort signal fired.
    GaveUp(Option<ClassifiedError>),
}

/// Run `operation` up to `max_attempts` times, retrying only network failures.
pub(crate) async fn run<T, F, Fut>(
    backoff: Backoff,
    mut operation: F,
    max_attempts: u32,
    abort: Option<&CancellationToken>,
) -> RetryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError>>,
{
    let mut last_error = None;

    for attempt in 1..=max_attempts.max(1) {
        if attempt > 1 {
            let delay = backoff.delay_before(attempt);
            tracing::debug!(attempt, ?delay, "Retrying after network error");

            let aborted = match abort {
                Some(abort) => tokio::select! {
                    _ = abort.cancelled() => true,
                    _ = tokio::time::sleep(delay) => false,
                },
                None => {
                    tokio::time::sleep(delay).await;
                    false
                }
            };
            if aborted {
                tracing::debug!(attempt, "Retry aborted");
                break;
            }
        }
        if abort.is_some_and(CancellationToken::is_cancelled) {
            break;
        }

        match operation().await {
            Ok(value) => return RetryOutcome::Success(value),
            Err(err) if err.is_retryable() => {
                tracing::warn!(attempt, max_attempts, "Network error: {}", err);
                last_error = Some(err);
            }
            Err(err) => return RetryOutcome::Terminal(err),
        }
    }

    RetryOutcome::GaveUp(last_error)
}
