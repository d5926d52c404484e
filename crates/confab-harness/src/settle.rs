//! Settle and poll helpers for the act → await → poll → assert idiom.

use std::{future::Future, time::Duration};

use tokio::time::Instant;

use crate::error::HarnessError;

/// Interval between probe attempts in [`poll_until`].
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Plain settle delay before refetching state.
pub async fn settle(delay: Duration) {
    tokio::time::sleep(delay).await;
}

/// Repeatedly probe a condition until it holds or `budget` elapses.
///
/// Stronger form of sleep-then-query with the same timeout semantics as the
/// event matcher: a condition that never holds surfaces as an assertion
/// failure, never a hang. Probe errors abort immediately.
pub async fn poll_until<F, Fut>(
    budget: Duration,
    context: &str,
    mut probe: F,
) -> Result<(), HarnessError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, HarnessError>>,
{
    let deadline = Instant::now() + budget;
    loop {
        if probe().await? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(HarnessError::Assertion {
                context: format!("{context} (condition not met within {budget:?})"),
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
