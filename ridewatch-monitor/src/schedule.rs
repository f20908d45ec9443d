//! Poll schedule arithmetic.
//!
//! Ticks are anchored to the start of the cycle, so a slow cycle does not push
//! every later cycle back. Ticks that were missed entirely are skipped rather
//! than run back to back.

use std::time::Duration;
use tokio::time::Instant;

/// Returns when the next cycle should start.
///
/// A cycle that ends exactly on a tick starts the next one at once.
/// `backoff` (from a rate limit) delays the tick to at least `now + backoff`.
pub fn next_deadline(
    cycle_start: Instant,
    interval: Duration,
    now: Instant,
    backoff: Option<Duration>,
) -> Instant {
    let mut deadline = cycle_start + interval;

    if deadline < now && !interval.is_zero() {
        let overdue = now.duration_since(deadline).as_nanos();
        let skipped = overdue.div_ceil(interval.as_nanos());
        let skipped = u32::try_from(skipped).unwrap_or(u32::MAX);
        deadline += interval.saturating_mul(skipped);
    }

    match backoff {
        Some(wait) => deadline.max(now + wait),
        None => deadline,
    }
}
