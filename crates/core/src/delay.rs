//! Randomized start delay for scheduled runs.

use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::info;

/// Picks a uniform whole number of seconds in `[0, bound)`.
///
/// Bounds below two seconds collapse to no delay.
#[must_use]
pub fn pick_delay<R: Rng + ?Sized>(bound: Duration, rng: &mut R) -> Duration {
    let bound = bound.as_secs();
    if bound <= 1 {
        return Duration::ZERO;
    }
    Duration::from_secs(rng.random_range(0..bound))
}

/// Sleeps for a random delay unless the run is interactive.
///
/// Returns the time slept so the caller can extend its warning threshold.
pub fn apply_random_delay(bound: Duration, interactive: bool) -> Duration {
    if interactive {
        return Duration::ZERO;
    }

    let delay = pick_delay(bound, &mut rand::rng());
    if !delay.is_zero() {
        info!(target: "msync::delay", seconds = delay.as_secs(), "delaying start");
        thread::sleep(delay);
    }
    delay
}
