// Clock abstraction
//
// Everything in the kit that measures elapsed time (mirror propagation lag,
// waiter deadlines) reads it through this trait so that tests can run under
// paused tokio time.

use std::future::Future;
use std::pin::Pin;
use tokio::time::{self, Duration, Instant};

/// Source of time for the simulated network and waiters.
///
/// # Examples
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use ledger_tck::orchestrator::{Clock, PausedClock};
///
/// #[tokio::test(start_paused = true)]
/// async fn mirror_lag() {
///     let clock = Arc::new(PausedClock);
///     let start = clock.now();
///     clock.advance(Duration::from_millis(1500)).await;
///     assert_eq!(clock.now() - start, Duration::from_millis(1500));
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;

    /// Sleeps for the specified duration.
    ///
    /// Under paused tokio time this completes as soon as the runtime
    /// auto-advances or time is advanced explicitly.
    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Real tokio time, used by the CLI.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        time::Instant::now()
    }

    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(time::sleep(d))
    }
}

/// Paused clock for tests.
///
/// Under `#[tokio::test(start_paused = true)]` time is already paused and
/// the unit value `PausedClock` can be used directly; `PausedClock::new()`
/// pauses a running current-thread runtime and panics if it is already
/// paused.
pub struct PausedClock;

impl PausedClock {
    /// Creates a new PausedClock and pauses tokio time.
    pub fn new() -> Self {
        time::pause();
        Self
    }

    /// Manually advance time by the specified duration.
    pub async fn advance(&self, d: Duration) {
        time::advance(d).await
    }
}

impl Clock for PausedClock {
    fn now(&self) -> Instant {
        time::Instant::now()
    }

    fn sleep(&self, d: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(time::sleep(d))
    }
}

impl Default for PausedClock {
    fn default() -> Self {
        Self::new()
    }
}
