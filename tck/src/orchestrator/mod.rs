// Orchestrator
//
// Time control shared by the simulated network and the waiters.

/// Clock abstractions for deterministic time control in tests
pub mod clock;

pub use clock::{Clock, PausedClock, SystemClock};
