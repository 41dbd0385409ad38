//! Wall-clock access.
//!
//! Scheduling works in calendar time (dates, time zones), so the clock hands
//! out `DateTime<Utc>` rather than a monotonic instant.
//!
//! ```
//! use chrono::{DateTime, Utc};
//! use documenter_std::time::{GetNow, SystemClock};
//!
//! fn stamp<C: GetNow>(clock: &C) -> DateTime<Utc> {
//!     clock.now()
//! }
//!
//! let _ = stamp(&SystemClock);
//! ```

mod get_now;
mod mock;
mod system;

pub use get_now::GetNow;
#[cfg(any(test, feature = "test-support"))]
pub use mock::MockClock;
pub use system::SystemClock;
