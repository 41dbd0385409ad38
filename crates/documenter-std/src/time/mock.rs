#[cfg(any(test, feature = "test-support"))]
use std::sync::{Arc, Mutex};

#[cfg(any(test, feature = "test-support"))]
use chrono::{DateTime, Duration, Utc};

#[cfg(any(test, feature = "test-support"))]
use super::GetNow;

/// Time only moves when you call [`advance`](MockClock::advance) or
/// [`set`](MockClock::set). Clones share the same time.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone)]
pub struct MockClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl MockClock {
    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.current.lock().unwrap() += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.current.lock().unwrap() = to;
    }
}

#[cfg(any(test, feature = "test-support"))]
impl GetNow for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap()
    }
}
