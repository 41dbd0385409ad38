use chrono::{DateTime, Utc};

pub trait GetNow {
    fn now(&self) -> DateTime<Utc>;
}
