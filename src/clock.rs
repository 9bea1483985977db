//! Time source for timestamps and calendar boundaries.
//!
//! Weekly and monthly leaderboards are cut at local midnight in a single
//! configured UTC offset, so every request sees the same period boundaries
//! regardless of where the client is.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Offset defining the local calendar
    fn offset(&self) -> FixedOffset;

    /// Monday 00:00 of the current local week
    fn start_of_week(&self) -> DateTime<Utc> {
        let today = self.now().with_timezone(&self.offset()).date_naive();
        let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        local_midnight(monday, self.offset())
    }

    /// The first of the current local month, 00:00
    fn start_of_month(&self) -> DateTime<Utc> {
        let today = self.now().with_timezone(&self.offset()).date_naive();
        let first = today - Duration::days(today.day0() as i64);
        local_midnight(first, self.offset())
    }
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    Utc.from_utc_datetime(&(local - Duration::seconds(offset.local_minus_utc() as i64)))
}

/// Wall clock in a fixed offset
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now_millis: AtomicI64,
    offset: FixedOffset,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now_millis: AtomicI64::new(now.timestamp_millis()),
            offset,
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now_millis.store(now.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now_millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.now_millis.load(Ordering::SeqCst);
        DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}
