// src/notify/digest.rs
use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveTime, Utc, Weekday};

/// Weekly delivery window used in digest mode.
/// - Opens on `weekday` at `start_hour` (UTC) and stays open for `hours`.
/// - A run outside the window does nothing, so unseen postings wait for the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestWindow {
    pub weekday: Weekday,
    pub start_hour: u32,
    pub hours: u32,
}

impl Default for DigestWindow {
    fn default() -> Self {
        Self {
            weekday: Weekday::Mon,
            start_hour: 9,
            hours: 1,
        }
    }
}

impl DigestWindow {
    /// `start_hour` > 23 is clamped to 23; `hours` == 0 is treated as 1.
    pub fn new(weekday: Weekday, start_hour: u32, hours: u32) -> Self {
        Self {
            weekday,
            start_hour: start_hour.min(23),
            hours: hours.max(1),
        }
    }

    /// Most recent opening at or before `now`.
    fn last_open(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let back = (7 + now.weekday().num_days_from_monday()
            - self.weekday.num_days_from_monday())
            % 7;
        let day = now.date_naive() - ChronoDuration::days(i64::from(back));
        let time = NaiveTime::from_hms_opt(self.start_hour, 0, 0).unwrap_or(NaiveTime::MIN);
        let open = day.and_time(time).and_utc();
        if open > now {
            open - ChronoDuration::days(7)
        } else {
            open
        }
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        now - self.last_open(now) < ChronoDuration::hours(i64::from(self.hours))
    }
}
