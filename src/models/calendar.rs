//! Working-day calendar.
//!
//! Defines which days count toward durations and lags.
//!
//! # Time Model
//! Dates are whole days (`Day`) relative to a scheduling epoch. The consumer
//! defines what day 0 means; a calendar built with [`WorkCalendar::weekdays`]
//! or [`WorkCalendar::with_epoch`] can convert to and from calendar dates.
//!
//! A task of duration `n` starting on day `s` occupies the half-open span
//! `[s, advance(s, n))`, so with every day working a 3-day task starting on
//! day 0 finishes on day 3.
//!
//! Only a day-is-working predicate is supported; holiday tables and
//! per-resource calendars are out of scope.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::fmt;
use std::sync::Arc;

/// Day index relative to the scheduling epoch.
pub type Day = i64;

/// Largest magnitude accepted for caller-supplied dates and lags.
///
/// Keeps every derived date far from `i64` overflow; roughly 2.7 million
/// years either side of day 0.
pub const MAX_DAY_OFFSET: Day = 1_000_000_000;

/// Upper bound on consecutive non-working days scanned before giving up.
const MAX_SCAN_DAYS: i64 = 3_660;

/// Whether `day` lies within `±MAX_DAY_OFFSET`.
pub fn day_in_range(day: Day) -> bool {
    (-MAX_DAY_OFFSET..=MAX_DAY_OFFSET).contains(&day)
}

type WorkingPredicate = Arc<dyn Fn(Day) -> bool + Send + Sync>;

/// Pluggable working-day calendar.
#[derive(Clone, Default)]
pub struct WorkCalendar {
    /// `None` = every day is a working day.
    predicate: Option<WorkingPredicate>,
    /// Calendar date of day 0, if known.
    epoch: Option<NaiveDate>,
}

impl fmt::Debug for WorkCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkCalendar")
            .field("continuous", &self.predicate.is_none())
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl WorkCalendar {
    /// Calendar where every day is a working day.
    pub fn continuous() -> Self {
        Self::default()
    }

    /// Calendar with a custom working-day predicate.
    pub fn from_fn(predicate: impl Fn(Day) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Some(Arc::new(predicate)),
            epoch: None,
        }
    }

    /// Monday-to-Friday calendar anchored at `epoch` (day 0).
    pub fn weekdays(epoch: NaiveDate) -> Self {
        let predicate = move |day: Day| match day_to_date(epoch, day) {
            Some(date) => !matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
            None => true,
        };
        Self {
            predicate: Some(Arc::new(predicate)),
            epoch: Some(epoch),
        }
    }

    /// Sets the calendar date of day 0.
    pub fn with_epoch(mut self, epoch: NaiveDate) -> Self {
        self.epoch = Some(epoch);
        self
    }

    /// Whether every day counts as working time.
    pub fn is_continuous(&self) -> bool {
        self.predicate.is_none()
    }

    /// Whether `day` is a working day.
    #[inline]
    pub fn is_working(&self, day: Day) -> bool {
        match &self.predicate {
            None => true,
            Some(p) => p(day),
        }
    }

    /// First working day at or after `day`.
    pub fn next_working(&self, day: Day) -> Day {
        if self.predicate.is_none() {
            return day;
        }
        let mut d = day;
        let mut scanned = 0;
        while !self.is_working(d) {
            d = d.saturating_add(1);
            scanned += 1;
            if scanned > MAX_SCAN_DAYS {
                return day;
            }
        }
        d
    }

    /// Moves `days` working days away from `from`.
    ///
    /// Forward moves count working days in `[from, result)`; backward moves
    /// count working days in `[result, from)`. `advance(d, 0) == d`.
    /// Saturates at the ends of the `Day` range.
    pub fn advance(&self, from: Day, days: i64) -> Day {
        if self.predicate.is_none() || days == 0 {
            return from.saturating_add(days);
        }
        let mut d = from;
        let mut remaining = days.abs();
        let mut idle = 0;
        while remaining > 0 {
            if days > 0 {
                if self.is_working(d) {
                    remaining -= 1;
                    idle = 0;
                } else {
                    idle += 1;
                }
                d = d.saturating_add(1);
            } else {
                d = d.saturating_sub(1);
                if self.is_working(d) {
                    remaining -= 1;
                    idle = 0;
                } else {
                    idle += 1;
                }
            }
            if idle > MAX_SCAN_DAYS {
                return from.saturating_add(days);
            }
        }
        d
    }

    /// Calendar date of `day`, if the calendar has an epoch.
    pub fn to_date(&self, day: Day) -> Option<NaiveDate> {
        self.epoch.and_then(|epoch| day_to_date(epoch, day))
    }

    /// Day index of `date`, if the calendar has an epoch.
    pub fn to_day(&self, date: NaiveDate) -> Option<Day> {
        self.epoch
            .map(|epoch| date.signed_duration_since(epoch).num_days())
    }
}

fn day_to_date(epoch: NaiveDate, day: Day) -> Option<NaiveDate> {
    if day >= 0 {
        epoch.checked_add_days(Days::new(day as u64))
    } else {
        epoch.checked_sub_days(Days::new(day.unsigned_abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday() -> NaiveDate {
        // 2024-01-01 was a Monday.
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_continuous_is_plain_arithmetic() {
        let cal = WorkCalendar::continuous();
        assert!(cal.is_continuous());
        assert_eq!(cal.advance(0, 3), 3);
        assert_eq!(cal.advance(9, -4), 5);
        assert_eq!(cal.next_working(7), 7);
    }

    #[test]
    fn test_weekdays_skip_weekend() {
        let cal = WorkCalendar::weekdays(monday());
        assert!(cal.is_working(0)); // Mon
        assert!(!cal.is_working(5)); // Sat
        assert!(!cal.is_working(6)); // Sun
        assert_eq!(cal.next_working(5), 7);

        // Five working days from Monday ends (exclusive) on Saturday.
        assert_eq!(cal.advance(0, 5), 5);
        // Six working days spill over the weekend to Tuesday (exclusive).
        assert_eq!(cal.advance(0, 6), 8);
        // Backward move mirrors the forward one.
        assert_eq!(cal.advance(8, -6), 0);
    }

    #[test]
    fn test_custom_predicate() {
        let cal = WorkCalendar::from_fn(|d| d % 2 == 0);
        assert_eq!(cal.advance(0, 2), 3);
        assert_eq!(cal.next_working(1), 2);
    }

    #[test]
    fn test_never_working_predicate_terminates() {
        let cal = WorkCalendar::from_fn(|_| false);
        assert_eq!(cal.advance(0, 2), 2);
        assert_eq!(cal.next_working(4), 4);
    }

    #[test]
    fn test_advance_saturates() {
        let cal = WorkCalendar::continuous();
        assert_eq!(cal.advance(Day::MAX, 3), Day::MAX);
        assert_eq!(cal.advance(Day::MIN, -3), Day::MIN);

        let weekdays = WorkCalendar::weekdays(monday());
        assert_eq!(weekdays.advance(Day::MAX - 1, 4), Day::MAX);
        assert_eq!(weekdays.next_working(Day::MAX), Day::MAX);
        assert!(day_in_range(MAX_DAY_OFFSET));
        assert!(!day_in_range(Day::MIN));
    }

    #[test]
    fn test_date_conversion() {
        let cal = WorkCalendar::continuous().with_epoch(monday());
        assert_eq!(cal.to_date(31), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(cal.to_date(-1), NaiveDate::from_ymd_opt(2023, 12, 31));
        assert_eq!(cal.to_day(NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()), Some(10));
        assert_eq!(WorkCalendar::continuous().to_date(3), None);
    }
}
