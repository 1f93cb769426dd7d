use std::fmt;

use chrono::{DateTime, Utc};

/// Display used once the deadline has passed.
pub const EXPIRED_DISPLAY: &str = "00:00:00";

/// Display used for assignments without a due date.
pub const NO_DEADLINE_DISPLAY: &str = "No deadline";

/// Time left before a deadline, split for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Remaining {
    /// Splits a positive millisecond count, truncating sub-second remainders.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        let total_seconds = millis.max(0) / 1000;
        Self {
            days: total_seconds / 86_400,
            hours: (total_seconds / 3_600) % 24,
            minutes: (total_seconds / 60) % 60,
            seconds: total_seconds % 60,
        }
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}j {}h {}m {}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    NoDeadline,
    Running(Remaining),
    Expired,
}

impl CountdownState {
    /// Computes the countdown for `due_date` as seen at `now`.
    #[must_use]
    pub fn at(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(due) = due_date else {
            return Self::NoDeadline;
        };
        let millis = (due - now).num_milliseconds();
        if millis > 0 {
            Self::Running(Remaining::from_millis(millis))
        } else {
            Self::Expired
        }
    }

    /// Whether a ticking timer is still needed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }
}

impl fmt::Display for CountdownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDeadline => f.write_str(NO_DEADLINE_DISPLAY),
            Self::Running(remaining) => write!(f, "{remaining}"),
            Self::Expired => f.write_str(EXPIRED_DISPLAY),
        }
    }
}

/// Human label for a due date: `dd-MM-yyyy hh:mm AM`.
#[must_use]
pub fn deadline_label(due_date: Option<DateTime<Utc>>) -> String {
    match due_date {
        Some(due) => due.format("%d-%m-%Y %I:%M %p").to_string(),
        None => NO_DEADLINE_DISPLAY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::{Duration, TimeZone};

    #[test]
    fn formats_days_hours_minutes_seconds() {
        let now = fixed_now();
        let due = now + Duration::milliseconds(90_061_000);
        let state = CountdownState::at(Some(due), now);
        assert_eq!(state.to_string(), "1j 1h 1m 1s");
    }

    #[test]
    fn one_day_one_minute_one_second() {
        let now = fixed_now();
        let due = now + Duration::days(1) + Duration::minutes(1) + Duration::seconds(1);
        assert_eq!(CountdownState::at(Some(due), now).to_string(), "1j 0h 1m 1s");
    }

    #[test]
    fn past_deadline_freezes_at_sentinel() {
        let now = fixed_now();
        let state = CountdownState::at(Some(now - Duration::seconds(1)), now);
        assert_eq!(state, CountdownState::Expired);
        assert_eq!(state.to_string(), "00:00:00");
        assert!(!state.is_running());
        assert_eq!(CountdownState::at(Some(now), now), CountdownState::Expired);
    }

    #[test]
    fn no_due_date_means_no_deadline() {
        let state = CountdownState::at(None, fixed_now());
        assert_eq!(state, CountdownState::NoDeadline);
        assert_eq!(state.to_string(), NO_DEADLINE_DISPLAY);
        assert!(!state.is_running());
    }

    #[test]
    fn sub_second_remainder_is_truncated() {
        let now = fixed_now();
        let state = CountdownState::at(Some(now + Duration::milliseconds(1_999)), now);
        assert_eq!(state.to_string(), "0j 0h 0m 1s");
    }

    #[test]
    fn deadline_label_uses_twelve_hour_clock() {
        let due = Utc.with_ymd_and_hms(2024, 11, 20, 14, 5, 0).unwrap();
        assert_eq!(deadline_label(Some(due)), "20-11-2024 02:05 PM");
        assert_eq!(deadline_label(None), NO_DEADLINE_DISPLAY);
    }
}
