// libs/appointment-cell/src/services/hours.rs
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use tracing::warn;

use shared_config::AppConfig;

use crate::error::BookingError;
use crate::models::{minutes_of, time_of};

/// Granularity that "now" is rounded up to on the current day.
pub const BOOKING_ROUNDING_MINUTES: u32 = 5;

const DEFAULT_DAY_START: u32 = 8 * 60;
const DEFAULT_DAY_END: u32 = 17 * 60 + 30;
const DEFAULT_SLOT_CADENCE: u32 = 30;

/// The clinic-wide daily booking window, in minutes since midnight, and the
/// cadence used to offer candidate start times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingHours {
    day_start: u32,
    day_end: u32,
    slot_cadence: u32,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            day_start: DEFAULT_DAY_START,
            day_end: DEFAULT_DAY_END,
            slot_cadence: DEFAULT_SLOT_CADENCE,
        }
    }
}

impl WorkingHours {
    pub fn new(day_start: u32, day_end: u32, slot_cadence: u32) -> Result<Self, BookingError> {
        if day_start >= day_end {
            return Err(BookingError::validation(format!(
                "working day must start before it ends ({} >= {})",
                day_start, day_end
            )));
        }
        if day_end >= 24 * 60 {
            return Err(BookingError::validation("working day must end before midnight"));
        }
        if slot_cadence == 0 {
            return Err(BookingError::validation("slot cadence must be positive"));
        }
        Ok(Self {
            day_start,
            day_end,
            slot_cadence,
        })
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            minutes_of(config.clinic_day_start),
            minutes_of(config.clinic_day_end),
            config.slot_cadence_minutes,
        )
        .unwrap_or_else(|e| {
            warn!("Invalid clinic hours in configuration ({}), using defaults", e);
            Self::default()
        })
    }

    pub fn day_start(&self) -> u32 {
        self.day_start
    }

    pub fn day_end(&self) -> u32 {
        self.day_end
    }

    pub fn slot_cadence(&self) -> u32 {
        self.slot_cadence
    }

    pub fn is_within_working_hours(&self, start: u32, end: u32) -> bool {
        start >= self.day_start && end <= self.day_end
    }

    /// Earliest start that may still be offered on `date`.
    ///
    /// Future dates open at `day_start`. On the current day "now" is rounded up
    /// to the next 5-minute boundary and never earlier than `day_start`. Past
    /// dates have no bookable start and yield `None`.
    pub fn minimum_bookable_start(&self, date: NaiveDate, now: NaiveDateTime) -> Option<u32> {
        let today = now.date();
        if date > today {
            return Some(self.day_start);
        }
        if date < today {
            return None;
        }

        let seconds = now.time().num_seconds_from_midnight();
        let step = BOOKING_ROUNDING_MINUTES * 60;
        let rounded = seconds.div_ceil(step) * BOOKING_ROUNDING_MINUTES;
        Some(rounded.max(self.day_start))
    }

    pub fn ensure_within(&self, start: u32, end: u32) -> Result<(), BookingError> {
        if self.is_within_working_hours(start, end) {
            return Ok(());
        }
        Err(BookingError::WorkingHours {
            start: clock_label(start),
            end: clock_label(end),
            day_start: clock_label(self.day_start),
            day_end: clock_label(self.day_end),
        })
    }
}

/// `HH:MM` label for a minute offset; offsets past midnight are shown as-is.
pub fn clock_label(minutes: u32) -> String {
    if minutes < 24 * 60 {
        time_of(minutes).format("%H:%M").to_string()
    } else {
        format!("{:02}:{:02}", minutes / 60, minutes % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: NaiveDate, h: u32, m: u32, s: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, s).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn default_window_is_eight_to_half_past_five() {
        let hours = WorkingHours::default();
        assert_eq!(hours.day_start(), 480);
        assert_eq!(hours.day_end(), 1050);
        assert_eq!(hours.slot_cadence(), 30);
    }

    #[test]
    fn within_working_hours_is_inclusive_at_both_edges() {
        let hours = WorkingHours::default();
        assert!(hours.is_within_working_hours(480, 510));
        assert!(hours.is_within_working_hours(1020, 1050));
        assert!(!hours.is_within_working_hours(470, 500));
        assert!(!hours.is_within_working_hours(1035, 1065));
    }

    #[test]
    fn future_dates_open_at_day_start() {
        let hours = WorkingHours::default();
        assert_eq!(hours.minimum_bookable_start(day(11), at(day(10), 16, 0, 0)), Some(480));
    }

    #[test]
    fn today_rounds_up_to_next_five_minutes() {
        let hours = WorkingHours::default();
        assert_eq!(hours.minimum_bookable_start(day(10), at(day(10), 10, 7, 0)), Some(610));
        assert_eq!(hours.minimum_bookable_start(day(10), at(day(10), 10, 10, 0)), Some(610));
        assert_eq!(hours.minimum_bookable_start(day(10), at(day(10), 10, 10, 30)), Some(615));
    }

    #[test]
    fn today_before_opening_is_floored_to_day_start() {
        let hours = WorkingHours::default();
        assert_eq!(hours.minimum_bookable_start(day(10), at(day(10), 6, 42, 0)), Some(480));
    }

    #[test]
    fn past_dates_have_no_bookable_start() {
        let hours = WorkingHours::default();
        assert_eq!(hours.minimum_bookable_start(day(9), at(day(10), 9, 0, 0)), None);
    }

    #[test]
    fn rejects_inverted_or_degenerate_windows() {
        assert!(WorkingHours::new(600, 600, 30).is_err());
        assert!(WorkingHours::new(700, 600, 30).is_err());
        assert!(WorkingHours::new(480, 1050, 0).is_err());
        assert!(WorkingHours::new(480, 1440, 30).is_err());
    }

    #[test]
    fn working_hours_error_carries_labels() {
        let err = WorkingHours::default().ensure_within(1035, 1065).unwrap_err();
        assert_eq!(
            err,
            BookingError::WorkingHours {
                start: "17:15".into(),
                end: "17:45".into(),
                day_start: "08:00".into(),
                day_end: "17:30".into(),
            }
        );
    }
}
