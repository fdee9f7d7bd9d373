//! Day counter and calendar-date projection.
//!
//! The simulation advances in integer "sim days" starting at 0; [`Calendar`] is the pure
//! function from a sim day back to a real calendar date (for seasonal-factor lookups and
//! monthly reporting boundaries) given the run's starting date.
use chrono::{Datelike, Duration, NaiveDate};

/// Projects sim days onto calendar dates given a fixed starting date.
#[derive(Clone, Copy, Debug)]
pub struct Calendar {
    starting_date: NaiveDate,
}

impl Calendar {
    #[must_use]
    pub fn new(starting_date: NaiveDate) -> Self {
        Calendar { starting_date }
    }

    /// The calendar date corresponding to sim day `day` (day 0 == `starting_date`).
    #[must_use]
    pub fn date_of(&self, day: i32) -> NaiveDate {
        self.starting_date + Duration::days(i64::from(day))
    }

    /// The sim day count between `starting_date` and `date` (may be negative).
    #[must_use]
    pub fn day_of(&self, date: NaiveDate) -> i32 {
        (date - self.starting_date).num_days() as i32
    }

    /// Day-of-year (1-based, ignoring leap-day offsets) for the given sim day. Used by birthday
    /// scheduling and seasonal-factor lookups, which key on calendar day-of-year rather than
    /// absolute date.
    #[must_use]
    pub fn day_of_year(&self, day: i32) -> u32 {
        self.date_of(day).ordinal()
    }

    /// True when `day` is the first sim day of a calendar month — the cadence
    /// `ReporterBus::monthly_report` fires on.
    #[must_use]
    pub fn is_month_boundary(&self, day: i32) -> bool {
        self.date_of(day).day() == 1
    }

    #[must_use]
    pub fn starting_date(&self) -> NaiveDate {
        self.starting_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_of_round_trips_through_day_of() {
        let calendar = Calendar::new(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(calendar.date_of(0), calendar.starting_date());
        assert_eq!(
            calendar.date_of(31),
            NaiveDate::from_ymd_opt(2000, 2, 1).unwrap()
        );
        assert_eq!(calendar.day_of(calendar.date_of(365)), 365);
    }

    #[test]
    fn month_boundary_detection() {
        let calendar = Calendar::new(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert!(calendar.is_month_boundary(0));
        assert!(!calendar.is_month_boundary(1));
        assert!(calendar.is_month_boundary(31));
    }
}
