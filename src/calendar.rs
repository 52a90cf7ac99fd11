//! Calendar-month arithmetic over naive dates.

use chrono::{Datelike, Months, NaiveDate};

/// First day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `date` advanced by `months` calendar months. Days past the end of the
/// target month clamp to its last day (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Number of days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = first_of_month(date);
    match add_months(first, 1) {
        Some(next) => next.signed_duration_since(first).num_days() as u32,
        // December of the last representable year.
        None => 31,
    }
}

/// First-of-month dates from the month containing `start` up to and
/// including `end`.
pub fn month_starts(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(first_of_month(start)), |d| add_months(*d, 1))
        .take_while(move |d| *d <= end)
}

pub fn is_month_start(date: NaiveDate) -> bool {
    date.day() == 1
}
