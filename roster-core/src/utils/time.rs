//! Date and age utilities
//!
//! Birth dates travel in two shapes:
//! - display form `DD-MM-YYYY` (what people type; `/` and spaces tolerated)
//! - storage form `YYYY-MM-DD` (what the row store keeps)
//!
//! Age is derived from the display form against a reference day.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use shared::error::{AppError, ErrorCode};
use shared::models::NOT_AVAILABLE;
use thiserror::Error;

/// Ages outside `1..=MAX_AGE` are reported as 0 (unknown)
pub const MAX_AGE: i32 = 150;

const STORAGE_FORMAT: &str = "%Y-%m-%d";
const DISPLAY_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("Expected day-month-year, got '{0}'")]
    Malformed(String),

    #[error("'{0}' is not a calendar date")]
    InvalidDate(String),
}

impl From<DateError> for AppError {
    fn from(err: DateError) -> Self {
        let input = match &err {
            DateError::Malformed(s) | DateError::InvalidDate(s) => s.clone(),
        };
        AppError::with_message(ErrorCode::InvalidBirthDate, err.to_string()).with_detail("input", input)
    }
}

/// Split a date string into three numeric components
fn numeric_parts(input: &str) -> Result<[u32; 3], DateError> {
    let parts: Vec<&str> = input
        .split(['-', '/', ' '])
        .filter(|p| !p.is_empty())
        .collect();

    if parts.len() != 3 {
        return Err(DateError::Malformed(input.to_string()));
    }

    let mut out = [0u32; 3];
    for (slot, part) in out.iter_mut().zip(&parts) {
        if !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(DateError::Malformed(input.to_string()));
        }
        *slot = part
            .parse()
            .map_err(|_| DateError::Malformed(input.to_string()))?;
    }
    Ok(out)
}

fn is_iso_shaped(input: &str) -> bool {
    input
        .split('-')
        .next()
        .is_some_and(|year| year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()))
}

/// Parse a display-form date (`DD-MM-YYYY`)
pub fn parse_display_date(display: &str) -> Result<NaiveDate, DateError> {
    let trimmed = display.trim();
    let [day, month, year] = numeric_parts(trimmed)?;
    NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| DateError::InvalidDate(trimmed.to_string()))
}

/// Display form → storage form
///
/// Input already in storage form is returned unchanged.
pub fn to_storage_format(display: &str) -> Result<String, DateError> {
    let trimmed = display.trim();

    if is_iso_shaped(trimmed) {
        return NaiveDate::parse_from_str(trimmed, STORAGE_FORMAT)
            .map(|date| date.format(STORAGE_FORMAT).to_string())
            .map_err(|_| DateError::InvalidDate(trimmed.to_string()));
    }

    parse_display_date(trimmed).map(|date| date.format(STORAGE_FORMAT).to_string())
}

/// Parse a storage-form date; timestamps are cut to their date part
pub fn parse_storage_date(stored: &str) -> Option<NaiveDate> {
    let stored = stored.trim();
    let date_part = stored.get(..10).unwrap_or(stored);
    NaiveDate::parse_from_str(date_part, STORAGE_FORMAT).ok()
}

/// Storage form → display form, `N/A` when absent or unparseable
pub fn to_display_format(stored: Option<&str>) -> String {
    stored
        .and_then(parse_storage_date)
        .map(|date| date.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Month/day on which a birthday is observed in `year`
///
/// Feb 29 is observed on Mar 1 in non-leap years.
pub fn observed_anniversary(birth: NaiveDate, year: i32) -> (u32, u32) {
    if birth.month() == 2 && birth.day() == 29 && NaiveDate::from_ymd_opt(year, 2, 29).is_none() {
        (3, 1)
    } else {
        (birth.month(), birth.day())
    }
}

/// Whole years between `birth` and `today`; 0 outside `1..=150`
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < observed_anniversary(birth, today.year()) {
        years -= 1;
    }

    if !(0..=MAX_AGE).contains(&years) {
        return 0;
    }
    years as u32
}

/// Age from a display-form birth date; 0 when the date cannot be parsed
pub fn compute_age(display: &str, today: NaiveDate) -> u32 {
    match parse_display_date(display) {
        Ok(birth) => age_on(birth, today),
        Err(_) => 0,
    }
}

/// Current calendar day in the business time zone
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Source of "today" for age and birthday computations
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the business time zone
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    pub tz: Tz,
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        today_in(self.tz)
    }
}

/// Clock pinned to one day
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Local midnight of `date` as a UTC instant
///
/// DST gap fallback: if local midnight does not exist, UTC midnight is used.
pub fn day_start(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    naive
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// Local midnight of the following day (exclusive end of `date`)
pub fn day_end(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    day_start(date.succ_opt().unwrap_or(date), tz)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_to_storage_format_separators() {
        assert_eq!(to_storage_format("03-01-1990").unwrap(), "1990-01-03");
        assert_eq!(to_storage_format("3/1/1990").unwrap(), "1990-01-03");
        assert_eq!(to_storage_format("3 1 1990").unwrap(), "1990-01-03");
        assert_eq!(to_storage_format(" 14 / 12 / 1985 ").unwrap(), "1985-12-14");
    }

    #[test]
    fn test_to_storage_format_is_idempotent() {
        assert_eq!(to_storage_format("1990-01-03").unwrap(), "1990-01-03");
        assert_eq!(to_storage_format("1990-1-3").unwrap(), "1990-01-03");
        let once = to_storage_format("29-02-2000").unwrap();
        assert_eq!(to_storage_format(&once).unwrap(), once);
    }

    #[test]
    fn test_to_storage_format_rejects_garbage() {
        assert!(matches!(to_storage_format("kemarin"), Err(DateError::Malformed(_))));
        assert!(matches!(to_storage_format("01-1990"), Err(DateError::Malformed(_))));
        assert!(matches!(to_storage_format("aa-bb-cccc"), Err(DateError::Malformed(_))));
        assert!(matches!(to_storage_format("31-02-1990"), Err(DateError::InvalidDate(_))));
        assert!(matches!(to_storage_format("29-02-2001"), Err(DateError::InvalidDate(_))));
        assert!(matches!(to_storage_format("1990-13-01"), Err(DateError::InvalidDate(_))));
    }

    #[test]
    fn test_date_error_maps_to_format_category() {
        let err: AppError = to_storage_format("xx").unwrap_err().into();
        assert_eq!(err.code, ErrorCode::InvalidBirthDate);
        assert_eq!(err.category(), shared::error::ErrorCategory::Format);
        assert_eq!(err.detail("input").unwrap(), "xx");
    }

    #[test]
    fn test_display_round_trip() {
        for display in ["01-01-2000", "29-02-2000", "31-12-1999", "03-01-1990", "15-08-1945"] {
            let stored = to_storage_format(display).unwrap();
            assert_eq!(to_display_format(Some(&stored)), display);
        }
    }

    #[test]
    fn test_to_display_format_sentinel() {
        assert_eq!(to_display_format(None), NOT_AVAILABLE);
        assert_eq!(to_display_format(Some("")), NOT_AVAILABLE);
        assert_eq!(to_display_format(Some("not a date")), NOT_AVAILABLE);
        assert_eq!(to_display_format(Some("2000-02-29T00:00:00")), "29-02-2000");
    }

    #[test]
    fn test_compute_age_anniversary() {
        assert_eq!(compute_age("03-01-1990", ymd(2024, 1, 2)), 33);
        assert_eq!(compute_age("03-01-1990", ymd(2024, 1, 3)), 34);
        assert_eq!(compute_age("03-01-1990", ymd(2024, 12, 31)), 34);
    }

    #[test]
    fn test_compute_age_leap_day() {
        assert_eq!(compute_age("29-02-2000", ymd(2023, 2, 28)), 22);
        assert_eq!(compute_age("29-02-2000", ymd(2023, 3, 1)), 23);
        assert_eq!(compute_age("29-02-2000", ymd(2024, 2, 28)), 23);
        assert_eq!(compute_age("29-02-2000", ymd(2024, 2, 29)), 24);
    }

    #[test]
    fn test_compute_age_sentinels() {
        // future birth date
        assert_eq!(compute_age("01-01-2030", ymd(2024, 1, 1)), 0);
        // older than 150 years
        assert_eq!(compute_age("01-01-1800", ymd(2024, 1, 1)), 0);
        assert_eq!(compute_age("garbage", ymd(2024, 1, 1)), 0);
        assert_eq!(compute_age("01-01-1874", ymd(2024, 1, 1)), 150);
    }

    #[test]
    fn test_compute_age_monotonic_across_anniversary() {
        let birth = "10-06-1980";
        let mut previous = 0;
        let mut day = ymd(2020, 1, 1);
        while day < ymd(2023, 1, 1) {
            let age = compute_age(birth, day);
            assert!(age >= previous);
            assert!(age <= MAX_AGE as u32);
            previous = age;
            day = day.succ_opt().unwrap();
        }
        assert_eq!(previous, 42);
    }

    #[test]
    fn test_day_bounds_in_jakarta() {
        let tz: Tz = "Asia/Jakarta".parse().unwrap();
        let start = day_start(ymd(2024, 5, 1), tz);
        let end = day_end(ymd(2024, 5, 1), tz);
        assert_eq!(start.to_rfc3339(), "2024-04-30T17:00:00+00:00");
        assert_eq!((end - start).num_hours(), 24);
    }
}
