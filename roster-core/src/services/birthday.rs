//! Birthday Notifier
//!
//! Members whose birthday (month/day, year ignored) falls within a rolling
//! window around a reference day. The window wraps month and year ends.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use shared::backend::RowStore;
use shared::error::AppResult;
use shared::models::Member;

use crate::db::repository::member as repo;
use crate::utils::time::parse_storage_date;

/// Default half-width of the window in days
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Non-leap year used to place month/day pairs on a circle
const REFERENCE_YEAR: i32 = 2001;
const DAYS_IN_YEAR: i32 = 365;

/// Zero-based position of a month/day within the reference year
///
/// Feb 29 lands on Mar 1.
fn day_of_year(month: u32, day: u32) -> Option<i32> {
    let (month, day) = if month == 2 && day == 29 { (3, 1) } else { (month, day) };
    NaiveDate::from_ymd_opt(REFERENCE_YEAR, month, day).map(|d| d.ordinal0() as i32)
}

/// `±days` around a reference month/day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthdayWindow {
    pub days: u32,
}

impl Default for BirthdayWindow {
    fn default() -> Self {
        Self {
            days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl BirthdayWindow {
    pub fn new(days: u32) -> Self {
        Self { days }
    }

    /// Signed distance in days from `as_of` to the birthday, in `[-182, 182]`
    pub fn offset(birth: NaiveDate, as_of: NaiveDate) -> i32 {
        let (Some(b), Some(a)) = (
            day_of_year(birth.month(), birth.day()),
            day_of_year(as_of.month(), as_of.day()),
        ) else {
            return i32::MAX;
        };

        let diff = (b - a).rem_euclid(DAYS_IN_YEAR);
        if diff > DAYS_IN_YEAR / 2 { diff - DAYS_IN_YEAR } else { diff }
    }

    pub fn contains(&self, birth: NaiveDate, as_of: NaiveDate) -> bool {
        Self::offset(birth, as_of).unsigned_abs() <= self.days
    }
}

pub struct BirthdayNotifier {
    store: Arc<dyn RowStore>,
    function: String,
    window: BirthdayWindow,
}

impl BirthdayNotifier {
    pub fn new(store: Arc<dyn RowStore>, function: impl Into<String>, window: BirthdayWindow) -> Self {
        Self {
            store,
            function: function.into(),
            window,
        }
    }

    pub fn window(&self) -> BirthdayWindow {
        self.window
    }

    /// Members with a birthday near `as_of`, nearest first
    ///
    /// Asks the aggregate with month and day only; rows without a usable
    /// birth date or outside the window are dropped.
    pub async fn compute_upcoming(&self, as_of: NaiveDate) -> AppResult<Vec<Member>> {
        let rows = repo::upcoming_birthdays(self.store.as_ref(), &self.function, as_of.month(), as_of.day())
            .await
            .map_err(|e| e.into_query_error())?;

        let received = rows.len();
        let mut upcoming: Vec<(i32, Member)> = rows
            .into_iter()
            .filter_map(|member| {
                let birth = member.birthday.as_deref().and_then(parse_storage_date)?;
                self.window
                    .contains(birth, as_of)
                    .then(|| (BirthdayWindow::offset(birth, as_of), member))
            })
            .collect();

        upcoming.sort_by(|(a_off, a), (b_off, b)| {
            a_off.cmp(b_off).then_with(|| a.full_name.cmp(&b.full_name))
        });

        if upcoming.len() != received {
            tracing::debug!(received, kept = upcoming.len(), "Birthday rows outside window dropped");
        }
        Ok(upcoming.into_iter().map(|(_, member)| member).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_offset_wraps_year_end() {
        let as_of = ymd(2024, 12, 28);
        assert_eq!(BirthdayWindow::offset(ymd(1990, 1, 3), as_of), 6);
        assert_eq!(BirthdayWindow::offset(ymd(1985, 12, 14), as_of), -14);
        assert_eq!(BirthdayWindow::offset(ymd(1970, 12, 21), as_of), -7);
        assert_eq!(BirthdayWindow::offset(ymd(1970, 12, 28), as_of), 0);
    }

    #[test]
    fn test_window_contains() {
        let window = BirthdayWindow::default();
        let as_of = ymd(2024, 12, 28);
        assert!(window.contains(ymd(1990, 1, 3), as_of));
        assert!(window.contains(ymd(2010, 1, 3), as_of));
        assert!(!window.contains(ymd(1985, 12, 14), as_of));
        assert!(window.contains(ymd(1970, 12, 21), as_of));
        assert!(!window.contains(ymd(1970, 12, 20), as_of));
    }

    #[test]
    fn test_leap_day_birthday_in_window() {
        let window = BirthdayWindow::new(0);
        assert!(window.contains(ymd(2000, 2, 29), ymd(2023, 3, 1)));
        assert!(!window.contains(ymd(2000, 2, 29), ymd(2023, 2, 28)));
    }

    #[test]
    fn test_offset_is_bounded() {
        let as_of = ymd(2024, 6, 15);
        let mut day = ymd(2001, 1, 1);
        while day.year() == 2001 {
            let off = BirthdayWindow::offset(day, as_of);
            assert!((-182..=182).contains(&off));
            day = day.succ_opt().unwrap();
        }
    }
}
