use chrono::Datelike;
use serde::{Serialize, Deserialize};

use std::error::Error;
use std::fmt;
use std::str::FromStr;

static MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// A calendar date with no time component. Ordering is calendar order
/// (field order matters for the derived impls).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimpleDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

#[derive(Debug)]
pub struct DateError(String);

impl fmt::Display for DateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for DateError {}

impl SimpleDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> SimpleDate {
        SimpleDate { year, month, day }
    }

    /// The current local date. Callers that validate and resolve a report
    /// range must sample this once and reuse it for the whole pass.
    pub fn today() -> SimpleDate {
        let now = chrono::Local::now().naive_local().date();
        SimpleDate {
            year: now.year(),
            month: now.month(),
            day: now.day(),
        }
    }

    pub fn first_of_month(year: i32, month: u32) -> SimpleDate {
        SimpleDate { year, month, day: 1 }
    }

    pub fn last_of_month(year: i32, month: u32) -> SimpleDate {
        SimpleDate { year, month, day: days_in_month(year, month) }
    }

    /// Full month name plus four-digit year, e.g. "June 2025".
    pub fn month_label(&self) -> String {
        let name = (self.month as usize)
            .checked_sub(1)
            .and_then(|i| MONTH_NAMES.get(i))
            .copied()
            .unwrap_or("Unknown");
        format!("{} {}", name, self.year)
    }
}

impl fmt::Display for SimpleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for SimpleDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<SimpleDate, DateError> {
        let mut parts = s.trim().splitn(3, '-');
        let year = next_field(&mut parts, s)?;
        let month = next_field(&mut parts, s)?;
        let day = next_field(&mut parts, s)?;
        if month < 1 || month > 12 {
            return Err(DateError(format!("invalid month in date: {}", s)));
        }
        if day < 1 || day as u32 > days_in_month(year as i32, month as u32) {
            return Err(DateError(format!("invalid day in date: {}", s)));
        }
        Ok(SimpleDate::from_ymd(year as i32, month as u32, day as u32))
    }
}

fn next_field(parts: &mut dyn Iterator<Item = &str>, original: &str) -> Result<i64, DateError> {
    parts
        .next()
        .ok_or_else(|| DateError(format!("expected YYYY-MM-DD, got: {}", original)))?
        .parse()
        .map_err(|_| DateError(format!("expected YYYY-MM-DD, got: {}", original)))
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Walks `n` months backwards from (year, month), rolling over year
/// boundaries. Returns the new (year, month).
pub fn months_back(year: i32, month: u32, n: u32) -> (i32, u32) {
    let total = year * 12 + (month as i32 - 1) - n as i32;
    (total.div_euclid(12), (total.rem_euclid(12) + 1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_calendar_order() {
        assert!(SimpleDate::from_ymd(2025, 6, 1) < SimpleDate::from_ymd(2025, 6, 2));
        assert!(SimpleDate::from_ymd(2025, 5, 31) < SimpleDate::from_ymd(2025, 6, 1));
        assert!(SimpleDate::from_ymd(2024, 12, 31) < SimpleDate::from_ymd(2025, 1, 1));
        assert_eq!(SimpleDate::from_ymd(2025, 6, 1), SimpleDate::from_ymd(2025, 6, 1));
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
    }

    #[test]
    fn months_back_rolls_over_years() {
        assert_eq!(months_back(2025, 6, 1), (2025, 5));
        assert_eq!(months_back(2025, 1, 1), (2024, 12));
        assert_eq!(months_back(2025, 2, 3), (2024, 11));
        assert_eq!(months_back(2025, 6, 0), (2025, 6));
        assert_eq!(months_back(2025, 6, 18), (2023, 12));
    }

    #[test]
    fn last_of_month() {
        assert_eq!(SimpleDate::last_of_month(2025, 6), SimpleDate::from_ymd(2025, 6, 30));
        assert_eq!(SimpleDate::last_of_month(2024, 2), SimpleDate::from_ymd(2024, 2, 29));
    }

    #[test]
    fn display_is_iso() {
        assert_eq!(SimpleDate::from_ymd(2025, 6, 1).to_string(), "2025-06-01");
        assert_eq!(SimpleDate::from_ymd(825, 11, 30).to_string(), "0825-11-30");
    }

    #[test]
    fn month_label_is_name_and_year() {
        assert_eq!(SimpleDate::from_ymd(2025, 6, 15).month_label(), "June 2025");
        assert_eq!(SimpleDate::from_ymd(2024, 12, 1).month_label(), "December 2024");
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!("2025-06-01".parse::<SimpleDate>().unwrap(), SimpleDate::from_ymd(2025, 6, 1));
        assert_eq!(" 2024-02-29 ".parse::<SimpleDate>().unwrap(), SimpleDate::from_ymd(2024, 2, 29));
        assert!("2025-13-01".parse::<SimpleDate>().is_err());
        assert!("2025-02-30".parse::<SimpleDate>().is_err());
        assert!("yesterday".parse::<SimpleDate>().is_err());
    }
}
