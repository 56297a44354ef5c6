use crate::date::{SimpleDate, months_back};
use crate::filter::{RangeType, ReportFilter, ReportType};

use serde::Serialize;

use std::error::Error;
use std::fmt;

/// Why a requested reporting range was rejected. Always recoverable by the
/// caller adjusting the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeError {
    StartDateInFuture,
    EndDateInFuture,
    StartAfterEnd,
    CustomRangeIncomplete,
    StartMonthInFuture,
    EndMonthInFuture,
    StartMonthAfterEndMonth,
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let message = match self {
            RangeError::StartDateInFuture => "Start date cannot be in the future.",
            RangeError::EndDateInFuture => "End date cannot be in the future.",
            RangeError::StartAfterEnd => "Start date cannot be greater than end date.",
            RangeError::CustomRangeIncomplete => "Start and end month/year must be provided for custom monthly reports.",
            RangeError::StartMonthInFuture => "Start month cannot be in the future.",
            RangeError::EndMonthInFuture => "End month cannot be in the future.",
            RangeError::StartMonthAfterEndMonth => "Start month cannot be greater than end month.",
        };
        write!(f, "{}", message)
    }
}

impl Error for RangeError {}

/// The concrete inclusive [from, to] pair used for filtering. An absent
/// bound means that side is unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedInterval {
    pub from: Option<SimpleDate>,
    pub to: Option<SimpleDate>,
}

impl ResolvedInterval {
    pub fn contains(&self, date: &SimpleDate) -> bool {
        if let Some(from) = &self.from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = &self.to {
            if date > to {
                return false;
            }
        }
        true
    }
}

/// Checks the branch of the request selected by its report and range type.
/// Summary and export paths both call this before resolving, with the same
/// `today` they pass to `resolve`.
pub fn validate(filter: &ReportFilter, today: SimpleDate) -> Result<(), RangeError> {
    match filter.report_type {
        ReportType::Daily => {
            if let Some(start) = filter.start_date {
                if start > today {
                    return Err(RangeError::StartDateInFuture);
                }
            }
            if let Some(end) = filter.end_date {
                if end > today {
                    return Err(RangeError::EndDateInFuture);
                }
            }
            if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
                if start > end {
                    return Err(RangeError::StartAfterEnd);
                }
            }
        }
        ReportType::Monthly if filter.range_type == RangeType::Custom => {
            let (start_month, start_year, end_month, end_year) = custom_range(filter)?;
            let start = SimpleDate::first_of_month(start_year, start_month);
            let end = SimpleDate::last_of_month(end_year, end_month);

            if start > today {
                return Err(RangeError::StartMonthInFuture);
            }
            // Future-month check compares year then month, never the day: an
            // end month equal to the current month is valid even though its
            // last day may still be ahead of today.
            if (end_year, end_month) > (today.year, today.month) {
                return Err(RangeError::EndMonthInFuture);
            }
            if start > end {
                return Err(RangeError::StartMonthAfterEndMonth);
            }
        }
        // LastMonth and Last3Months are backward-looking by construction.
        ReportType::Monthly => {}
    }

    Ok(())
}

/// Turns the request into a concrete interval, relative to `today` at the
/// moment of resolution. An incomplete custom range is an error here too,
/// so filtering can never run against a silently unbounded range.
pub fn resolve(filter: &ReportFilter, today: SimpleDate) -> Result<ResolvedInterval, RangeError> {
    match filter.report_type {
        ReportType::Daily => Ok(ResolvedInterval {
            from: filter.start_date,
            to: filter.end_date,
        }),
        ReportType::Monthly => {
            let (from, to) = match filter.range_type {
                RangeType::LastMonth => {
                    let (year, month) = months_back(today.year, today.month, 1);
                    (SimpleDate::first_of_month(year, month), SimpleDate::last_of_month(year, month))
                }
                RangeType::Last3Months => {
                    let (year, month) = months_back(today.year, today.month, 3);
                    (SimpleDate::first_of_month(year, month), SimpleDate::last_of_month(today.year, today.month))
                }
                RangeType::Custom => {
                    let (start_month, start_year, end_month, end_year) = custom_range(filter)?;
                    let from = SimpleDate::first_of_month(start_year, start_month);
                    let to = if end_year == today.year && end_month == today.month {
                        // Partial current month: stop at today, not at the
                        // month's last day.
                        today
                    } else {
                        SimpleDate::last_of_month(end_year, end_month)
                    };
                    (from, to)
                }
            };
            Ok(ResolvedInterval { from: Some(from), to: Some(to) })
        }
    }
}

fn custom_range(filter: &ReportFilter) -> Result<(u32, i32, u32, i32), RangeError> {
    match (filter.start_month, filter.start_year, filter.end_month, filter.end_year) {
        (Some(sm), Some(sy), Some(em), Some(ey)) => Ok((sm, sy, em, ey)),
        _ => Err(RangeError::CustomRangeIncomplete),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily(start: Option<SimpleDate>, end: Option<SimpleDate>) -> ReportFilter {
        ReportFilter {
            report_type: ReportType::Daily,
            start_date: start,
            end_date: end,
            ..ReportFilter::default()
        }
    }

    fn monthly(range_type: RangeType) -> ReportFilter {
        ReportFilter {
            report_type: ReportType::Monthly,
            range_type,
            ..ReportFilter::default()
        }
    }

    fn custom(sm: u32, sy: i32, em: u32, ey: i32) -> ReportFilter {
        ReportFilter {
            start_month: Some(sm),
            start_year: Some(sy),
            end_month: Some(em),
            end_year: Some(ey),
            ..monthly(RangeType::Custom)
        }
    }

    const TODAY: SimpleDate = SimpleDate { year: 2025, month: 6, day: 15 };

    #[test]
    fn valid_daily_range_resolves_to_itself() {
        let start = SimpleDate::from_ymd(2025, 6, 1);
        let end = SimpleDate::from_ymd(2025, 6, 2);
        let filter = daily(Some(start), Some(end));

        assert!(validate(&filter, TODAY).is_ok());
        let interval = resolve(&filter, TODAY).unwrap();
        assert_eq!(interval, ResolvedInterval { from: Some(start), to: Some(end) });
    }

    #[test]
    fn daily_missing_dates_are_not_errors() {
        let filter = daily(None, None);
        assert!(validate(&filter, TODAY).is_ok());
        assert_eq!(resolve(&filter, TODAY).unwrap(), ResolvedInterval { from: None, to: None });
    }

    #[test]
    fn daily_future_dates_are_rejected() {
        let tomorrow = SimpleDate::from_ymd(2025, 6, 16);
        assert_eq!(validate(&daily(Some(tomorrow), None), TODAY), Err(RangeError::StartDateInFuture));
        assert_eq!(validate(&daily(None, Some(tomorrow)), TODAY), Err(RangeError::EndDateInFuture));
    }

    #[test]
    fn daily_start_after_end_is_rejected() {
        let filter = daily(Some(SimpleDate::from_ymd(2025, 6, 10)), Some(SimpleDate::from_ymd(2025, 6, 1)));
        assert_eq!(validate(&filter, TODAY), Err(RangeError::StartAfterEnd));
    }

    #[test]
    fn last_month_spans_the_previous_calendar_month() {
        let filter = monthly(RangeType::LastMonth);
        assert!(validate(&filter, TODAY).is_ok());

        let interval = resolve(&filter, TODAY).unwrap();
        assert_eq!(interval.from, Some(SimpleDate::from_ymd(2025, 5, 1)));
        assert_eq!(interval.to, Some(SimpleDate::from_ymd(2025, 5, 31)));
    }

    #[test]
    fn last_month_rolls_over_january() {
        let january = SimpleDate::from_ymd(2025, 1, 3);
        let interval = resolve(&monthly(RangeType::LastMonth), january).unwrap();
        assert_eq!(interval.from, Some(SimpleDate::from_ymd(2024, 12, 1)));
        assert_eq!(interval.to, Some(SimpleDate::from_ymd(2024, 12, 31)));
    }

    #[test]
    fn last_3_months_runs_through_the_current_month() {
        let interval = resolve(&monthly(RangeType::Last3Months), TODAY).unwrap();
        assert_eq!(interval.from, Some(SimpleDate::from_ymd(2025, 3, 1)));
        assert_eq!(interval.to, Some(SimpleDate::from_ymd(2025, 6, 30)));
    }

    #[test]
    fn custom_range_uses_month_boundaries() {
        let filter = custom(2, 2025, 4, 2025);
        assert!(validate(&filter, TODAY).is_ok());

        let interval = resolve(&filter, TODAY).unwrap();
        assert_eq!(interval.from, Some(SimpleDate::from_ymd(2025, 2, 1)));
        assert_eq!(interval.to, Some(SimpleDate::from_ymd(2025, 4, 30)));
    }

    #[test]
    fn custom_range_ending_in_current_month_stops_at_today() {
        let filter = custom(4, 2025, 6, 2025);
        assert!(validate(&filter, TODAY).is_ok());

        let interval = resolve(&filter, TODAY).unwrap();
        assert_eq!(interval.to, Some(TODAY));
    }

    #[test]
    fn current_end_month_is_never_future_even_before_month_end() {
        // The computed last day (June 30) is after TODAY (June 15), but the
        // comparison is by year and month only.
        let filter = custom(6, 2025, 6, 2025);
        assert!(validate(&filter, TODAY).is_ok());
    }

    #[test]
    fn incomplete_custom_range_is_rejected_everywhere() {
        let filter = ReportFilter {
            end_year: None,
            ..custom(1, 2025, 3, 2025)
        };

        assert_eq!(validate(&filter, TODAY), Err(RangeError::CustomRangeIncomplete));
        assert_eq!(resolve(&filter, TODAY), Err(RangeError::CustomRangeIncomplete));
    }

    #[test]
    fn future_custom_months_are_rejected() {
        assert_eq!(validate(&custom(7, 2025, 8, 2025), TODAY), Err(RangeError::StartMonthInFuture));
        assert_eq!(validate(&custom(5, 2025, 7, 2025), TODAY), Err(RangeError::EndMonthInFuture));
        assert_eq!(validate(&custom(5, 2025, 8, 2026), TODAY), Err(RangeError::EndMonthInFuture));
    }

    #[test]
    fn custom_start_after_end_is_rejected() {
        assert_eq!(validate(&custom(5, 2025, 3, 2025), TODAY), Err(RangeError::StartMonthAfterEndMonth));
    }
}
