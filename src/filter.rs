use crate::date::SimpleDate;
use crate::expense::ExpenseView;
use crate::range::ResolvedInterval;

use serde::{Serialize, Deserialize};

/// Whether a report buckets by exact day or by calendar month.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    Daily,
    Monthly,
}

/// Which algorithm produces the monthly interval.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeType {
    LastMonth,
    Last3Months,
    Custom,
}

impl Default for ReportType {
    fn default() -> ReportType {
        ReportType::Daily
    }
}

impl Default for RangeType {
    fn default() -> RangeType {
        RangeType::LastMonth
    }
}

/// A report request as supplied by the caller. Exactly one of the explicit
/// date pair or the month/year quadruple is meaningful, governed by
/// `report_type` and `range_type`; the rest is ignored by that branch.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportFilter {
    pub report_type: ReportType,
    pub range_type: RangeType,
    pub start_date: Option<SimpleDate>,
    pub end_date: Option<SimpleDate>,
    pub start_month: Option<u32>,
    pub start_year: Option<i32>,
    pub end_month: Option<u32>,
    pub end_year: Option<i32>,
    pub username: Option<String>,
    pub category: Option<String>,
}

impl ReportFilter {
    /// Trims the free-text filters once at the boundary; whitespace-only
    /// filters collapse to none. Must run before validation.
    pub fn normalize(&mut self) {
        self.username = take_trimmed(&mut self.username);
        self.category = take_trimmed(&mut self.category);
    }
}

fn take_trimmed(field: &mut Option<String>) -> Option<String> {
    field.take().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Keeps views whose date falls inside the inclusive interval. An absent
/// bound is unconstrained on that side.
pub fn by_interval(views: Vec<ExpenseView>, interval: &ResolvedInterval) -> Vec<ExpenseView> {
    views.into_iter()
        .filter(|v| interval.contains(&v.date))
        .collect()
}

/// Case-insensitive substring match on username and/or category name.
/// Views with no username or category never match a non-empty filter on
/// that field.
pub fn by_text(views: Vec<ExpenseView>,
               username: Option<&str>,
               category: Option<&str>) -> Vec<ExpenseView> {
    let username = username.map(str::to_lowercase);
    let category = category.map(str::to_lowercase);

    views.into_iter()
        .filter(|v| matches_filter(v.username.as_deref(), username.as_deref()))
        .filter(|v| matches_filter(v.category.as_deref(), category.as_deref()))
        .collect()
}

fn matches_filter(value: Option<&str>, filter: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(f) => value.map_or(false, |v| v.to_lowercase().contains(f)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(date: SimpleDate, username: Option<&str>, category: Option<&str>) -> ExpenseView {
        ExpenseView {
            id: 0,
            username: username.map(String::from),
            category: category.map(String::from),
            amount: 100,
            date,
            note: "note".into(),
        }
    }

    #[test]
    fn normalize_trims_and_drops_blank_filters() {
        let mut filter = ReportFilter {
            username: Some("  alice  ".into()),
            category: Some("   ".into()),
            ..ReportFilter::default()
        };
        filter.normalize();

        assert_eq!(filter.username.as_deref(), Some("alice"));
        assert!(filter.category.is_none());
    }

    #[test]
    fn interval_bounds_are_inclusive() {
        let interval = ResolvedInterval {
            from: Some(SimpleDate::from_ymd(2025, 6, 1)),
            to: Some(SimpleDate::from_ymd(2025, 6, 2)),
        };
        let views = vec![
            view(SimpleDate::from_ymd(2025, 5, 31), None, None),
            view(SimpleDate::from_ymd(2025, 6, 1), None, None),
            view(SimpleDate::from_ymd(2025, 6, 2), None, None),
            view(SimpleDate::from_ymd(2025, 6, 3), None, None),
        ];

        let kept = by_interval(views, &interval);
        let dates: Vec<String> = kept.iter().map(|v| v.date.to_string()).collect();

        assert_eq!(dates, vec!["2025-06-01", "2025-06-02"]);
    }

    #[test]
    fn absent_bounds_are_unconstrained() {
        let views = vec![
            view(SimpleDate::from_ymd(1925, 1, 1), None, None),
            view(SimpleDate::from_ymd(2025, 6, 1), None, None),
        ];

        let all = by_interval(views.clone(), &ResolvedInterval { from: None, to: None });
        assert_eq!(all.len(), 2);

        let lower_only = by_interval(views, &ResolvedInterval {
            from: Some(SimpleDate::from_ymd(2000, 1, 1)),
            to: None,
        });
        assert_eq!(lower_only.len(), 1);
        assert_eq!(lower_only[0].date, SimpleDate::from_ymd(2025, 6, 1));
    }

    #[test]
    fn text_filters_match_substrings_case_insensitively() {
        let views = vec![
            view(SimpleDate::from_ymd(2025, 6, 1), Some("Alice"), Some("Food")),
            view(SimpleDate::from_ymd(2025, 6, 1), Some("bob"), Some("Travel")),
            view(SimpleDate::from_ymd(2025, 6, 1), None, None),
        ];

        let kept = by_text(views.clone(), Some("ALI"), None);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].username.as_deref(), Some("Alice"));

        let kept = by_text(views.clone(), None, Some("rav"));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].category.as_deref(), Some("Travel"));

        let kept = by_text(views, None, None);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn uncategorized_rows_fail_category_filters() {
        let views = vec![view(SimpleDate::from_ymd(2025, 6, 1), None, None)];
        assert!(by_text(views, None, Some("food")).is_empty());
    }
}
