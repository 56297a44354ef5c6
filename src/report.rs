use crate::expense::{ExpenseView, cents_as_decimal};
use crate::filter::ReportType;

use serde::Serialize;

use std::collections::HashMap;

pub const UNCATEGORIZED: &str = "Uncategorized";

/// One report row, with its date already rendered for the requested
/// granularity. Rows keep the order of the filtered stream.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub date: String,
    #[serde(serialize_with = "cents_as_decimal")]
    pub amount: i64,
    pub note: String,
}

/// The aggregation unit keyed by category display name. Lives for one
/// report computation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    pub category: String,
    #[serde(serialize_with = "cents_as_decimal")]
    pub total_amount: i64,
    pub expenses: Vec<ReportEntry>,
}

/// One labeled row paired with its resolved category name, in filtered
/// order. The CSV export walks these; the summary walks the groups.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub username: Option<String>,
    pub date: String,
    pub category: String,
    pub amount: i64,
    pub note: String,
}

#[derive(Debug, Clone)]
pub struct ReportResult {
    pub rows: Vec<ReportRow>,
    pub categories: Vec<CategoryGroup>,
    pub total_expense: i64,
}

/// The structured summary consumed on screen or over the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub categories: Vec<CategoryGroup>,
    #[serde(serialize_with = "cents_as_decimal")]
    pub total_expense: i64,
}

impl ReportResult {
    pub fn into_summary(self) -> Summary {
        Summary {
            categories: self.categories,
            total_expense: self.total_expense,
        }
    }
}

/// Groups filtered views by category name, summing per-category and grand
/// totals. Records without a category land in the "Uncategorized" bucket.
/// Groups appear in first-seen order; every view lands in exactly one group.
pub fn aggregate(views: &[ExpenseView], report_type: ReportType) -> ReportResult {
    let mut rows = Vec::with_capacity(views.len());
    let mut categories: Vec<CategoryGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut total_expense = 0;

    for view in views {
        let category = view.category.clone().unwrap_or_else(|| UNCATEGORIZED.to_string());
        let date = match report_type {
            ReportType::Monthly => view.date.month_label(),
            ReportType::Daily => view.date.to_string(),
        };
        let entry = ReportEntry {
            username: view.username.clone(),
            date: date.clone(),
            amount: view.amount,
            note: view.note.clone(),
        };

        let idx = match index.get(&category) {
            Some(idx) => *idx,
            None => {
                categories.push(CategoryGroup {
                    category: category.clone(),
                    total_amount: 0,
                    expenses: Vec::new(),
                });
                index.insert(category.clone(), categories.len() - 1);
                categories.len() - 1
            }
        };
        categories[idx].total_amount += view.amount;
        categories[idx].expenses.push(entry);
        total_expense += view.amount;

        rows.push(ReportRow {
            username: view.username.clone(),
            date,
            category,
            amount: view.amount,
            note: view.note.clone(),
        });
    }

    ReportResult { rows, categories, total_expense }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::SimpleDate;

    fn view(date: SimpleDate, category: Option<&str>, amount: i64) -> ExpenseView {
        ExpenseView {
            id: 0,
            username: None,
            category: category.map(String::from),
            amount,
            date,
            note: "note".into(),
        }
    }

    #[test]
    fn groups_and_totals_match_worked_example() {
        let views = vec![
            view(SimpleDate::from_ymd(2025, 6, 1), Some("Food"), 1000),
            view(SimpleDate::from_ymd(2025, 6, 2), Some("Food"), 500),
            view(SimpleDate::from_ymd(2025, 6, 1), Some("Travel"), 2000),
        ];

        let result = aggregate(&views, ReportType::Daily);

        assert_eq!(result.categories.len(), 2);
        assert_eq!(result.categories[0].category, "Food");
        assert_eq!(result.categories[0].total_amount, 1500);
        assert_eq!(result.categories[1].category, "Travel");
        assert_eq!(result.categories[1].total_amount, 2000);
        assert_eq!(result.total_expense, 3500);
    }

    #[test]
    fn grand_total_equals_group_totals_and_row_sum() {
        let views = vec![
            view(SimpleDate::from_ymd(2025, 6, 1), Some("Food"), 137),
            view(SimpleDate::from_ymd(2025, 6, 2), None, 263),
            view(SimpleDate::from_ymd(2025, 6, 3), Some("Travel"), 9900),
            view(SimpleDate::from_ymd(2025, 6, 4), Some("Food"), 1),
        ];

        let result = aggregate(&views, ReportType::Daily);

        let group_sum: i64 = result.categories.iter().map(|g| g.total_amount).sum();
        let row_sum: i64 = result.rows.iter().map(|r| r.amount).sum();
        assert_eq!(result.total_expense, group_sum);
        assert_eq!(result.total_expense, row_sum);
    }

    #[test]
    fn every_row_lands_in_exactly_one_group() {
        let views = vec![
            view(SimpleDate::from_ymd(2025, 6, 1), Some("Food"), 100),
            view(SimpleDate::from_ymd(2025, 6, 2), Some("Travel"), 200),
            view(SimpleDate::from_ymd(2025, 6, 3), None, 300),
            view(SimpleDate::from_ymd(2025, 6, 4), Some("Food"), 400),
        ];

        let result = aggregate(&views, ReportType::Daily);

        let grouped: usize = result.categories.iter().map(|g| g.expenses.len()).sum();
        assert_eq!(grouped, views.len());
        assert_eq!(result.rows.len(), views.len());

        let mut names: Vec<&str> = result.categories.iter().map(|g| g.category.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), result.categories.len());
    }

    #[test]
    fn missing_category_becomes_uncategorized() {
        let views = vec![view(SimpleDate::from_ymd(2025, 6, 1), None, 100)];
        let result = aggregate(&views, ReportType::Daily);

        assert_eq!(result.categories[0].category, UNCATEGORIZED);
        assert_eq!(result.rows[0].category, UNCATEGORIZED);
    }

    #[test]
    fn date_labels_follow_granularity() {
        let views = vec![view(SimpleDate::from_ymd(2025, 6, 1), Some("Food"), 100)];

        let daily = aggregate(&views, ReportType::Daily);
        assert_eq!(daily.rows[0].date, "2025-06-01");

        let monthly = aggregate(&views, ReportType::Monthly);
        assert_eq!(monthly.rows[0].date, "June 2025");
        assert_eq!(monthly.categories[0].expenses[0].date, "June 2025");
    }

    #[test]
    fn summary_serializes_amounts_as_decimal_strings() {
        let views = vec![view(SimpleDate::from_ymd(2025, 6, 1), Some("Food"), 1500)];
        let summary = aggregate(&views, ReportType::Daily).into_summary();
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["totalExpense"], "15.00");
        assert_eq!(json["categories"][0]["category"], "Food");
        assert_eq!(json["categories"][0]["totalAmount"], "15.00");
        assert_eq!(json["categories"][0]["expenses"][0]["amount"], "15.00");
    }

    #[test]
    fn empty_input_produces_empty_result() {
        let result = aggregate(&[], ReportType::Monthly);
        assert!(result.rows.is_empty());
        assert!(result.categories.is_empty());
        assert_eq!(result.total_expense, 0);
    }
}
