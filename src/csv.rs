use crate::expense::format_amount;
use crate::report::ReportResult;

const USER_HEADER: &str = "\"Date\",\"Category\",\"Amount\",\"Note\"";
const ADMIN_HEADER: &str = "\"Username\",\"Date\",\"Category\",\"Amount\",\"Note\"";

/// Renders a report as delimited text: one row per filtered record in
/// filtered order, then per-category subtotals, then the grand total. The
/// `Username` column only appears on multi-user exports.
pub fn render(result: &ReportResult, multi_user: bool) -> String {
    let mut out = String::new();

    out.push_str(if multi_user { ADMIN_HEADER } else { USER_HEADER });
    out.push('\n');

    for row in &result.rows {
        if multi_user {
            out.push_str(&quote(row.username.as_deref().unwrap_or("Unknown")));
            out.push(',');
        }
        out.push_str(&quote(&row.date));
        out.push(',');
        out.push_str(&quote(&row.category));
        out.push(',');
        out.push_str(&quote(&format_amount(row.amount)));
        out.push(',');
        out.push_str(&quote(&row.note));
        out.push('\n');
    }

    out.push('\n');
    out.push_str("\"--- Category Totals ---\"\n");
    out.push_str("\"Category\",\"Total Amount\"\n");
    for group in &result.categories {
        out.push_str(&quote(&group.category));
        out.push(',');
        out.push_str(&quote(&format_amount(group.total_amount)));
        out.push('\n');
    }

    out.push('\n');
    out.push_str("\"Total Expense:\",");
    out.push_str(&quote(&format_amount(result.total_expense)));
    out.push('\n');

    out
}

/// Wraps a field in quotes, doubling any embedded quote characters.
/// Whitespace-only input collapses to an empty quoted field.
fn quote(field: &str) -> String {
    if field.trim().is_empty() {
        return "\"\"".to_string();
    }
    format!("\"{}\"", field.replace('"', "\"\""))
}
