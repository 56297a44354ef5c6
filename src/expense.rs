use crate::date::SimpleDate;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use std::collections::HashMap;
use std::fmt;

/// A single recorded expense. Owned by whatever store supplied it; report
/// computations treat it as a read-only view.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Expense {
    id: u64,
    user_id: Option<u64>,
    category_id: Option<u64>,
    amount: i64, // cents, non-negative
    date: SimpleDate,
    note: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(id: u64, user_id: Option<u64>, category_id: Option<u64>,
               amount: i64, date: SimpleDate, note: String) -> Expense {
        let now = Utc::now();
        Expense {
            id,
            user_id,
            category_id,
            amount,
            date,
            note,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn user_id(&self) -> Option<u64> {
        self.user_id
    }

    pub fn category_id(&self) -> Option<u64> {
        self.category_id
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn date(&self) -> &SimpleDate {
        &self.date
    }

    pub fn note(&self) -> &str {
        self.note.as_str()
    }
}

impl fmt::Display for Expense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ${} on {} [id={}]", self.note, format_amount(self.amount), self.date, self.id)
    }
}

/// An expense joined against its category and owner names. Built once per
/// batch so grouping and rendering never chase ids record by record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub category: Option<String>,
    #[serde(serialize_with = "cents_as_decimal")]
    pub amount: i64,
    pub date: SimpleDate,
    pub note: String,
}

/// Resolves category and username references for a whole batch of records
/// using prefetched lookup maps.
pub fn join_views(expenses: &[Expense],
                  categories: &HashMap<u64, String>,
                  usernames: &HashMap<u64, String>) -> Vec<ExpenseView> {
    expenses.iter()
        .map(|e| ExpenseView {
            id: e.id,
            username: e.user_id.and_then(|id| usernames.get(&id).cloned()),
            category: e.category_id.and_then(|id| categories.get(&id).cloned()),
            amount: e.amount,
            date: e.date,
            note: e.note.clone(),
        })
        .collect()
}

/// Renders cents as a plain two-decimal string, e.g. 1500 -> "15.00".
pub fn format_amount(cents: i64) -> String {
    format!("{}.{:02}", cents.abs() / 100, cents.abs() % 100)
}

pub fn cents_as_decimal<S>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format_amount(*cents))
}
