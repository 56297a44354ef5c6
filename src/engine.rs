use crate::csv;
use crate::date::SimpleDate;
use crate::expense::{ExpenseView, join_views};
use crate::filter::{self, ReportFilter};
use crate::range::{self, RangeError};
use crate::report::{self, ReportResult, Summary};

use log::{error, info, warn};
use serde::Serialize;

use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt;

pub const SUMMARY_FETCHED: &str = "Summary data fetched successfully.";
pub const CSV_EXPORTED: &str = "CSV export completed successfully.";
pub const EXPENSES_FETCHED: &str = "Expenses fetched successfully.";
pub const EXPENSE_NOT_FOUND: &str = "Expense not found.";
pub const GET_SUMMARY_FAILED: &str = "An error occurred while retrieving expense summary.";
pub const EXPORT_CSV_FAILED: &str = "An error occurred while exporting expenses.";
pub const GET_EXPENSES_FAILED: &str = "An error occurred while retrieving expenses.";
pub const INVALID_RANGE: &str = "Invalid report range.";

/// A collaborator failure: the store could not produce or persist what was
/// asked of it. Details are logged; callers only see a safe summary.
#[derive(Debug)]
pub struct SourceError(pub String);

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for SourceError {}

/// Supplies candidate expense records and the lookup maps for the one-shot
/// category/username join.
pub trait ExpenseSource {
    fn expenses_for_user(&self, user_id: u64) -> Result<Vec<crate::expense::Expense>, SourceError>;
    fn all_expenses(&self) -> Result<Vec<crate::expense::Expense>, SourceError>;
    fn category_names(&self) -> Result<HashMap<u64, String>, SourceError>;
    fn usernames(&self) -> Result<HashMap<u64, String>, SourceError>;
}

/// Receives the "a report was generated" event. Best-effort: the engine
/// never fails an export over a report-log error.
pub trait ReportLog {
    fn report_generated(&self, user_id: u64) -> Result<(), SourceError>;
}

/// Stable machine-checkable outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    InvalidRange,
    NotFound,
    Failed,
}

/// The envelope every report operation returns: a success flag, a status,
/// a human-readable message, optional data, and optional detail strings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome<T> {
    pub succeeded: bool,
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl<T> Outcome<T> {
    pub fn ok(data: T, message: &str) -> Outcome<T> {
        Outcome {
            succeeded: true,
            status: Status::Ok,
            message: message.to_string(),
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn invalid_range(err: RangeError) -> Outcome<T> {
        Outcome {
            succeeded: false,
            status: Status::InvalidRange,
            message: INVALID_RANGE.to_string(),
            data: None,
            errors: vec![err.to_string()],
        }
    }

    pub fn not_found(message: &str) -> Outcome<T> {
        Outcome {
            succeeded: false,
            status: Status::NotFound,
            message: message.to_string(),
            data: None,
            errors: Vec::new(),
        }
    }

    pub fn failed(message: &str) -> Outcome<T> {
        Outcome {
            succeeded: false,
            status: Status::Failed,
            message: message.to_string(),
            data: None,
            errors: Vec::new(),
        }
    }
}

/// A multi-user listing plus the requested usernames that matched nothing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredExpenses {
    pub expenses: Vec<ExpenseView>,
    pub not_found_usernames: Vec<String>,
}

/// Stateless report engine: every operation samples "today" once, validates
/// the requested range, resolves it, filters, aggregates, and renders.
pub struct ReportEngine<'a> {
    source: &'a dyn ExpenseSource,
    report_log: &'a dyn ReportLog,
}

impl<'a> ReportEngine<'a> {
    pub fn new(source: &'a dyn ExpenseSource, report_log: &'a dyn ReportLog) -> ReportEngine<'a> {
        ReportEngine { source, report_log }
    }

    /// Structured summary over one user's expenses. Text filters are never
    /// applied on the single-user path.
    pub fn user_summary(&self, user_id: u64, filter: &ReportFilter) -> Outcome<Summary> {
        info!("generating summary for user {}", user_id);
        match self.user_report(user_id, filter) {
            Ok(result) => Outcome::ok(result.into_summary(), SUMMARY_FETCHED),
            Err(reject) => reject.into_outcome(GET_SUMMARY_FAILED),
        }
    }

    /// CSV export over one user's expenses. Emits a best-effort
    /// report-generated event after the body is computed.
    pub fn user_csv(&self, user_id: u64, filter: &ReportFilter) -> Outcome<String> {
        info!("exporting CSV for user {}", user_id);
        match self.user_report(user_id, filter) {
            Ok(result) => {
                let body = csv::render(&result, false);
                self.emit_report_generated(user_id);
                Outcome::ok(body, CSV_EXPORTED)
            }
            Err(reject) => reject.into_outcome(EXPORT_CSV_FAILED),
        }
    }

    /// Structured summary across all users, honoring the request's
    /// username/category text filters.
    pub fn summary(&self, filter: &ReportFilter) -> Outcome<Summary> {
        info!("generating all-users summary");
        match self.admin_report(filter) {
            Ok(result) => Outcome::ok(result.into_summary(), SUMMARY_FETCHED),
            Err(reject) => reject.into_outcome(GET_SUMMARY_FAILED),
        }
    }

    /// CSV export across all users, with a Username column. The report-
    /// generated event is keyed by the requesting user.
    pub fn csv(&self, requesting_user: u64, filter: &ReportFilter) -> Outcome<String> {
        info!("exporting all-users CSV for user {}", requesting_user);
        match self.admin_report(filter) {
            Ok(result) => {
                let body = csv::render(&result, true);
                self.emit_report_generated(requesting_user);
                Outcome::ok(body, CSV_EXPORTED)
            }
            Err(reject) => reject.into_outcome(EXPORT_CSV_FAILED),
        }
    }

    /// Lists all users' expenses, optionally restricted to the given
    /// usernames. Requested usernames that match no record come back in
    /// `not_found_usernames`.
    pub fn expenses_for_users(&self, names: Option<&[String]>) -> Outcome<FilteredExpenses> {
        let mut views = match self.all_views() {
            Ok(views) => views,
            Err(e) => {
                error!("failed to fetch expenses: {}", e);
                return Outcome::failed(GET_EXPENSES_FAILED);
            }
        };

        let mut not_found_usernames = Vec::new();
        if let Some(names) = names {
            if !names.is_empty() {
                let known: HashSet<&str> = views.iter()
                    .filter_map(|v| v.username.as_deref())
                    .collect();
                not_found_usernames = names.iter()
                    .filter(|n| !known.contains(n.as_str()))
                    .cloned()
                    .collect();
                if !not_found_usernames.is_empty() {
                    info!("usernames not found: {}", not_found_usernames.join(", "));
                }
                views.retain(|v| v.username.as_deref().map_or(false, |u| names.iter().any(|n| n == u)));
            }
        }

        info!("fetched {} expenses, {} usernames not found", views.len(), not_found_usernames.len());
        Outcome::ok(FilteredExpenses { expenses: views, not_found_usernames }, EXPENSES_FETCHED)
    }

    /// Looks up one expense by id, scoped to its owner. A missing record or
    /// one owned by someone else is not-found, never an error.
    pub fn expense(&self, expense_id: u64, user_id: u64) -> Outcome<ExpenseView> {
        let views = match self.user_views(user_id) {
            Ok(views) => views,
            Err(e) => {
                error!("failed to fetch expense {}: {}", expense_id, e);
                return Outcome::failed(GET_EXPENSES_FAILED);
            }
        };

        match views.into_iter().find(|v| v.id == expense_id) {
            Some(view) => Outcome::ok(view, EXPENSES_FETCHED),
            None => {
                warn!("expense {} not found for user {}", expense_id, user_id);
                Outcome::not_found(EXPENSE_NOT_FOUND)
            }
        }
    }

    fn user_report(&self, user_id: u64, filter: &ReportFilter) -> Result<ReportResult, Reject> {
        let today = SimpleDate::today();
        self.check_range(filter, today)?;
        let interval = range::resolve(filter, today).map_err(Reject::Range)?;

        let views = self.user_views(user_id).map_err(Reject::Source)?;
        let views = filter::by_interval(views, &interval);
        info!("filtered down to {} expenses for user {}", views.len(), user_id);

        Ok(report::aggregate(&views, filter.report_type))
    }

    fn admin_report(&self, filter: &ReportFilter) -> Result<ReportResult, Reject> {
        let today = SimpleDate::today();
        self.check_range(filter, today)?;
        let interval = range::resolve(filter, today).map_err(Reject::Range)?;

        let views = self.all_views().map_err(Reject::Source)?;
        let views = filter::by_text(views, filter.username.as_deref(), filter.category.as_deref());
        let views = filter::by_interval(views, &interval);
        info!("filtered down to {} expenses across all users", views.len());

        Ok(report::aggregate(&views, filter.report_type))
    }

    fn check_range(&self, filter: &ReportFilter, today: SimpleDate) -> Result<(), Reject> {
        range::validate(filter, today).map_err(|e| {
            warn!("rejected report range: {}", e);
            Reject::Range(e)
        })
    }

    fn user_views(&self, user_id: u64) -> Result<Vec<ExpenseView>, SourceError> {
        let expenses = self.source.expenses_for_user(user_id)?;
        let categories = self.source.category_names()?;
        Ok(join_views(&expenses, &categories, &HashMap::new()))
    }

    fn all_views(&self) -> Result<Vec<ExpenseView>, SourceError> {
        let expenses = self.source.all_expenses()?;
        let categories = self.source.category_names()?;
        let usernames = self.source.usernames()?;
        Ok(join_views(&expenses, &categories, &usernames))
    }

    fn emit_report_generated(&self, user_id: u64) {
        if let Err(e) = self.report_log.report_generated(user_id) {
            warn!("failed to record generated report for user {}: {}", user_id, e);
        }
    }
}

enum Reject {
    Range(RangeError),
    Source(SourceError),
}

impl Reject {
    fn into_outcome<T>(self, failure_message: &str) -> Outcome<T> {
        match self {
            Reject::Range(e) => Outcome::invalid_range(e),
            Reject::Source(e) => {
                error!("{}: {}", failure_message, e);
                Outcome::failed(failure_message)
            }
        }
    }
}
