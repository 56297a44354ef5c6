mod csv;
mod date;
mod engine;
mod expense;
mod filter;
mod range;
mod report;
mod store;

use crate::date::SimpleDate;
use crate::engine::{Outcome, ReportEngine};
use crate::expense::{Expense, format_amount};
use crate::filter::{RangeType, ReportFilter, ReportType};
use crate::report::Summary;
use crate::store::{Category, JsonStore, User};

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use colored::Colorize;

use std::error::Error;
use std::fmt;

#[derive(Debug)]
struct CliError(String);

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for CliError {}

fn main() {
    env_logger::init();

    let filter_args = [
        Arg::with_name("type")
            .long("type")
            .takes_value(true)
            .possible_values(&["daily", "monthly"])
            .default_value("daily")
            .help("report granularity"),
        Arg::with_name("range")
            .long("range")
            .takes_value(true)
            .possible_values(&["last-month", "last-3-months", "custom"])
            .default_value("last-month")
            .help("monthly range selection"),
        Arg::with_name("start-date").long("start-date").takes_value(true).help("YYYY-MM-DD"),
        Arg::with_name("end-date").long("end-date").takes_value(true).help("YYYY-MM-DD"),
        Arg::with_name("start-month").long("start-month").takes_value(true),
        Arg::with_name("start-year").long("start-year").takes_value(true),
        Arg::with_name("end-month").long("end-month").takes_value(true),
        Arg::with_name("end-year").long("end-year").takes_value(true),
        Arg::with_name("user").long("user").takes_value(true).help("report on this user only"),
        Arg::with_name("match-user").long("match-user").takes_value(true)
            .help("all-users reports: keep usernames containing this text"),
        Arg::with_name("match-category").long("match-category").takes_value(true)
            .help("all-users reports: keep categories containing this text"),
    ];

    let matches = App::new("outlay")
        .version("0.2.0")
        .about("A simple command-line expense tracker with filtered summaries and CSV reports")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(Arg::with_name("file")
             .short("f")
             .long("file")
             .takes_value(true)
             .default_value("outlay.json")
             .help("path to the datafile"))
        .subcommand(SubCommand::with_name("init")
            .about("create an empty datafile"))
        .subcommand(SubCommand::with_name("add")
            .about("record an expense")
            .arg(Arg::with_name("user").long("user").takes_value(true).required(true))
            .arg(Arg::with_name("category").long("category").takes_value(true))
            .arg(Arg::with_name("amount").long("amount").takes_value(true).required(true))
            .arg(Arg::with_name("date").long("date").takes_value(true).required(true).help("YYYY-MM-DD"))
            .arg(Arg::with_name("note").long("note").takes_value(true).default_value("")))
        .subcommand(SubCommand::with_name("remove")
            .about("delete an expense")
            .arg(Arg::with_name("id").long("id").takes_value(true).required(true)))
        .subcommand(SubCommand::with_name("summary")
            .about("print a category summary (one user with --user, otherwise all users)")
            .args(&filter_args)
            .arg(Arg::with_name("json").long("json").help("print the structured summary as JSON")))
        .subcommand(SubCommand::with_name("export")
            .about("write a CSV report (one user with --user only, all users with --all)")
            .args(&filter_args)
            .arg(Arg::with_name("all").long("all").help("include every user, with a Username column"))
            .arg(Arg::with_name("out").long("out").takes_value(true).required(true)))
        .subcommand(SubCommand::with_name("expenses")
            .about("list all users' expenses")
            .arg(Arg::with_name("users").long("users").takes_value(true)
                 .help("comma-separated usernames to keep")))
        .subcommand(SubCommand::with_name("show")
            .about("show one expense")
            .arg(Arg::with_name("id").long("id").takes_value(true).required(true))
            .arg(Arg::with_name("user").long("user").takes_value(true).required(true)))
        .get_matches();

    if let Err(e) = run(&matches) {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let path = matches.value_of("file").unwrap_or("outlay.json");

    match matches.subcommand() {
        ("init", _) => {
            store::initialise(path)?;
            println!("initialised {}", path);
            Ok(())
        }
        ("add", Some(sub)) => add_expense(path, sub),
        ("remove", Some(sub)) => remove_expense(path, sub),
        ("summary", Some(sub)) => summary(path, sub),
        ("export", Some(sub)) => export(path, sub),
        ("expenses", Some(sub)) => expenses(path, sub),
        ("show", Some(sub)) => show(path, sub),
        _ => unreachable!(),
    }
}

fn add_expense(path: &str, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let store = JsonStore::open(path)?;
    let username = matches.value_of("user").unwrap().trim().to_string();
    let category = matches.value_of("category").map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let amount = parse_amount(matches.value_of("amount").unwrap())?;
    let date: SimpleDate = matches.value_of("date").unwrap().parse()?;
    let note = matches.value_of("note").unwrap_or("").trim().to_string();

    if date > SimpleDate::today() {
        return Err(Box::new(CliError("expense date cannot be in the future".into())));
    }

    store.with_data(|d| {
        let user_id = match d.user_id(&username) {
            Some(id) => id,
            None => {
                let id = d.users.iter().map(|u| u.id).max().map_or(1, |id| id + 1);
                d.users.push(User { id, username: username.clone() });
                id
            }
        };
        let category_id = category.as_ref().map(|name| {
            match d.categories.iter().find(|c| &c.name == name) {
                Some(c) => c.id,
                None => {
                    let id = d.categories.iter().map(|c| c.id).max().map_or(1, |id| id + 1);
                    d.categories.push(Category { id, name: name.clone() });
                    id
                }
            }
        });
        let expense = Expense::new(d.next_id(), Some(user_id), category_id, amount, date, note.clone());
        println!("{}", expense);
        d.insert(expense);
    })?;

    Ok(())
}

fn remove_expense(path: &str, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let store = JsonStore::open(path)?;
    let id: u64 = matches.value_of("id").unwrap().parse()?;

    let mut missing = false;
    store.with_data(|d| {
        if d.find(id).is_none() {
            missing = true;
            return;
        }
        let _ = d.remove(id);
    })?;

    if missing {
        return Err(Box::new(CliError(format!("expense not found: {}", id))));
    }
    println!("removed {}", id);
    Ok(())
}

fn summary(path: &str, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let store = JsonStore::open(path)?;
    let engine = ReportEngine::new(&store, &store);
    let filter = filter_from_matches(matches)?;

    let outcome = match matches.value_of("user") {
        Some(name) => {
            let user_id = lookup_user(&store, name)?;
            engine.user_summary(user_id, &filter)
        }
        None => engine.summary(&filter),
    };
    let summary = unwrap_outcome(outcome)?;

    if matches.is_present("json") {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn export(path: &str, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let store = JsonStore::open(path)?;
    let engine = ReportEngine::new(&store, &store);
    let filter = filter_from_matches(matches)?;
    let out = matches.value_of("out").unwrap();

    let user = matches.value_of("user")
        .ok_or_else(|| CliError("--user is required for exports".into()))?;
    let user_id = lookup_user(&store, user)?;

    let outcome = if matches.is_present("all") {
        engine.csv(user_id, &filter)
    } else {
        engine.user_csv(user_id, &filter)
    };
    let body = unwrap_outcome(outcome)?;

    std::fs::write(out, body)?;
    println!("{} {}", "wrote".green(), out);
    Ok(())
}

fn expenses(path: &str, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let store = JsonStore::open(path)?;
    let engine = ReportEngine::new(&store, &store);

    let names: Option<Vec<String>> = matches.value_of("users").map(|s| {
        s.split(',')
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect()
    });

    let outcome = engine.expenses_for_users(names.as_deref());
    let data = unwrap_outcome(outcome)?;

    for view in &data.expenses {
        let username = view.username.as_deref().unwrap_or("Unknown");
        let category = view.category.as_deref().unwrap_or(report::UNCATEGORIZED);
        println!("{}  {}  {}  ${}  {}",
                 view.date, username.bold(), category, format_amount(view.amount), view.note);
    }
    for name in &data.not_found_usernames {
        println!("{} {}", "no expenses for".yellow(), name.yellow().bold());
    }
    Ok(())
}

fn show(path: &str, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let store = JsonStore::open(path)?;
    let engine = ReportEngine::new(&store, &store);

    let id: u64 = matches.value_of("id").unwrap().parse()?;
    let user_id = lookup_user(&store, matches.value_of("user").unwrap())?;

    let view = unwrap_outcome(engine.expense(id, user_id))?;
    let category = view.category.as_deref().unwrap_or(report::UNCATEGORIZED);
    println!("{}  {}  ${}  {}", view.date, category, format_amount(view.amount), view.note);
    Ok(())
}

fn filter_from_matches(matches: &ArgMatches) -> Result<ReportFilter, Box<dyn Error>> {
    let report_type = match matches.value_of("type").unwrap_or("daily") {
        "monthly" => ReportType::Monthly,
        _ => ReportType::Daily,
    };
    let range_type = match matches.value_of("range").unwrap_or("last-month") {
        "last-3-months" => RangeType::Last3Months,
        "custom" => RangeType::Custom,
        _ => RangeType::LastMonth,
    };

    let mut filter = ReportFilter {
        report_type,
        range_type,
        start_date: matches.value_of("start-date").map(str::parse).transpose()?,
        end_date: matches.value_of("end-date").map(str::parse).transpose()?,
        start_month: parse_opt(matches, "start-month")?,
        start_year: parse_opt(matches, "start-year")?,
        end_month: parse_opt(matches, "end-month")?,
        end_year: parse_opt(matches, "end-year")?,
        username: matches.value_of("match-user").map(String::from),
        category: matches.value_of("match-category").map(String::from),
    };
    filter.normalize();
    Ok(filter)
}

fn parse_opt<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>, Box<dyn Error>>
where
    T::Err: Error + 'static,
{
    Ok(matches.value_of(name).map(str::parse).transpose()?)
}

fn parse_amount(s: &str) -> Result<i64, Box<dyn Error>> {
    let s = s.trim();
    let dollars: f64 = if let Some(stripped) = s.strip_prefix('$') {
        stripped.parse()?
    } else {
        s.parse()?
    };
    if dollars < 0.0 {
        return Err(Box::new(CliError("amount cannot be negative".into())));
    }
    Ok((dollars * 100.0).round() as i64)
}

fn lookup_user(store: &JsonStore, username: &str) -> Result<u64, Box<dyn Error>> {
    store.user_id(username.trim())
        .ok_or_else(|| Box::new(CliError(format!("user not found: {}", username))) as Box<dyn Error>)
}

fn unwrap_outcome<T>(outcome: Outcome<T>) -> Result<T, Box<dyn Error>> {
    if !outcome.succeeded {
        let mut message = outcome.message;
        if !outcome.errors.is_empty() {
            message = format!("{} ({})", message, outcome.errors.join("; "));
        }
        return Err(Box::new(CliError(message)));
    }
    outcome.data.ok_or_else(|| Box::new(CliError("empty response".into())) as Box<dyn Error>)
}

fn print_summary(summary: &Summary) {
    for group in &summary.categories {
        println!("{}  ${}", group.category.bold(), format_amount(group.total_amount).green());
        for entry in &group.expenses {
            println!("  {}  ${}  {}", entry.date, format_amount(entry.amount), entry.note);
        }
    }
    println!("{}  ${}", "total".bold(), format_amount(summary.total_expense).green());
}
