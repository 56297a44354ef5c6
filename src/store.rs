use crate::engine::{ExpenseSource, ReportLog, SourceError};
use crate::expense::Expense;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Debug)]
struct StoreError(String);

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for StoreError {}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: u64,
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Category {
    pub id: u64,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GeneratedReport {
    pub user_id: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
pub struct Datafile {
    pub version: u64,
    pub users: Vec<User>,
    pub categories: Vec<Category>,
    pub entries: Vec<Expense>,
    pub reports: Vec<GeneratedReport>,
}

impl Datafile {
    fn new() -> Datafile {
        Datafile {
            version: 1,
            users: vec![],
            categories: vec![],
            entries: vec![],
            reports: vec![],
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Datafile, Box<dyn Error>> {
        let file = File::open(path)?;
        let reader = std::io::BufReader::new(file);

        let d: Datafile = serde_json::from_reader(reader)?;

        if d.version != 1 {
            return Err(Box::new(StoreError("unknown version in datafile!".into())));
        }

        Ok(d)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let writer = std::io::BufWriter::new(file);

        serde_json::to_writer(writer, &self)?;

        Ok(())
    }

    pub fn insert(&mut self, expense: Expense) {
        let mut insert_idx = self.entries.len();
        for (idx, saved) in self.entries.iter().enumerate() {
            if saved.date() > expense.date() {
                insert_idx = idx;
                break;
            }
        }
        self.entries.insert(insert_idx, expense);
    }

    pub fn find(&self, id: u64) -> Option<&Expense> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn remove(&mut self, id: u64) -> Result<(), Box<dyn Error>> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id() != id);
        if self.entries.len() == before {
            return Err(Box::new(StoreError("couldn't find item".into())));
        }
        Ok(())
    }

    pub fn next_id(&self) -> u64 {
        self.entries.iter().map(|e| e.id()).max().map_or(1, |id| id + 1)
    }

    pub fn user_id(&self, username: &str) -> Option<u64> {
        self.users.iter().find(|u| u.username == username).map(|u| u.id)
    }
}

pub fn initialise<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true)
        .create_new(true)
        .open(path)?;
    let contents = serde_json::to_string(&Datafile::new())?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}

/// A datafile-backed store wired into the report engine. Report-generated
/// events append a log entry and save the file straight away.
pub struct JsonStore {
    path: PathBuf,
    data: RefCell<Datafile>,
}

impl JsonStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<JsonStore, Box<dyn Error>> {
        let data = Datafile::from_file(&path)?;
        Ok(JsonStore {
            path: path.as_ref().to_path_buf(),
            data: RefCell::new(data),
        })
    }

    pub fn with_data(&self, f: impl FnOnce(&mut Datafile)) -> Result<(), Box<dyn Error>> {
        f(&mut self.data.borrow_mut());
        self.data.borrow().save(&self.path)
    }

    pub fn user_id(&self, username: &str) -> Option<u64> {
        self.data.borrow().user_id(username)
    }
}

impl ExpenseSource for JsonStore {
    fn expenses_for_user(&self, user_id: u64) -> Result<Vec<Expense>, SourceError> {
        Ok(self.data.borrow().entries.iter()
            .filter(|e| e.user_id() == Some(user_id))
            .cloned()
            .collect())
    }

    fn all_expenses(&self) -> Result<Vec<Expense>, SourceError> {
        Ok(self.data.borrow().entries.clone())
    }

    fn category_names(&self) -> Result<HashMap<u64, String>, SourceError> {
        Ok(self.data.borrow().categories.iter()
            .map(|c| (c.id, c.name.clone()))
            .collect())
    }

    fn usernames(&self) -> Result<HashMap<u64, String>, SourceError> {
        Ok(self.data.borrow().users.iter()
            .map(|u| (u.id, u.username.clone()))
            .collect())
    }
}

impl ReportLog for JsonStore {
    fn report_generated(&self, user_id: u64) -> Result<(), SourceError> {
        self.data.borrow_mut().reports.push(GeneratedReport {
            user_id,
            created_at: Utc::now(),
        });
        self.data.borrow().save(&self.path)
            .map_err(|e| SourceError(e.to_string()))
    }
}
