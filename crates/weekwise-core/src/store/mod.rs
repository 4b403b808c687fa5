//! Weekly record store
//!
//! Holds every known week in memory: the history tables first (in file and
//! row order), then the weekly log pivoted into records. Logged weeks replace
//! history weeks with the same date.
//!
//! Submitting a week rewrites the log atomically (temp file in the same
//! directory, then rename) before the in-memory snapshot changes, so a failed
//! write leaves both untouched.

mod table;

pub use table::{parse_date, read_history, read_log, write_log, LOG_FINANCIAL_AID, LOG_INCOME};

use std::collections::BTreeMap;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::models::{Category, WeeklyRecord};

/// Per-category means over every stored week
#[derive(Debug, Clone, PartialEq)]
pub struct Averages {
    /// Number of weeks averaged
    pub weeks: usize,
    pub income: f64,
    pub financial_aid: f64,
    expenses: [f64; Category::COUNT],
}

impl Averages {
    fn zero() -> Self {
        Self {
            weeks: 0,
            income: 0.0,
            financial_aid: 0.0,
            expenses: [0.0; Category::COUNT],
        }
    }

    pub fn amount(&self, category: Category) -> f64 {
        self.expenses[category as usize]
    }

    /// (category, mean) pairs in canonical order
    pub fn expenses(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::all().iter().map(move |c| (*c, self.amount(*c)))
    }

    pub fn expense_map(&self) -> BTreeMap<Category, f64> {
        self.expenses().collect()
    }

    /// The averages as a record for `date`
    pub fn to_record(&self, date: NaiveDate) -> WeeklyRecord {
        let mut record = WeeklyRecord::empty(date).with_income(self.income, self.financial_aid);
        for (category, amount) in self.expenses() {
            record.set_amount(category, amount);
        }
        record
    }
}

/// In-memory record store backed by CSV tables
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<WeeklyRecord>,
    /// Weeks that came from (or were submitted to) the log
    logged: Vec<WeeklyRecord>,
    log_path: Option<PathBuf>,
}

impl RecordStore {
    /// Store over a fixed set of records, with no log behind it
    pub fn in_memory(records: Vec<WeeklyRecord>) -> Self {
        Self {
            records,
            logged: Vec::new(),
            log_path: None,
        }
    }

    /// Open the configured history tables and log
    pub fn from_config(storage: &StorageConfig) -> Result<Self> {
        Self::open(&storage.history, &storage.log)
    }

    /// Load history tables in order, then apply the log on top
    pub fn open(history: &[PathBuf], log_path: &Path) -> Result<Self> {
        let mut store = Self {
            records: load(history)?,
            logged: Vec::new(),
            log_path: Some(log_path.to_path_buf()),
        };

        if log_path.exists() {
            let file = fs::File::open(log_path)?;
            let logged = read_log(BufReader::new(file)).map_err(|e| {
                Error::Storage(format!("Failed to read log {}: {}", log_path.display(), e))
            })?;
            for record in &logged {
                upsert_into(&mut store.records, record.clone());
            }
            store.logged = logged;
        } else {
            debug!(path = %log_path.display(), "No weekly log yet");
        }

        info!(
            weeks = store.records.len(),
            logged = store.logged.len(),
            "Record store opened"
        );
        Ok(store)
    }

    /// Where submitted weeks are written, if anywhere
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Every week in load order
    pub fn records(&self) -> &[WeeklyRecord] {
        &self.records
    }

    /// Weeks that came from the log
    pub fn logged(&self) -> &[WeeklyRecord] {
        &self.logged
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The stored week for `date`
    pub fn get(&self, date: NaiveDate) -> Option<&WeeklyRecord> {
        self.records.iter().rev().find(|r| r.date == date)
    }

    /// The week with the greatest date
    ///
    /// Ties go to the record loaded last.
    pub fn latest(&self) -> Option<&WeeklyRecord> {
        self.records.iter().max_by_key(|r| r.date)
    }

    /// The latest week, or an all-zero record for `date` when the store is empty
    pub fn latest_or_empty(&self, date: NaiveDate) -> WeeklyRecord {
        self.latest()
            .cloned()
            .unwrap_or_else(|| WeeklyRecord::empty(date))
    }

    /// Per-category means over all weeks (all zero when empty)
    pub fn averages(&self) -> Averages {
        let mut averages = Averages::zero();
        if self.records.is_empty() {
            return averages;
        }

        for record in &self.records {
            for (category, amount) in record.expenses() {
                averages.expenses[category as usize] += amount;
            }
            averages.income += record.income();
            averages.financial_aid += record.financial_aid();
        }

        let n = self.records.len() as f64;
        for v in averages.expenses.iter_mut() {
            *v /= n;
        }
        averages.income /= n;
        averages.financial_aid /= n;
        averages.weeks = self.records.len();
        averages
    }

    /// The fixed category set
    pub fn categories(&self) -> &'static [Category] {
        Category::all()
    }

    /// Insert or replace the week for `record.date` in memory only
    ///
    /// A replaced week keeps its position; duplicates of that date collapse.
    pub fn upsert(&mut self, record: WeeklyRecord) {
        upsert_into(&mut self.records, record);
    }

    /// Persist a week to the log, then apply it in memory
    ///
    /// Without a log path the week is only applied in memory.
    pub fn submit(&mut self, record: WeeklyRecord) -> Result<()> {
        let Some(path) = self.log_path.clone() else {
            warn!(date = %record.date, "No log configured, keeping week in memory only");
            self.upsert(record);
            return Ok(());
        };

        let mut logged = self.logged.clone();
        upsert_into(&mut logged, record.clone());
        persist_log(&path, &logged)?;

        self.logged = logged;
        info!(date = %record.date, path = %path.display(), "Week submitted");
        self.upsert(record);
        Ok(())
    }
}

/// Load history tables in order
///
/// A missing table contributes nothing. One that exists but cannot be read
/// is a storage error.
pub fn load(sources: &[PathBuf]) -> Result<Vec<WeeklyRecord>> {
    let mut records = Vec::new();
    for path in sources {
        if !path.exists() {
            warn!(path = %path.display(), "History table not found, skipping");
            continue;
        }
        let file = fs::File::open(path)?;
        let source = path.display().to_string();
        let table = read_history(BufReader::new(file), &source)
            .map_err(|e| Error::Storage(format!("Failed to read {}: {}", source, e)))?;
        records.extend(table);
    }
    Ok(records)
}

fn upsert_into(records: &mut Vec<WeeklyRecord>, record: WeeklyRecord) {
    let date = record.date;
    let Some(first) = records.iter().position(|r| r.date == date) else {
        records.push(record);
        return;
    };

    records[first] = record;
    let mut i = 0;
    records.retain(|r| {
        let keep = r.date != date || i == first;
        i += 1;
        keep
    });
}

/// Write the whole log to a sibling temp file and rename it into place
fn persist_log(path: &Path, records: &[WeeklyRecord]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    write_log(&mut tmp, records)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| {
        Error::Storage(format!("Failed to replace {}: {}", path.display(), e.error))
    })?;

    debug!(path = %path.display(), weeks = records.len(), "Log written");
    Ok(())
}
