//! CSV codecs for weekly history tables and the weekly log
//!
//! History tables are wide: one row per week with a date, income, financial
//! aid and one column per category. The weekly log is long: one
//! `date,category,amount` row per category per week, plus `income` and
//! `financial_aid` rows so a logged week round-trips.
//!
//! Reading is lenient. Unknown columns are ignored, missing category columns
//! read as zero, non-numeric cells coerce to zero and rows without a usable
//! date are dropped. Rows the CSV reader rejects outright (invalid UTF-8)
//! are skipped with a warning. None of these fail the load; only an
//! unreadable header or an I/O error does.

use std::collections::HashMap;
use std::io::{Read, Write};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{Category, WeeklyRecord};

/// Log `category` cell used for the income row
pub const LOG_INCOME: &str = "income";
/// Log `category` cell used for the financial aid row
pub const LOG_FINANCIAL_AID: &str = "financial_aid";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// What a history table column holds
#[derive(Debug, Clone, Copy, PartialEq)]
enum Column {
    Date,
    Income,
    FinancialAid,
    Amount(Category),
    Ignored,
}

fn classify_header(header: &str) -> Column {
    match header.trim().to_lowercase().replace(' ', "_").as_str() {
        "date" | "week" | "week_start" => Column::Date,
        "income" | "monthly_income" | "weekly_income" => Column::Income,
        "financial_aid" | "aid" => Column::FinancialAid,
        other => other
            .parse::<Category>()
            .map(Column::Amount)
            .unwrap_or(Column::Ignored),
    }
}

/// Parse a date cell in any of the accepted formats
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse an amount cell, coercing anything unusable to zero
///
/// Returns the value and whether coercion happened on a non-empty cell.
fn parse_amount(s: &str) -> (f64, bool) {
    let cleaned = s.trim().trim_start_matches('$').replace(',', "");
    if cleaned.is_empty() {
        return (0.0, false);
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => (v, false),
        _ => (0.0, true),
    }
}

/// Keep a decoded row, or skip one the reader rejected
///
/// I/O errors still fail since the reader cannot make progress past them.
fn readable_row(
    result: csv::Result<StringRecord>,
    source: &str,
    line: usize,
) -> Result<Option<StringRecord>> {
    match result {
        Ok(row) => Ok(Some(row)),
        Err(e) if e.is_io_error() => Err(e.into()),
        Err(e) => {
            warn!(source, line, error = %e, "Skipping unreadable row");
            Ok(None)
        }
    }
}

/// Read a wide-format history table
///
/// `source` names the table in log messages.
pub fn read_history<R: Read>(reader: R, source: &str) -> Result<Vec<WeeklyRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns: Vec<Column> = headers.iter().map(classify_header).collect();

    if !columns.contains(&Column::Date) {
        warn!(source, "History table has no date column, no rows can be used");
    }
    let missing: Vec<&str> = Category::all()
        .iter()
        .filter(|c| !columns.contains(&Column::Amount(**c)))
        .map(|c| c.as_str())
        .collect();
    if !missing.is_empty() {
        warn!(source, missing = ?missing, "Missing category columns default to 0");
    }

    let mut records = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let Some(row) = readable_row(result, source, line)? else {
            continue;
        };
        match history_row(&row, &columns, source, line) {
            Some(record) => records.push(record),
            None => warn!(source, line, "Dropping history row without a valid date"),
        }
    }

    debug!(source, rows = records.len(), "Loaded history table");
    Ok(records)
}

fn history_row(
    row: &StringRecord,
    columns: &[Column],
    source: &str,
    line: usize,
) -> Option<WeeklyRecord> {
    let date = columns
        .iter()
        .position(|c| *c == Column::Date)
        .and_then(|i| row.get(i))
        .and_then(parse_date)?;

    let mut record = WeeklyRecord::empty(date);
    for (column, cell) in columns.iter().zip(row.iter()) {
        if matches!(column, Column::Date | Column::Ignored) {
            continue;
        }
        let (value, coerced) = parse_amount(cell);
        if coerced {
            warn!(source, line, cell, "Non-numeric value coerced to 0");
        }
        match column {
            Column::Income => record.set_income(value),
            Column::FinancialAid => record.set_financial_aid(value),
            Column::Amount(category) => record.set_amount(*category, value),
            Column::Date | Column::Ignored => {}
        }
    }
    Some(record)
}

/// Read the long-format weekly log, one record per distinct date
///
/// Records come back in order of each date's first appearance. A repeated
/// (date, category) pair keeps the last value.
pub fn read_log<R: Read>(reader: R) -> Result<Vec<WeeklyRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut records: Vec<WeeklyRecord> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let Some(row) = readable_row(result, "weekly log", line)? else {
            continue;
        };

        let Some(date) = row.get(0).and_then(parse_date) else {
            warn!(line, "Dropping log row without a valid date");
            continue;
        };
        let field = row.get(1).unwrap_or("");
        let (amount, coerced) = parse_amount(row.get(2).unwrap_or(""));
        if coerced {
            warn!(line, "Non-numeric log amount coerced to 0");
        }

        let i = *index.entry(date).or_insert_with(|| {
            records.push(WeeklyRecord::empty(date));
            records.len() - 1
        });
        let record = &mut records[i];

        match field {
            LOG_INCOME => record.set_income(amount),
            LOG_FINANCIAL_AID => record.set_financial_aid(amount),
            other => match other.parse::<Category>() {
                Ok(category) => record.set_amount(category, amount),
                Err(_) => warn!(line, field = other, "Unknown log category ignored"),
            },
        }
    }

    debug!(weeks = records.len(), "Loaded weekly log");
    Ok(records)
}

#[derive(Serialize)]
struct LogRow<'a> {
    date: NaiveDate,
    category: &'a str,
    amount: f64,
}

/// Write records in the long log format
pub fn write_log<W: Write>(writer: W, records: &[WeeklyRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if records.is_empty() {
        wtr.write_record(["date", "category", "amount"])?;
    }

    for record in records {
        for (category, amount) in record.expenses() {
            wtr.serialize(LogRow {
                date: record.date,
                category: category.as_str(),
                amount,
            })?;
        }
        wtr.serialize(LogRow {
            date: record.date,
            category: LOG_INCOME,
            amount: record.income(),
        })?;
        wtr.serialize(LogRow {
            date: record.date,
            category: LOG_FINANCIAL_AID,
            amount: record.financial_aid(),
        })?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_read_full_history_table() {
        let csv = "\
date,income,financial_aid,tuition,housing,food,transportation,books_supplies,entertainment,personal_care,technology,health_wellness,miscellaneous
2024-01-01,800,200,0,400,120,30,15,60,10,0,20,5
2024-01-08,800,200,0,400,90,25,0,80,0,150,0,0
";
        let records = read_history(csv.as_bytes(), "test").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, date(2024, 1, 1));
        assert_eq!(records[0].income(), 800.0);
        assert_eq!(records[0].financial_aid(), 200.0);
        assert_eq!(records[0].amount(Category::Food), 120.0);
        assert_eq!(records[1].amount(Category::Technology), 150.0);
    }

    #[test]
    fn test_missing_columns_and_bad_cells_are_zeroed() {
        let csv = "\
Date,Monthly Income,Food,Entertainment,Notes
01/15/2024,1000,abc,\"$1,250.50\",ignored
2024/01/22,,40,,x
";
        let records = read_history(csv.as_bytes(), "test").unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].date, date(2024, 1, 15));
        assert_eq!(records[0].income(), 1000.0);
        assert_eq!(records[0].amount(Category::Food), 0.0);
        assert_eq!(records[0].amount(Category::Entertainment), 1250.5);
        assert_eq!(records[0].amount(Category::Housing), 0.0);

        assert_eq!(records[1].date, date(2024, 1, 22));
        assert_eq!(records[1].income(), 0.0);
        assert_eq!(records[1].amount(Category::Food), 40.0);
    }

    #[test]
    fn test_rows_without_date_are_dropped() {
        let csv = "\
date,food
not-a-date,10
,20
2024-02-05,30
";
        let records = read_history(csv.as_bytes(), "test").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount(Category::Food), 30.0);
    }

    #[test]
    fn test_negative_cells_coerce_to_zero() {
        let csv = "date,food,income\n2024-02-05,-30,500\n";
        let records = read_history(csv.as_bytes(), "test").unwrap();
        assert_eq!(records[0].amount(Category::Food), 0.0);
        assert_eq!(records[0].income(), 500.0);
    }

    #[test]
    fn test_spoken_category_headers() {
        let csv = "date,Personal Care,books supplies\n2024-02-05,12,34\n";
        let records = read_history(csv.as_bytes(), "test").unwrap();
        assert_eq!(records[0].amount(Category::PersonalCare), 12.0);
        assert_eq!(records[0].amount(Category::BooksSupplies), 34.0);
    }

    #[test]
    fn test_log_round_trip() {
        let week = WeeklyRecord::empty(date(2024, 3, 4))
            .with_amount(Category::Food, 45.5)
            .with_amount(Category::Housing, 400.0)
            .with_income(900.0, 150.0);
        let other = WeeklyRecord::empty(date(2024, 3, 11)).with_amount(Category::Technology, 20.0);

        let mut buf = Vec::new();
        write_log(&mut buf, &[week.clone(), other.clone()]).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("date,category,amount\n"));
        // 10 categories + income + aid per week, plus the header
        assert_eq!(text.lines().count(), 1 + 2 * (Category::COUNT + 2));
        assert!(text.contains("2024-03-04,food,45.5"));

        let back = read_log(buf.as_slice()).unwrap();
        assert_eq!(back, vec![week, other]);
    }

    #[test]
    fn test_empty_log_has_header() {
        let mut buf = Vec::new();
        write_log(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "date,category,amount\n");
    }

    #[test]
    fn test_read_log_tolerates_bad_rows() {
        let csv = "\
date,category,amount
2024-03-04,food,10
2024-03-04,snacks,5
garbage,food,1
2024-03-04,food,12
2024-03-04,housing,lots
";
        let records = read_log(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount(Category::Food), 12.0);
        assert_eq!(records[0].amount(Category::Housing), 0.0);
    }

    #[test]
    fn test_invalid_utf8_row_is_skipped_in_history() {
        let mut csv = b"date,food\n2024-01-01,10\n2024-01-08,".to_vec();
        csv.extend_from_slice(&[0xff, 0xfe]);
        csv.extend_from_slice(b"\n2024-01-15,30\n");

        let records = read_history(csv.as_slice(), "test").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, date(2024, 1, 1));
        assert_eq!(records[1].date, date(2024, 1, 15));
        assert_eq!(records[1].amount(Category::Food), 30.0);
    }

    #[test]
    fn test_invalid_utf8_row_is_skipped_in_log() {
        let mut csv = b"date,category,amount\n2024-03-04,food,10\n2024-03-04,".to_vec();
        csv.extend_from_slice(&[0xff, 0xfe]);
        csv.extend_from_slice(b",5\n2024-03-04,housing,400\n");

        let records = read_log(csv.as_slice()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount(Category::Food), 10.0);
        assert_eq!(records[0].amount(Category::Housing), 400.0);
    }
}
