//! Shared utilities for commands
//!
//! This module contains:
//! - `load_config` / `open_store` - Resolve configuration and open the record store
//! - `build_parser` - Pick the expense parser (rules, optionally AI-assisted)
//! - `resolve_date` - Turn `--date` into a week date
//! - `render_report` / `print_report` - Session report output

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde_json::{json, Value};
use tracing::{debug, info};
use weekwise_core::store::parse_date;
use weekwise_core::{
    week_start, AssistedParser, Config, ExpenseParser, RecordStore, RuleParser, SessionReport,
    WeeklyRecord,
};

use super::money;

/// Load configuration (explicit path, then data dir override, then defaults)
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).context("Failed to load configuration")
}

/// Open the record store at the configured locations
pub fn open_store(config: &Config) -> Result<RecordStore> {
    RecordStore::from_config(&config.storage).context("Failed to open record store")
}

/// Rule parser, with the AI fallback when a backend is configured
pub fn build_parser(no_ai: bool) -> Box<dyn ExpenseParser> {
    if no_ai {
        return Box::new(RuleParser);
    }

    let assisted = AssistedParser::from_env();
    if assisted.has_backend() {
        info!("AI fallback enabled for expense parsing");
        Box::new(assisted)
    } else {
        debug!("No AI backend configured, using rule parser");
        Box::new(RuleParser)
    }
}

/// Parse `--date`, defaulting to the Monday of the current week
pub fn resolve_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => parse_date(s).with_context(|| {
            format!(
                "Invalid date '{}': expected YYYY-MM-DD, MM/DD/YYYY or YYYY/MM/DD",
                s
            )
        }),
        None => Ok(week_start(Local::now().date_naive())),
    }
}

/// JSON view of a stored week
pub fn record_json(record: &WeeklyRecord) -> Value {
    json!({
        "date": record.date,
        "income": record.income(),
        "financial_aid": record.financial_aid(),
        "expenses": record.expense_map(),
        "total_expense": record.total_expense(),
    })
}

/// Human-readable session report
pub fn render_report(report: &SessionReport) -> String {
    ReportView(report).to_string()
}

struct ReportView<'a>(&'a SessionReport);

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let total: f64 = report.expenses.values().sum();

        writeln!(f)?;
        writeln!(f, "📅 Week of {}", report.date)?;
        writeln!(f, "   Score: {}/100 ({})", report.score, report.policy)?;
        writeln!(f, "   ─────────────────────────────────────")?;
        for (category, amount) in &report.expenses {
            writeln!(f, "   {:<20} {:>12}", category.label(), money(*amount))?;
        }
        writeln!(f, "   ─────────────────────────────────────")?;
        writeln!(f, "   {:<20} {:>12}", "Total spent", money(total))?;
        writeln!(f, "   {:<20} {:>12}", "Income", money(report.income))?;
        writeln!(f, "   {:<20} {:>12}", "Financial aid", money(report.financial_aid))?;
        if report.breakdown.degenerate {
            writeln!(f, "   ⚠️  No income or aid recorded, ratios count as zero")?;
        }

        for (title, lines) in [
            ("💭 Insights", &report.insights),
            ("👉 Nudges", &report.nudges),
            ("🏆 Challenges", &report.challenges),
        ] {
            if lines.is_empty() {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{}", title)?;
            for line in lines {
                writeln!(f, "   • {}", line)?;
            }
        }

        Ok(())
    }
}

/// Print a report as a table or pretty JSON
pub fn print_report(report: &SessionReport, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("Failed to serialize report")?
        );
    } else {
        print!("{}", render_report(report));
    }
    Ok(())
}
