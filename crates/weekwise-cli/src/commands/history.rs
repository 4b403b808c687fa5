//! Stored weeks and historical averages

use anyhow::Result;
use serde_json::json;
use weekwise_core::{Category, Config, RecordStore, WeeklyRecord};

use super::{money, record_json};

/// Stored weeks, newest first; ties keep the later-loaded week first
pub fn newest_first(store: &RecordStore, limit: usize) -> Vec<&WeeklyRecord> {
    let mut weeks: Vec<&WeeklyRecord> = store.records().iter().rev().collect();
    weeks.sort_by(|a, b| b.date.cmp(&a.date));
    weeks.truncate(limit);
    weeks
}

fn top_category(record: &WeeklyRecord) -> Option<(Category, f64)> {
    record
        .expenses()
        .filter(|(_, amount)| *amount > 0.0)
        .fold(None, |best, (c, a)| match best {
            Some((_, best_amount)) if best_amount >= a => best,
            _ => Some((c, a)),
        })
}

pub fn cmd_history(config: &Config, store: &RecordStore, limit: usize, json: bool) -> Result<()> {
    let weeks = newest_first(store, limit);

    if json {
        let rows: Vec<_> = weeks
            .iter()
            .map(|record| {
                let mut row = record_json(record);
                row["score"] = json!(config.scoring.score(record));
                row
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if weeks.is_empty() {
        println!("No weeks stored yet.");
        println!();
        println!("Add one with: weekwise log \"spent 45 on food\"");
        return Ok(());
    }

    println!();
    println!(
        "{:<12} {:>6} {:>12} {:>12} {:>12}  Top category",
        "Week", "Score", "Spent", "Income", "Aid"
    );
    println!("{}", "─".repeat(76));
    for record in &weeks {
        let top = top_category(record)
            .map(|(c, a)| format!("{} ({})", c.label(), money(a)))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:>6} {:>12} {:>12} {:>12}  {}",
            record.date.to_string(),
            config.scoring.score(record),
            money(record.total_expense()),
            money(record.income()),
            money(record.financial_aid()),
            top
        );
    }
    println!();
    println!(
        "Showing {} of {} weeks (scored with {})",
        weeks.len(),
        store.len(),
        config.scoring
    );

    Ok(())
}

pub fn cmd_averages(store: &RecordStore, json: bool) -> Result<()> {
    let averages = store.averages();

    if json {
        let value = json!({
            "weeks": averages.weeks,
            "income": averages.income,
            "financial_aid": averages.financial_aid,
            "expenses": averages.expense_map(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!();
    println!("📊 Averages over {} weeks", averages.weeks);
    println!("   ─────────────────────────────────────");
    for (category, amount) in averages.expenses() {
        println!("   {:<20} {:>12}", category.label(), money(amount));
    }
    println!("   ─────────────────────────────────────");
    println!("   {:<20} {:>12}", "Income", money(averages.income));
    println!("   {:<20} {:>12}", "Financial aid", money(averages.financial_aid));
    println!();

    Ok(())
}
