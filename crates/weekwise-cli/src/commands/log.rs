//! Free-text expense logging

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use weekwise_core::{
    Config, ExpenseParser, RecordStore, Session, SessionCoordinator, SessionReport, UpdateRequest,
};

use super::print_report;

/// Add a parsed expense to the week for `date` and save the week
///
/// A week already in the store is extended; otherwise a new draft is seeded
/// per config. Entries that cannot be parsed are rejected without saving.
pub async fn cmd_log(
    config: &Config,
    store: &mut RecordStore,
    parser: Box<dyn ExpenseParser>,
    text: &str,
    date: NaiveDate,
    json: bool,
) -> Result<SessionReport> {
    let coordinator = SessionCoordinator::new(config, parser);
    let mut session = match store.get(date) {
        Some(existing) => Session::new(existing.clone()),
        None => coordinator.start_session(store, date),
    };

    let before = session.record().clone();
    let report = match coordinator
        .apply(&mut session, UpdateRequest::Voice(text.to_string()))
        .await
    {
        Ok(report) => report,
        Err(e) => bail!("{}", e.user_message()),
    };

    coordinator
        .submit(&session, store)
        .context("Failed to save week")?;

    if !json {
        if let Some((category, amount)) = session
            .record()
            .expenses()
            .find(|(c, a)| *a != before.amount(*c))
        {
            println!(
                "✅ Logged {} on {} for the week of {}",
                super::money(amount - before.amount(category)),
                category.spoken(),
                date
            );
        }
    }
    print_report(&report, json)?;
    Ok(report)
}
