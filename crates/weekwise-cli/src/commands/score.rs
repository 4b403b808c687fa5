//! One-shot scoring command

use anyhow::Result;
use chrono::NaiveDate;
use weekwise_core::{
    Category, Config, FieldUpdate, RecordStore, RuleParser, SessionCoordinator, SessionReport,
    UpdateRequest,
};

use super::print_report;
use crate::cli::FieldArgs;

/// Collect the fields given on the command line
pub fn field_update(args: &FieldArgs) -> FieldUpdate {
    let amounts = [
        (Category::Tuition, args.tuition),
        (Category::Housing, args.housing),
        (Category::Food, args.food),
        (Category::Transportation, args.transportation),
        (Category::BooksSupplies, args.books_supplies),
        (Category::Entertainment, args.entertainment),
        (Category::PersonalCare, args.personal_care),
        (Category::Technology, args.technology),
        (Category::HealthWellness, args.health_wellness),
        (Category::Miscellaneous, args.miscellaneous),
    ];

    FieldUpdate {
        expenses: amounts
            .into_iter()
            .filter_map(|(category, amount)| amount.map(|a| (category, a)))
            .collect(),
        income: args.income,
        financial_aid: args.financial_aid,
    }
}

/// Seed a week per config, apply the given fields and print the report
///
/// Nothing is saved.
pub async fn cmd_score(
    config: &Config,
    store: &RecordStore,
    update: FieldUpdate,
    date: NaiveDate,
    json: bool,
) -> Result<SessionReport> {
    let coordinator = SessionCoordinator::new(config, Box::new(RuleParser));
    let mut session = coordinator.start_session(store, date);

    let report = if update.is_empty() {
        coordinator.evaluate(&mut session)
    } else {
        coordinator
            .apply(&mut session, UpdateRequest::Fields(update))
            .await?
    };

    print_report(&report, json)?;
    Ok(report)
}
