//! Per-session orchestration
//!
//! A [`SessionCoordinator`] holds the configured scoring policy, feedback
//! engine, seed strategy and expense parser. It keeps no per-session state:
//! the week being edited lives in a [`Session`] that callers own and pass in
//! by `&mut`, so sessions never see each other's edits.
//!
//! Every successful update is scored and evaluated on the spot and answered
//! with a [`SessionReport`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::feedback::FeedbackEngine;
use crate::models::{Category, WeeklyRecord};
use crate::parser::{ExpenseEntry, ExpenseParser, ParseFailure};
use crate::scoring::{ScoreBreakdown, ScoringPolicy};
use crate::store::RecordStore;

/// How a new session's record is pre-filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedStrategy {
    /// Historical per-category means
    #[default]
    Averages,
    /// Copy of the most recent stored week
    LatestWeek,
    /// All zero
    Empty,
}

impl SeedStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Averages => "averages",
            Self::LatestWeek => "latest_week",
            Self::Empty => "empty",
        }
    }

    /// Build the seed record for `date`
    pub fn seed(&self, store: &RecordStore, date: NaiveDate) -> WeeklyRecord {
        match self {
            Self::Averages => store.averages().to_record(date),
            Self::LatestWeek => store.latest_or_empty(date).redated(date),
            Self::Empty => WeeklyRecord::empty(date),
        }
    }
}

impl fmt::Display for SeedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SeedStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "averages" => Ok(Self::Averages),
            "latest_week" => Ok(Self::LatestWeek),
            "empty" => Ok(Self::Empty),
            _ => Err(format!("Unknown seed strategy: {}", s)),
        }
    }
}

/// Where a session is in its update cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    DefaultsLoaded,
    AwaitingInput,
    InputApplied,
    VoiceApplied,
    Scored,
}

/// One user's working week
#[derive(Debug, Clone)]
pub struct Session {
    record: WeeklyRecord,
    state: SessionState,
    updates: usize,
}

impl Session {
    pub fn new(record: WeeklyRecord) -> Self {
        Self {
            record,
            state: SessionState::DefaultsLoaded,
            updates: 0,
        }
    }

    pub fn record(&self) -> &WeeklyRecord {
        &self.record
    }

    pub fn date(&self) -> NaiveDate {
        self.record.date
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Successful updates applied so far
    pub fn updates(&self) -> usize {
        self.updates
    }
}

/// Partial field submission; absent fields keep their current values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    #[serde(default)]
    pub expenses: BTreeMap<Category, f64>,
    #[serde(default)]
    pub income: Option<f64>,
    #[serde(default)]
    pub financial_aid: Option<f64>,
}

impl FieldUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expense(mut self, category: Category, amount: f64) -> Self {
        self.expenses.insert(category, amount);
        self
    }

    pub fn income(mut self, income: f64) -> Self {
        self.income = Some(income);
        self
    }

    pub fn financial_aid(mut self, aid: f64) -> Self {
        self.financial_aid = Some(aid);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty() && self.income.is_none() && self.financial_aid.is_none()
    }

    fn apply_to(&self, record: &mut WeeklyRecord) {
        for (category, amount) in &self.expenses {
            record.set_amount(*category, *amount);
        }
        if let Some(income) = self.income {
            record.set_income(income);
        }
        if let Some(aid) = self.financial_aid {
            record.set_financial_aid(aid);
        }
    }
}

/// One incoming update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateRequest {
    Fields(FieldUpdate),
    Voice(String),
}

/// A voice update that could not be applied
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VoiceError {
    #[error("voice entry not understood: {0}")]
    Parse(#[from] ParseFailure),
}

impl VoiceError {
    /// Message for the person who typed or spoke the entry
    pub fn user_message(&self) -> String {
        match self {
            VoiceError::Parse(failure) => failure.user_message(),
        }
    }
}

/// Score and feedback for the current record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub date: NaiveDate,
    pub score: u8,
    pub policy: ScoringPolicy,
    pub insights: Vec<String>,
    pub nudges: Vec<String>,
    pub challenges: Vec<String>,
    /// Category amounts in canonical order
    pub expenses: BTreeMap<Category, f64>,
    pub income: f64,
    pub financial_aid: f64,
    pub breakdown: ScoreBreakdown,
}

/// Routes updates through parsing, scoring and feedback
pub struct SessionCoordinator {
    policy: ScoringPolicy,
    seed: SeedStrategy,
    feedback: FeedbackEngine,
    parser: Box<dyn ExpenseParser>,
}

impl SessionCoordinator {
    pub fn new(config: &Config, parser: Box<dyn ExpenseParser>) -> Self {
        Self {
            policy: config.scoring,
            seed: config.seed,
            feedback: FeedbackEngine::new(config.feedback.clone()),
            parser,
        }
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    pub fn seed_strategy(&self) -> SeedStrategy {
        self.seed
    }

    pub fn parser_name(&self) -> &'static str {
        self.parser.name()
    }

    /// Start a session for `date`, seeded per the configured strategy
    pub fn start_session(&self, store: &RecordStore, date: NaiveDate) -> Session {
        let record = self.seed.seed(store, date);
        debug!(
            date = %date,
            seed = self.seed.as_str(),
            total_expense = record.total_expense(),
            "Session started"
        );
        Session::new(record)
    }

    /// Score the current record without changing it
    pub fn evaluate(&self, session: &mut Session) -> SessionReport {
        let report = self.report(&session.record);
        session.state = SessionState::Scored;
        report
    }

    /// Apply one update, then score and evaluate the result
    ///
    /// A voice entry that cannot be parsed leaves the record untouched and
    /// the session awaiting input.
    pub async fn apply(
        &self,
        session: &mut Session,
        request: UpdateRequest,
    ) -> std::result::Result<SessionReport, VoiceError> {
        session.state = SessionState::AwaitingInput;

        match request {
            UpdateRequest::Fields(update) => {
                update.apply_to(&mut session.record);
                session.state = SessionState::InputApplied;
                debug!(
                    fields = update.expenses.len(),
                    income = ?update.income,
                    financial_aid = ?update.financial_aid,
                    "Field update applied"
                );
            }
            UpdateRequest::Voice(text) => {
                let entry = self.parse_voice(&text).await?;
                session.record.add_amount(entry.category, entry.amount);
                session.state = SessionState::VoiceApplied;
                debug!(
                    category = entry.category.as_str(),
                    amount = entry.amount,
                    "Voice entry applied"
                );
            }
        }

        session.updates += 1;
        Ok(self.evaluate(session))
    }

    async fn parse_voice(&self, text: &str) -> std::result::Result<ExpenseEntry, VoiceError> {
        let parsed = self.parser.parse(text).await;
        parsed.into_entry().map_err(|failure| {
            debug!(parser = self.parser.name(), %failure, "Voice entry rejected");
            VoiceError::Parse(failure)
        })
    }

    /// Persist the session's current record
    pub fn submit(&self, session: &Session, store: &mut RecordStore) -> Result<()> {
        store.submit(session.record.clone())?;
        info!(date = %session.date(), updates = session.updates, "Session submitted");
        Ok(())
    }

    fn report(&self, record: &WeeklyRecord) -> SessionReport {
        let breakdown = self.policy.breakdown(record);
        let feedback = self.feedback.evaluate(record);
        SessionReport {
            date: record.date,
            score: breakdown.score,
            policy: self.policy,
            insights: feedback.insights,
            nudges: feedback.nudges,
            challenges: feedback.challenges,
            expenses: record.expense_map(),
            income: record.income(),
            financial_aid: record.financial_aid(),
            breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AIClient;
    use crate::parser::{AssistedParser, RuleParser};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn coordinator() -> SessionCoordinator {
        SessionCoordinator::new(&Config::default(), Box::new(RuleParser))
    }

    fn coordinator_with_seed(seed: SeedStrategy) -> SessionCoordinator {
        let config = Config {
            seed,
            ..Config::default()
        };
        SessionCoordinator::new(&config, Box::new(RuleParser))
    }

    fn store() -> RecordStore {
        RecordStore::in_memory(vec![
            WeeklyRecord::empty(date(2024, 1, 1))
                .with_amount(Category::Food, 100.0)
                .with_income(800.0, 0.0),
            WeeklyRecord::empty(date(2024, 1, 8))
                .with_amount(Category::Food, 200.0)
                .with_amount(Category::Housing, 400.0)
                .with_income(800.0, 200.0),
        ])
    }

    #[test]
    fn test_seed_averages() {
        let session = coordinator().start_session(&store(), date(2024, 1, 15));
        assert_eq!(session.state(), SessionState::DefaultsLoaded);
        assert_eq!(session.date(), date(2024, 1, 15));
        assert_eq!(session.record().amount(Category::Food), 150.0);
        assert_eq!(session.record().amount(Category::Housing), 200.0);
        assert_eq!(session.record().financial_aid(), 100.0);
    }

    #[test]
    fn test_seed_latest_week() {
        let coordinator = coordinator_with_seed(SeedStrategy::LatestWeek);
        let session = coordinator.start_session(&store(), date(2024, 1, 15));
        assert_eq!(session.date(), date(2024, 1, 15));
        assert_eq!(session.record().amount(Category::Food), 200.0);
        assert_eq!(session.record().amount(Category::Housing), 400.0);
    }

    #[test]
    fn test_seed_empty() {
        let coordinator = coordinator_with_seed(SeedStrategy::Empty);
        let session = coordinator.start_session(&store(), date(2024, 1, 15));
        assert_eq!(session.record(), &WeeklyRecord::empty(date(2024, 1, 15)));
    }

    #[test]
    fn test_seed_from_empty_store_is_zero() {
        let empty = RecordStore::in_memory(Vec::new());
        for seed in [
            SeedStrategy::Averages,
            SeedStrategy::LatestWeek,
            SeedStrategy::Empty,
        ] {
            let session = coordinator_with_seed(seed).start_session(&empty, date(2024, 1, 1));
            assert_eq!(session.record().total_expense(), 0.0, "seed {}", seed);
        }
    }

    #[test]
    fn test_seed_strategy_from_str() {
        assert_eq!("averages".parse::<SeedStrategy>(), Ok(SeedStrategy::Averages));
        assert_eq!(
            "Latest_Week".parse::<SeedStrategy>(),
            Ok(SeedStrategy::LatestWeek)
        );
        assert_eq!("empty".parse::<SeedStrategy>(), Ok(SeedStrategy::Empty));
        for typo in ["random", "average", "latest", "zero"] {
            assert!(typo.parse::<SeedStrategy>().is_err(), "{}", typo);
        }
    }

    #[tokio::test]
    async fn test_voice_entries_are_additive() {
        let coordinator = coordinator_with_seed(SeedStrategy::Empty);
        let mut session = coordinator.start_session(&store(), date(2024, 1, 15));

        let request = UpdateRequest::Voice("spent 45 on food".into());
        coordinator
            .apply(&mut session, request.clone())
            .await
            .unwrap();
        let report = coordinator.apply(&mut session, request).await.unwrap();

        assert_eq!(session.record().amount(Category::Food), 90.0);
        assert_eq!(report.expenses[&Category::Food], 90.0);
        assert_eq!(session.updates(), 2);
        assert_eq!(session.state(), SessionState::Scored);
    }

    #[tokio::test]
    async fn test_overflowing_voice_amount_is_rejected() {
        let coordinator = coordinator_with_seed(SeedStrategy::Empty);
        let mut session = coordinator.start_session(&store(), date(2024, 1, 15));
        coordinator
            .apply(&mut session, UpdateRequest::Voice("spent 40 on food".into()))
            .await
            .unwrap();

        let text = format!("spent {} on food", "9".repeat(400));
        let err = coordinator
            .apply(&mut session, UpdateRequest::Voice(text))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            VoiceError::Parse(ParseFailure::MissingAmount {
                category: Category::Food
            })
        );
        assert_eq!(session.record().amount(Category::Food), 40.0);
        assert_eq!(session.updates(), 1);
    }

    #[tokio::test]
    async fn test_field_update_keeps_absent_fields() {
        let coordinator = coordinator();
        let mut session = coordinator.start_session(&store(), date(2024, 1, 15));
        let before = session.record().clone();

        let update = FieldUpdate::new().expense(Category::Food, 10.0).income(900.0);
        let report = coordinator
            .apply(&mut session, UpdateRequest::Fields(update))
            .await
            .unwrap();

        let record = session.record();
        assert_eq!(record.amount(Category::Food), 10.0);
        assert_eq!(record.income(), 900.0);
        assert_eq!(record.amount(Category::Housing), before.amount(Category::Housing));
        assert_eq!(record.financial_aid(), before.financial_aid());
        assert_eq!(report.income, 900.0);
    }

    #[tokio::test]
    async fn test_failed_voice_leaves_record_untouched() {
        let coordinator = coordinator();
        let mut session = coordinator.start_session(&store(), date(2024, 1, 15));
        let before = session.record().clone();

        let err = coordinator
            .apply(&mut session, UpdateRequest::Voice("200 please".into()))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            VoiceError::Parse(ParseFailure::MissingCategory { amount: 200.0 })
        );
        assert!(err.user_message().contains("books supplies"));
        assert_eq!(session.record(), &before);
        assert_eq!(session.state(), SessionState::AwaitingInput);
        assert_eq!(session.updates(), 0);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let coordinator = coordinator_with_seed(SeedStrategy::Empty);
        let store = store();
        let mut alice = coordinator.start_session(&store, date(2024, 1, 15));
        let bob = coordinator.start_session(&store, date(2024, 1, 15));

        coordinator
            .apply(&mut alice, UpdateRequest::Voice("tuition 500".into()))
            .await
            .unwrap();

        assert_eq!(alice.record().amount(Category::Tuition), 500.0);
        assert_eq!(bob.record().amount(Category::Tuition), 0.0);
    }

    #[tokio::test]
    async fn test_report_carries_feedback() {
        let coordinator = coordinator_with_seed(SeedStrategy::Empty);
        let mut session = coordinator.start_session(&store(), date(2024, 1, 15));

        let update = FieldUpdate::new()
            .expense(Category::Housing, 1600.0)
            .expense(Category::Entertainment, 600.0)
            .income(3000.0);
        let report = coordinator
            .apply(&mut session, UpdateRequest::Fields(update))
            .await
            .unwrap();

        assert_eq!(report.policy, ScoringPolicy::BalanceWeighted);
        assert_eq!(report.insights.len(), 1);
        assert!(report.insights[0].contains("housing"));
        assert_eq!(report.nudges.len(), 1);
        assert!(!report.challenges.is_empty());
        assert!(report.score <= 100);
        assert_eq!(report.expenses.len(), Category::COUNT);
    }

    #[tokio::test]
    async fn test_assisted_parser_in_session() {
        let parser = AssistedParser::new(Some(AIClient::mock()));
        let config = Config {
            seed: SeedStrategy::Empty,
            ..Config::default()
        };
        let coordinator = SessionCoordinator::new(&config, Box::new(parser));
        let mut session = coordinator.start_session(&store(), date(2024, 1, 15));

        coordinator
            .apply(&mut session, UpdateRequest::Voice("uber home 14.5".into()))
            .await
            .unwrap();
        assert_eq!(session.record().amount(Category::Transportation), 14.5);
    }

    #[test]
    fn test_evaluate_does_not_mutate() {
        let coordinator = coordinator();
        let mut session = coordinator.start_session(&store(), date(2024, 1, 15));
        let before = session.record().clone();

        let first = coordinator.evaluate(&mut session);
        let second = coordinator.evaluate(&mut session);
        assert_eq!(first, second);
        assert_eq!(session.record(), &before);
        assert_eq!(session.state(), SessionState::Scored);
    }

    #[test]
    fn test_report_serializes_ordered_expenses() {
        let coordinator = coordinator_with_seed(SeedStrategy::Empty);
        let mut session = coordinator.start_session(&store(), date(2024, 1, 15));
        let report = coordinator.evaluate(&mut session);

        let json = serde_json::to_string(&report).unwrap();
        let tuition = json.find("\"tuition\"").unwrap();
        let misc = json.find("\"miscellaneous\"").unwrap();
        assert!(tuition < misc);
        assert!(json.contains("\"policy\":\"balance_weighted\""));
    }

    #[test]
    fn test_submit_writes_to_store() {
        let coordinator = coordinator();
        let mut store = store();
        let session = coordinator.start_session(&store, date(2024, 1, 15));

        coordinator.submit(&session, &mut store).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.latest().unwrap().date, date(2024, 1, 15));
    }
}
