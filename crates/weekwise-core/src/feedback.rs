//! Feedback Engine - rule-based insights, nudges and challenges
//!
//! Three independent lists are produced from the same weekly snapshot:
//!
//! - **Mood insights** - one observation per category above the high-spend
//!   threshold
//! - **Nudges** - one "reduce by 10%" suggestion per category above the nudge
//!   threshold
//! - **Challenges** - gamified suggestions from composite rules, each rule
//!   evaluated on its own
//!
//! All thresholds come from [`FeedbackThresholds`] so they can be tuned from
//! configuration without touching the rules.

use serde::{Deserialize, Serialize};

use crate::models::{Category, WeeklyRecord};

/// Tunable thresholds for every feedback rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackThresholds {
    /// Category amount above which a mood insight is emitted
    pub high_spend_threshold: f64,
    /// Category amount above which a nudge is emitted
    pub nudge_threshold: f64,
    /// Share of income that food may take before the no-takeout challenge
    pub food_income_ratio: f64,
    /// Entertainment amount above which the spend-free weekend is suggested
    pub entertainment_limit: f64,
    /// Technology amount above which a shopping pause is suggested
    pub technology_limit: f64,
    /// Total spending below this share of income earns the treat message
    pub under_budget_ratio: f64,
}

impl Default for FeedbackThresholds {
    fn default() -> Self {
        Self {
            high_spend_threshold: 1000.0,
            nudge_threshold: 1500.0,
            food_income_ratio: 0.2,
            entertainment_limit: 500.0,
            technology_limit: 300.0,
            under_budget_ratio: 0.7,
        }
    }
}

/// Identifiers for the built-in challenge rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeId {
    NoTakeout,
    SpendFreeWeekend,
    ShoppingPause,
    TreatYourself,
}

impl ChallengeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeId::NoTakeout => "no_takeout",
            ChallengeId::SpendFreeWeekend => "spend_free_weekend",
            ChallengeId::ShoppingPause => "shopping_pause",
            ChallengeId::TreatYourself => "treat_yourself",
        }
    }
}

/// A gamified challenge rule
///
/// Rules are pure predicates over the snapshot; they never see each other's
/// outcome.
pub trait ChallengeRule: Send + Sync {
    fn id(&self) -> ChallengeId;

    /// Message to show if the rule fires
    fn evaluate(&self, record: &WeeklyRecord, thresholds: &FeedbackThresholds)
        -> Option<String>;
}

/// Food above a share of income
pub struct NoTakeoutRule;

impl ChallengeRule for NoTakeoutRule {
    fn id(&self) -> ChallengeId {
        ChallengeId::NoTakeout
    }

    fn evaluate(&self, record: &WeeklyRecord, t: &FeedbackThresholds) -> Option<String> {
        (record.amount(Category::Food) > t.food_income_ratio * record.income()).then(|| {
            "Challenge: cook at home all week - no takeout for 7 days!".to_string()
        })
    }
}

pub struct SpendFreeWeekendRule;

impl ChallengeRule for SpendFreeWeekendRule {
    fn id(&self) -> ChallengeId {
        ChallengeId::SpendFreeWeekend
    }

    fn evaluate(&self, record: &WeeklyRecord, t: &FeedbackThresholds) -> Option<String> {
        (record.amount(Category::Entertainment) > t.entertainment_limit)
            .then(|| "Challenge: try a spend-free weekend with free campus events!".to_string())
    }
}

pub struct ShoppingPauseRule;

impl ChallengeRule for ShoppingPauseRule {
    fn id(&self) -> ChallengeId {
        ChallengeId::ShoppingPause
    }

    fn evaluate(&self, record: &WeeklyRecord, t: &FeedbackThresholds) -> Option<String> {
        (record.amount(Category::Technology) > t.technology_limit).then(|| {
            "Challenge: pause gadget shopping for two weeks and see what you really need."
                .to_string()
        })
    }
}

/// Total spending comfortably under income
pub struct TreatYourselfRule;

impl ChallengeRule for TreatYourselfRule {
    fn id(&self) -> ChallengeId {
        ChallengeId::TreatYourself
    }

    fn evaluate(&self, record: &WeeklyRecord, t: &FeedbackThresholds) -> Option<String> {
        (record.total_expense() < t.under_budget_ratio * record.income()).then(|| {
            "Great job staying under budget! Treat yourself to something small within budget."
                .to_string()
        })
    }
}

/// Evaluated feedback for one snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub insights: Vec<String>,
    pub nudges: Vec<String>,
    pub challenges: Vec<String>,
}

/// Evaluates the insight, nudge and challenge rules
pub struct FeedbackEngine {
    thresholds: FeedbackThresholds,
    rules: Vec<Box<dyn ChallengeRule>>,
}

impl Default for FeedbackEngine {
    fn default() -> Self {
        Self::new(FeedbackThresholds::default())
    }
}

impl FeedbackEngine {
    /// Create an engine with the built-in challenge rules in their fixed order
    pub fn new(thresholds: FeedbackThresholds) -> Self {
        let mut engine = Self {
            thresholds,
            rules: vec![],
        };

        engine.register(Box::new(NoTakeoutRule));
        engine.register(Box::new(SpendFreeWeekendRule));
        engine.register(Box::new(ShoppingPauseRule));
        engine.register(Box::new(TreatYourselfRule));

        engine
    }

    /// Append a challenge rule (evaluated after the existing ones)
    pub fn register(&mut self, rule: Box<dyn ChallengeRule>) {
        self.rules.push(rule);
    }

    pub fn thresholds(&self) -> &FeedbackThresholds {
        &self.thresholds
    }

    pub fn rule_ids(&self) -> Vec<ChallengeId> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// Evaluate all three lists over the same snapshot
    pub fn evaluate(&self, record: &WeeklyRecord) -> Feedback {
        let feedback = Feedback {
            insights: self.mood_insights(record),
            nudges: self.nudges(record),
            challenges: self.challenges(record),
        };
        tracing::debug!(
            insights = feedback.insights.len(),
            nudges = feedback.nudges.len(),
            challenges = feedback.challenges.len(),
            "Feedback evaluated"
        );
        feedback
    }

    pub fn mood_insights(&self, record: &WeeklyRecord) -> Vec<String> {
        record
            .expenses()
            .filter(|(_, amount)| *amount > self.thresholds.high_spend_threshold)
            .map(|(category, _)| {
                format!(
                    "High spending on {} may relate to your mood. Observe patterns!",
                    category.spoken()
                )
            })
            .collect()
    }

    pub fn nudges(&self, record: &WeeklyRecord) -> Vec<String> {
        record
            .expenses()
            .filter(|(_, amount)| *amount > self.thresholds.nudge_threshold)
            .map(|(category, _)| {
                format!(
                    "Try reducing {} spending by 10% this week to save more!",
                    category.spoken()
                )
            })
            .collect()
    }

    pub fn challenges(&self, record: &WeeklyRecord) -> Vec<String> {
        self.rules
            .iter()
            .filter_map(|rule| rule.evaluate(record, &self.thresholds))
            .collect()
    }
}
