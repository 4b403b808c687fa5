//! Financial health score (0-100)
//!
//! Two scoring policies exist and are both first-class, selected through
//! configuration:
//!
//! - **Balance weighted**: savings against income plus aid (70 points) and how
//!   evenly spending is spread across categories (30 points).
//! - **Aid and buffer weighted**: savings against income (70 points), a bonus
//!   for financial aid (up to 10 points) and a flat buffer bonus when more than
//!   20% of income is left (20 points).
//!
//! Zero income or aid never fails: every ratio falls back to zero and the
//! breakdown is flagged as degenerate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::WeeklyRecord;

/// Guards the balance term when nothing has been spent
const BALANCE_EPSILON: f64 = 1e-5;

const SAVINGS_WEIGHT: f64 = 70.0;
const BALANCE_WEIGHT: f64 = 30.0;
const AID_SCORE_CAP: f64 = 10.0;
const BUFFER_BONUS: f64 = 20.0;
const BUFFER_SAVINGS_RATIO: f64 = 0.2;

/// Which scoring formula to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    #[default]
    BalanceWeighted,
    AidAndBufferWeighted,
}

impl ScoringPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BalanceWeighted => "balance_weighted",
            Self::AidAndBufferWeighted => "aid_and_buffer_weighted",
        }
    }

    /// Score a weekly snapshot
    pub fn score(&self, record: &WeeklyRecord) -> u8 {
        self.breakdown(record).score
    }

    /// Score with the intermediate terms exposed
    pub fn breakdown(&self, record: &WeeklyRecord) -> ScoreBreakdown {
        let breakdown = match self {
            Self::BalanceWeighted => balance_weighted(record),
            Self::AidAndBufferWeighted => aid_and_buffer_weighted(record),
        };
        debug!(
            policy = self.as_str(),
            score = breakdown.score,
            savings_ratio = breakdown.savings_ratio,
            degenerate = breakdown.degenerate,
            "Scored weekly record"
        );
        breakdown
    }
}

impl fmt::Display for ScoringPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScoringPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "balance_weighted" => Ok(Self::BalanceWeighted),
            "aid_and_buffer_weighted" => Ok(Self::AidAndBufferWeighted),
            _ => Err(format!("Unknown scoring policy: {}", s)),
        }
    }
}

/// Intermediate terms of a score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub policy: ScoringPolicy,
    pub score: u8,
    pub total_expense: f64,
    pub savings_ratio: f64,
    /// Only set by the balance weighted policy
    pub balance_score: Option<f64>,
    /// Only set by the aid and buffer weighted policy
    pub aid_score: Option<f64>,
    /// Only set by the aid and buffer weighted policy
    pub buffer_score: Option<f64>,
    /// A ratio had a zero denominator and was replaced by zero
    pub degenerate: bool,
}

fn balance_weighted(record: &WeeklyRecord) -> ScoreBreakdown {
    let total_expense = record.total_expense();
    let total_income = record.total_income();

    let (savings_ratio, degenerate) = ratio((total_income - total_expense).max(0.0), total_income);
    let balance_score = (1.0 - sample_std_dev(record.amounts()) / (total_expense + BALANCE_EPSILON))
        .max(0.0);

    let raw = savings_ratio * SAVINGS_WEIGHT + balance_score * BALANCE_WEIGHT;

    ScoreBreakdown {
        policy: ScoringPolicy::BalanceWeighted,
        score: clamp_score(raw.round()),
        total_expense,
        savings_ratio,
        balance_score: Some(balance_score),
        aid_score: None,
        buffer_score: None,
        degenerate,
    }
}

fn aid_and_buffer_weighted(record: &WeeklyRecord) -> ScoreBreakdown {
    let total_expense = record.total_expense();
    let income = record.income();

    let (savings_ratio, degenerate) = ratio((income - total_expense).max(0.0), income);
    let (aid_ratio, _) = ratio(record.financial_aid(), income);
    let aid_score = (aid_ratio * 100.0).min(AID_SCORE_CAP);
    let buffer_score = if savings_ratio > BUFFER_SAVINGS_RATIO {
        BUFFER_BONUS
    } else {
        0.0
    };

    let raw = (savings_ratio * SAVINGS_WEIGHT).round() + aid_score + buffer_score;

    ScoreBreakdown {
        policy: ScoringPolicy::AidAndBufferWeighted,
        score: clamp_score(raw.round()),
        total_expense,
        savings_ratio,
        balance_score: None,
        aid_score: Some(aid_score),
        buffer_score: Some(buffer_score),
        degenerate,
    }
}

/// Divide, substituting zero for a non-positive denominator
///
/// Returns the ratio and whether the substitution happened.
fn ratio(numerator: f64, denominator: f64) -> (f64, bool) {
    if denominator > 0.0 {
        (numerator / denominator, false)
    } else {
        debug!(numerator, "Zero denominator in score ratio, using 0");
        (0.0, true)
    }
}

/// Sample standard deviation (n - 1 denominator)
fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

fn clamp_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 100.0) as u8
}
