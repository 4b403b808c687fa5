//! Weekwise Core Library
//!
//! Weekly expense scoring and feedback for students:
//! - Record store over CSV history tables and an atomically written weekly log
//! - Financial health scoring with two selectable policies
//! - Mood insights, nudges and challenge rules
//! - Free-text expense parsing with an optional local AI fallback
//! - Session coordination with per-session state

pub mod ai;
pub mod config;
pub mod error;
pub mod feedback;
pub mod models;
pub mod parser;
pub mod scoring;
pub mod session;
pub mod store;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, MockBackend, OllamaBackend, OpenAICompatibleBackend};
pub use config::{Config, ConfigSource, StorageConfig};
pub use error::{Error, Result};
pub use feedback::{ChallengeId, ChallengeRule, Feedback, FeedbackEngine, FeedbackThresholds};
pub use models::{week_start, Category, WeeklyRecord};
pub use parser::{
    parse_expense_text, AssistedParser, ExpenseEntry, ExpenseParser, ParseFailure, ParsedExpense,
    RuleParser,
};
pub use scoring::{ScoreBreakdown, ScoringPolicy};
pub use session::{
    FieldUpdate, SeedStrategy, Session, SessionCoordinator, SessionReport, SessionState,
    UpdateRequest, VoiceError,
};
pub use store::{Averages, RecordStore};
