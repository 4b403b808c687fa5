//! Free-text ("voice") expense parsing
//!
//! The rule-based parser pulls the first number out of the text as the amount
//! and the first category (in canonical order) whose spoken form appears in
//! the lowercased text. It never fails: missing pieces are represented in
//! [`ParsedExpense`], and [`ParsedExpense::into_entry`] turns an incomplete
//! result into a [`ParseFailure`] with a user-facing message.
//!
//! Parsing is exposed to the session layer through the [`ExpenseParser`]
//! trait so a generative-text backend can be plugged in as a fallback
//! ([`AssistedParser`]) without the core depending on a specific provider.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::ai::{AIBackend, AIClient};
use crate::models::Category;

const AMOUNT_PATTERN: &str = r"\d+(?:\.\d+)?";

fn amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(AMOUNT_PATTERN).expect("amount pattern compiles"))
}

/// Intermediate parse result; either field may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedExpense {
    pub category: Option<Category>,
    pub amount: Option<f64>,
}

/// A complete voice entry, ready to be added to the week
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub category: Category,
    pub amount: f64,
}

/// Why a voice entry could not be used
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ParseFailure {
    #[error("no category or amount found")]
    MissingCategoryAndAmount,

    #[error("no category found (amount {amount})")]
    MissingCategory { amount: f64 },

    #[error("no amount found for {category}")]
    MissingAmount { category: Category },
}

impl ParseFailure {
    /// Message for the person who typed or spoke the entry
    pub fn user_message(&self) -> String {
        match self {
            ParseFailure::MissingCategory { .. } | ParseFailure::MissingCategoryAndAmount => {
                let valid = Category::all()
                    .iter()
                    .map(|c| c.spoken())
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut message = format!("Couldn't detect a category. Try one of: {}.", valid);
                if matches!(self, ParseFailure::MissingCategoryAndAmount) {
                    message.push_str(" Include an amount too, e.g. \"spent 45 on food\".");
                }
                message
            }
            ParseFailure::MissingAmount { category } => format!(
                "Couldn't detect an amount for {}. Say something like \"spent 45 on {}\".",
                category.spoken(),
                category.spoken()
            ),
        }
    }
}

impl ParsedExpense {
    pub fn is_complete(&self) -> bool {
        self.category.is_some() && self.amount.is_some()
    }

    /// Promote to an entry, or report what is missing
    pub fn into_entry(self) -> Result<ExpenseEntry, ParseFailure> {
        match (self.category, self.amount) {
            (Some(category), Some(amount)) => Ok(ExpenseEntry { category, amount }),
            (None, Some(amount)) => Err(ParseFailure::MissingCategory { amount }),
            (Some(category), None) => Err(ParseFailure::MissingAmount { category }),
            (None, None) => Err(ParseFailure::MissingCategoryAndAmount),
        }
    }

    /// Keep fields already present, fill the rest from `other`
    pub fn or(self, other: ParsedExpense) -> ParsedExpense {
        ParsedExpense {
            category: self.category.or(other.category),
            amount: self.amount.or(other.amount),
        }
    }
}

/// First integer-or-decimal token in the text
///
/// A token too large to represent counts as no amount.
pub fn extract_amount(text: &str) -> Option<f64> {
    amount_regex()
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|amount| amount.is_finite())
}

/// First category (canonical order) whose spoken form occurs in the text
pub fn extract_category(text: &str) -> Option<Category> {
    let lowered = text.to_lowercase();
    Category::all()
        .iter()
        .copied()
        .find(|c| lowered.contains(&c.spoken()))
}

/// Rule-based parse of a free-text expense entry
pub fn parse_expense_text(text: &str) -> ParsedExpense {
    let parsed = ParsedExpense {
        category: extract_category(text),
        amount: extract_amount(text),
    };
    debug!(
        category = ?parsed.category,
        amount = ?parsed.amount,
        "Parsed expense text"
    );
    parsed
}

/// Capability that turns free text into a [`ParsedExpense`]
///
/// Implementations never error; absence is represented in the result.
#[async_trait]
pub trait ExpenseParser: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &'static str;

    async fn parse(&self, text: &str) -> ParsedExpense;
}

/// The pure rule-based parser
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleParser;

#[async_trait]
impl ExpenseParser for RuleParser {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn parse(&self, text: &str) -> ParsedExpense {
        parse_expense_text(text)
    }
}

/// Rules first, then an AI backend for whatever the rules missed
#[derive(Clone)]
pub struct AssistedParser {
    ai: Option<AIClient>,
}

impl AssistedParser {
    pub fn new(ai: Option<AIClient>) -> Self {
        Self { ai }
    }

    /// Use whatever backend the environment configures
    pub fn from_env() -> Self {
        Self::new(AIClient::from_env())
    }

    pub fn has_backend(&self) -> bool {
        self.ai.is_some()
    }
}

#[async_trait]
impl ExpenseParser for AssistedParser {
    fn name(&self) -> &'static str {
        "assisted"
    }

    async fn parse(&self, text: &str) -> ParsedExpense {
        let parsed = parse_expense_text(text);
        if parsed.is_complete() {
            return parsed;
        }

        let Some(ai) = self.ai.as_ref() else {
            return parsed;
        };

        match ai.extract_expense(text).await {
            Ok(suggestion) => {
                debug!(
                    model = ai.model(),
                    category = ?suggestion.category,
                    amount = ?suggestion.amount,
                    "AI filled in expense"
                );
                parsed.or(suggestion)
            }
            Err(e) => {
                warn!(model = ai.model(), error = %e, "AI expense extraction failed");
                parsed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;

    #[test]
    fn test_parse_complete_entry() {
        let parsed = parse_expense_text("spent 45 on food");
        assert_eq!(parsed.category, Some(Category::Food));
        assert_eq!(parsed.amount, Some(45.0));
        assert_eq!(
            parsed.into_entry().unwrap(),
            ExpenseEntry {
                category: Category::Food,
                amount: 45.0
            }
        );
    }

    #[test]
    fn test_parse_nothing_found() {
        let parsed = parse_expense_text("bought something nice");
        assert_eq!(parsed, ParsedExpense::default());
        assert_eq!(
            parsed.into_entry().unwrap_err(),
            ParseFailure::MissingCategoryAndAmount
        );
    }

    #[test]
    fn test_parse_amount_only() {
        let parsed = parse_expense_text("200 please");
        assert_eq!(parsed.category, None);
        assert_eq!(parsed.amount, Some(200.0));
        assert_eq!(
            parsed.into_entry().unwrap_err(),
            ParseFailure::MissingCategory { amount: 200.0 }
        );
    }

    #[test]
    fn test_parse_category_only() {
        let parsed = parse_expense_text("Paid my HOUSING bill");
        assert_eq!(
            parsed.into_entry().unwrap_err(),
            ParseFailure::MissingAmount {
                category: Category::Housing
            }
        );
    }

    #[test]
    fn test_decimal_and_first_number_wins() {
        let parsed = parse_expense_text("12.75 for transportation then 3 more");
        assert_eq!(parsed.amount, Some(12.75));
        assert_eq!(parsed.category, Some(Category::Transportation));
    }

    #[test]
    fn test_overflowing_amount_is_missing() {
        let text = format!("spent {} on food", "9".repeat(400));
        let parsed = parse_expense_text(&text);
        assert_eq!(parsed.amount, None);
        assert_eq!(
            parsed.into_entry().unwrap_err(),
            ParseFailure::MissingAmount {
                category: Category::Food
            }
        );
    }

    #[test]
    fn test_multi_word_categories_need_spaces() {
        assert_eq!(
            extract_category("20 on personal care stuff"),
            Some(Category::PersonalCare)
        );
        assert_eq!(
            extract_category("new books supplies 30"),
            Some(Category::BooksSupplies)
        );
        // The snake_case key is not the spoken form
        assert_eq!(extract_category("personal_care 20"), None);
    }

    #[test]
    fn test_first_category_in_canonical_order_wins() {
        // Food comes before entertainment regardless of position in the text
        let parsed = parse_expense_text("entertainment and food 30");
        assert_eq!(parsed.category, Some(Category::Food));
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let missing_category = ParseFailure::MissingCategory { amount: 5.0 }.user_message();
        let missing_amount = ParseFailure::MissingAmount {
            category: Category::Food,
        }
        .user_message();

        assert!(missing_category.contains("health wellness"));
        assert!(missing_category.contains("tuition"));
        assert!(missing_amount.contains("amount"));
        assert!(missing_amount.contains("food"));
        assert_ne!(missing_category, missing_amount);
    }

    #[test]
    fn test_or_keeps_existing_fields() {
        let rule = ParsedExpense {
            category: None,
            amount: Some(10.0),
        };
        let ai = ParsedExpense {
            category: Some(Category::Food),
            amount: Some(99.0),
        };
        let merged = rule.or(ai);
        assert_eq!(merged.category, Some(Category::Food));
        assert_eq!(merged.amount, Some(10.0));
    }

    #[tokio::test]
    async fn test_rule_parser_trait() {
        let parser = RuleParser;
        let parsed = parser.parse("45 on food").await;
        assert!(parsed.is_complete());
    }

    #[tokio::test]
    async fn test_assisted_parser_without_backend_matches_rules() {
        let parser = AssistedParser::new(None);
        assert!(!parser.has_backend());
        let parsed = parser.parse("coffee 4.50").await;
        assert_eq!(parsed.category, None);
        assert_eq!(parsed.amount, Some(4.5));
    }

    #[tokio::test]
    async fn test_assisted_parser_fills_missing_category() {
        let parser = AssistedParser::new(Some(AIClient::Mock(MockBackend::new())));
        let parsed = parser.parse("grabbed lunch for 12").await;
        assert_eq!(parsed.category, Some(Category::Food));
        assert_eq!(parsed.amount, Some(12.0));
    }

    #[tokio::test]
    async fn test_assisted_parser_backend_failure_keeps_rule_result() {
        let parser = AssistedParser::new(Some(AIClient::Mock(MockBackend::failing())));
        let parsed = parser.parse("grabbed lunch for 12").await;
        assert_eq!(parsed.category, None);
        assert_eq!(parsed.amount, Some(12.0));
    }
}
