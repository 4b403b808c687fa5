//! Mock backend for testing
//!
//! Provides keyword-based answers so the assisted parser can be exercised
//! without a running LLM server.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Category;
use crate::parser::{extract_amount, ParsedExpense};

use super::AIBackend;

/// Mock AI backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Whether extraction calls should fail
    pub fail: bool,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            fail: false,
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            fail: false,
        }
    }

    /// Create a backend whose extraction calls always error
    pub fn failing() -> Self {
        Self {
            healthy: true,
            fail: true,
        }
    }
}

/// Map everyday words to a category the way a model would
fn guess_category(text: &str) -> Option<Category> {
    let t = text.to_lowercase();
    let category = match t.as_str() {
        t if t.contains("lunch")
            || t.contains("dinner")
            || t.contains("groceries")
            || t.contains("pizza")
            || t.contains("coffee") =>
        {
            Category::Food
        }
        t if t.contains("uber") || t.contains("bus") || t.contains("gas") || t.contains("train") => {
            Category::Transportation
        }
        t if t.contains("rent") || t.contains("dorm") => Category::Housing,
        t if t.contains("movie") || t.contains("concert") || t.contains("game") => {
            Category::Entertainment
        }
        t if t.contains("textbook") || t.contains("notebook") => Category::BooksSupplies,
        t if t.contains("laptop") || t.contains("phone") || t.contains("headphones") => {
            Category::Technology
        }
        t if t.contains("gym") || t.contains("pharmacy") || t.contains("doctor") => {
            Category::HealthWellness
        }
        t if t.contains("haircut") || t.contains("shampoo") => Category::PersonalCare,
        _ => return None,
    };
    Some(category)
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn extract_expense(&self, text: &str) -> Result<ParsedExpense> {
        if self.fail {
            return Err(Error::InvalidData("Mock backend configured to fail".into()));
        }
        Ok(ParsedExpense {
            category: guess_category(text),
            amount: extract_amount(text),
        })
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
