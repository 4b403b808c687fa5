//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap the JSON payload in extra prose, so the first `{` to the
//! last `}` is extracted before deserializing.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{sanitize_amount, Category};
use crate::parser::ParsedExpense;

/// Loose shape of the model's answer
#[derive(Debug, Deserialize)]
struct RawExpense {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    amount: Option<Value>,
}

/// Parse an expense extraction from an AI response
pub fn parse_expense_response(response: &str) -> Result<ParsedExpense> {
    let json_str = extract_json(response)?;
    let raw: RawExpense = serde_json::from_str(json_str)
        .map_err(|e| Error::InvalidData(format!("Invalid expense JSON from AI: {}", e)))?;

    let category = raw
        .category
        .as_deref()
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
        .and_then(|s| match s.parse::<Category>() {
            Ok(c) => Some(c),
            Err(e) => {
                debug!(error = %e, "AI suggested a category outside the fixed set");
                None
            }
        });

    let amount = raw.amount.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').parse::<f64>().ok(),
        _ => None,
    });

    Ok(ParsedExpense {
        category,
        amount: amount.map(sanitize_amount).filter(|a| *a > 0.0),
    })
}

fn extract_json(response: &str) -> Result<&str> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            truncate(response, 200)
        ))),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}
