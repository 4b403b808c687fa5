//! Parser preview command

use anyhow::Result;
use serde_json::json;
use weekwise_core::{ExpenseParser, ParsedExpense};

use super::money;

/// Show what a free-text entry parses to, or why it can't be used
pub async fn cmd_parse(
    parser: &dyn ExpenseParser,
    text: &str,
    json: bool,
) -> Result<ParsedExpense> {
    let parsed = parser.parse(text).await;
    let outcome = parsed.into_entry();

    if json {
        let value = json!({
            "parser": parser.name(),
            "category": parsed.category,
            "amount": parsed.amount,
            "complete": outcome.is_ok(),
            "message": outcome.as_ref().err().map(|f| f.user_message()),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(parsed);
    }

    match outcome {
        Ok(entry) => {
            println!(
                "✅ {} on {} ({} parser)",
                money(entry.amount),
                entry.category.spoken(),
                parser.name()
            );
        }
        Err(failure) => {
            println!("❌ {}", failure.user_message());
            if let Some(amount) = parsed.amount {
                println!("   Amount found: {}", money(amount));
            }
            if let Some(category) = parsed.category {
                println!("   Category found: {}", category.spoken());
            }
        }
    }

    Ok(parsed)
}
