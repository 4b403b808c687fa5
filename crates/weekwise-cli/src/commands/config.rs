//! Configuration display

use anyhow::Result;
use serde_json::json;
use weekwise_core::config::default_config_path;
use weekwise_core::{AIBackend, AIClient, Config};

pub fn cmd_config(config: &Config, json: bool) -> Result<()> {
    let ai = AIClient::from_env();
    let t = &config.feedback;

    if json {
        let value = json!({
            "source": config.source.to_string(),
            "scoring": { "policy": config.scoring.as_str() },
            "session": { "seed": config.seed.as_str() },
            "feedback": t,
            "storage": {
                "history": config.storage.history,
                "log": config.storage.log,
            },
            "ai": ai.as_ref().map(|c| json!({
                "backend": c.kind(),
                "model": c.model(),
                "host": c.host(),
            })),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!();
    println!("⚙️  Weekwise Configuration");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Source: {}", config.source);
    if let Some(path) = default_config_path() {
        println!("   Override path: {}", path.display());
    }
    println!();
    println!("   Scoring policy: {}", config.scoring);
    println!("   Session seed:   {}", config.seed);
    println!();
    println!("   Feedback thresholds:");
    println!("     High spend (insight):  {:.2}", t.high_spend_threshold);
    println!("     Nudge:                 {:.2}", t.nudge_threshold);
    println!("     Food / income ratio:   {:.2}", t.food_income_ratio);
    println!("     Entertainment limit:   {:.2}", t.entertainment_limit);
    println!("     Technology limit:      {:.2}", t.technology_limit);
    println!("     Under-budget ratio:    {:.2}", t.under_budget_ratio);
    println!();
    println!("   Storage:");
    for path in &config.storage.history {
        let marker = if path.exists() { "✅" } else { "❌" };
        println!("     {} history: {}", marker, path.display());
    }
    println!("     log: {}", config.storage.log.display());
    println!();
    match ai {
        Some(client) => println!(
            "   🤖 AI fallback: {} ({} at {})",
            client.kind(),
            client.model(),
            client.host()
        ),
        None => println!("   💡 Tip: Set OLLAMA_HOST to let a local model help parse entries"),
    }
    println!();

    Ok(())
}
