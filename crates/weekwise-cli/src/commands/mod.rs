//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config, store, parser, dates, report output)
//! - `score` - One-shot scoring of a seeded week
//! - `log` - Free-text expense logging
//! - `session` - Interactive weekly session
//! - `history` - Stored weeks and averages
//! - `parse` - Parser preview
//! - `config` - Resolved configuration

pub mod config;
pub mod core;
pub mod history;
pub mod log;
pub mod parse;
pub mod score;
pub mod session;

// Re-export command functions for main.rs
pub use config::*;
pub use core::*;
pub use history::*;
pub use log::*;
pub use parse::*;
pub use score::*;
pub use session::*;

/// Format an amount as dollars with cents
pub fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}
