//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Weekwise - Score your student budget week by week
#[derive(Parser)]
#[command(name = "weekwise")]
#[command(about = "Weekly expense scoring and feedback for students", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the data dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score a week with the given fields applied to the seeded draft
    Score {
        #[command(flatten)]
        fields: FieldArgs,

        /// Week date (YYYY-MM-DD, defaults to this week's Monday)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Add a free-text expense to a week and save it
    ///
    /// Example: weekwise log "spent 45 on food"
    Log {
        /// Expense text, e.g. "12.50 transportation"
        text: String,

        /// Week date (YYYY-MM-DD, defaults to this week's Monday)
        #[arg(short, long)]
        date: Option<String>,

        /// Only use the rule-based parser
        #[arg(long)]
        no_ai: bool,
    },

    /// Interactive session: set fields, say expenses, then submit
    ///
    /// Commands: set <field>=<amount>..., say <text>, show, submit, help, quit
    Session {
        /// Week date (YYYY-MM-DD, defaults to this week's Monday)
        #[arg(short, long)]
        date: Option<String>,

        /// Only use the rule-based parser
        #[arg(long)]
        no_ai: bool,
    },

    /// List stored weeks, newest first
    History {
        /// Maximum number of weeks to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show per-category averages over all stored weeks
    Averages,

    /// Show how a free-text expense would be understood
    Parse {
        /// Expense text to parse
        text: String,

        /// Only use the rule-based parser
        #[arg(long)]
        no_ai: bool,
    },

    /// Show the resolved configuration and where it came from
    Config,
}

/// Optional amounts for every field of a week
#[derive(Args, Debug, Default, Clone)]
pub struct FieldArgs {
    #[arg(long)]
    pub tuition: Option<f64>,
    #[arg(long)]
    pub housing: Option<f64>,
    #[arg(long)]
    pub food: Option<f64>,
    #[arg(long)]
    pub transportation: Option<f64>,
    #[arg(long)]
    pub books_supplies: Option<f64>,
    #[arg(long)]
    pub entertainment: Option<f64>,
    #[arg(long)]
    pub personal_care: Option<f64>,
    #[arg(long)]
    pub technology: Option<f64>,
    #[arg(long)]
    pub health_wellness: Option<f64>,
    #[arg(long)]
    pub miscellaneous: Option<f64>,

    /// Income for the week
    #[arg(long)]
    pub income: Option<f64>,

    /// Financial aid for the week
    #[arg(long, alias = "aid")]
    pub financial_aid: Option<f64>,
}
