//! Weekwise CLI - Weekly expense scoring for students
//!
//! Usage:
//!   weekwise score --food 45 --income 800   Score this week's draft
//!   weekwise log "spent 45 on food"          Add an expense and save the week
//!   weekwise session                         Interactive weekly session
//!   weekwise history --limit 5               List stored weeks

mod cli;
mod commands;


use std::io;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(io::stderr)
                .compact(),
        )
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Score { fields, date } => {
            let store = commands::open_store(&config)?;
            let date = commands::resolve_date(date.as_deref())?;
            commands::cmd_score(&config, &store, commands::field_update(&fields), date, cli.json)
                .await
                .map(|_| ())
        }
        Commands::Log { text, date, no_ai } => {
            let mut store = commands::open_store(&config)?;
            let date = commands::resolve_date(date.as_deref())?;
            let parser = commands::build_parser(no_ai);
            commands::cmd_log(&config, &mut store, parser, &text, date, cli.json)
                .await
                .map(|_| ())
        }
        Commands::Session { date, no_ai } => {
            let mut store = commands::open_store(&config)?;
            let date = commands::resolve_date(date.as_deref())?;
            let parser = commands::build_parser(no_ai);
            let stdin = io::stdin();
            commands::cmd_session(
                &config,
                &mut store,
                parser,
                date,
                stdin.lock(),
                io::stdout(),
                cli.json,
            )
            .await
        }
        Commands::History { limit } => {
            let store = commands::open_store(&config)?;
            commands::cmd_history(&config, &store, limit, cli.json)
        }
        Commands::Averages => {
            let store = commands::open_store(&config)?;
            commands::cmd_averages(&store, cli.json)
        }
        Commands::Parse { text, no_ai } => {
            let parser = commands::build_parser(no_ai);
            commands::cmd_parse(parser.as_ref(), &text, cli.json)
                .await
                .map(|_| ())
        }
        Commands::Config => commands::cmd_config(&config, cli.json),
    }
}
