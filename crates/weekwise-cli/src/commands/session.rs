//! Interactive weekly session
//!
//! Reads one command per line:
//! - `set food=45 income=800` - overwrite the named fields
//! - `say spent 12 on transportation` - add a free-text expense
//! - `show` - score the current draft
//! - `submit` - save the draft to the weekly log
//! - `help`, `quit`

use std::io::{BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use weekwise_core::{
    Category, Config, ExpenseParser, FieldUpdate, RecordStore, SessionCoordinator, SessionReport,
    UpdateRequest,
};

use super::render_report;

const HELP: &str = "\
Commands:
  set <field>=<amount> ...   Overwrite fields (categories, income, aid)
  say <text>                 Add an expense, e.g. \"say spent 12 on food\"
  show                       Score the current draft
  submit                     Save the draft
  quit                       Leave (unsaved changes are discarded)";

/// One line of session input
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Set(FieldUpdate),
    Say(String),
    Show,
    Submit,
    Help,
    Quit,
}

/// Parse `field=amount` pairs separated by whitespace
pub fn parse_assignments(args: &str) -> Result<FieldUpdate> {
    let mut update = FieldUpdate::new();

    for pair in args.split_whitespace() {
        let (field, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected <field>=<amount>, got '{}'", pair))?;
        let amount: f64 = value
            .trim_start_matches('$')
            .parse()
            .with_context(|| format!("Invalid amount for {}: '{}'", field, value))?;
        if !amount.is_finite() || amount < 0.0 {
            bail!("Amount for {} must be zero or more", field);
        }

        match field.to_lowercase().as_str() {
            "income" => update.income = Some(amount),
            "aid" | "financial_aid" => update.financial_aid = Some(amount),
            other => {
                let category: Category = other.parse().map_err(|e: String| anyhow!(e))?;
                update.expenses.insert(category, amount);
            }
        }
    }

    if update.is_empty() {
        bail!("Nothing to set. Example: set food=45 income=800");
    }
    Ok(update)
}

/// Parse a line of input; blank lines yield `None`
pub fn parse_session_command(line: &str) -> Result<Option<SessionCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match verb.to_lowercase().as_str() {
        "set" => SessionCommand::Set(parse_assignments(rest)?),
        "say" => {
            if rest.is_empty() {
                bail!("Nothing to say. Example: say spent 12 on food");
            }
            SessionCommand::Say(rest.to_string())
        }
        "show" => SessionCommand::Show,
        "submit" | "save" => SessionCommand::Submit,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" => SessionCommand::Quit,
        other => bail!("Unknown command '{}'. Type 'help' for commands.", other),
    };
    Ok(Some(command))
}

fn write_report<W: Write>(output: &mut W, report: &SessionReport, json: bool) -> Result<()> {
    if json {
        writeln!(output, "{}", serde_json::to_string(report)?)?;
    } else {
        write!(output, "{}", render_report(report))?;
    }
    Ok(())
}

/// Run an interactive session until `quit` or end of input
pub async fn cmd_session<R: BufRead, W: Write>(
    config: &Config,
    store: &mut RecordStore,
    parser: Box<dyn ExpenseParser>,
    date: NaiveDate,
    input: R,
    mut output: W,
    json: bool,
) -> Result<()> {
    let coordinator = SessionCoordinator::new(config, parser);
    let mut session = coordinator.start_session(store, date);
    let mut unsaved = false;

    if !json {
        writeln!(
            output,
            "📝 Session for the week of {} (seeded from {}, parser: {})",
            date,
            coordinator.seed_strategy(),
            coordinator.parser_name()
        )?;
        writeln!(output, "{}", HELP)?;
    }

    let mut lines = input.lines();
    loop {
        if !json {
            write!(output, "> ")?;
            output.flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read input")?;

        let command = match parse_session_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(output, "❌ {}", e)?;
                continue;
            }
        };

        match command {
            SessionCommand::Set(update) => {
                let report = coordinator
                    .apply(&mut session, UpdateRequest::Fields(update))
                    .await?;
                unsaved = true;
                write_report(&mut output, &report, json)?;
            }
            SessionCommand::Say(text) => {
                match coordinator
                    .apply(&mut session, UpdateRequest::Voice(text))
                    .await
                {
                    Ok(report) => {
                        unsaved = true;
                        write_report(&mut output, &report, json)?;
                    }
                    Err(e) => writeln!(output, "❌ {}", e.user_message())?,
                }
            }
            SessionCommand::Show => {
                let report = coordinator.evaluate(&mut session);
                write_report(&mut output, &report, json)?;
            }
            SessionCommand::Submit => match coordinator.submit(&session, store) {
                Ok(()) => {
                    unsaved = false;
                    writeln!(output, "✅ Saved week of {}", session.date())?;
                }
                Err(e) => writeln!(output, "❌ Failed to save week: {}", e)?,
            },
            SessionCommand::Help => writeln!(output, "{}", HELP)?,
            SessionCommand::Quit => break,
        }
    }

    if unsaved {
        writeln!(output, "⚠️  Unsaved changes discarded")?;
    }
    Ok(())
}
