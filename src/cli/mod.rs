use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::application::{AppError, BudgetSession, ImportSummary, PendingImport};
use crate::config::Config;
use crate::domain::{LedgerSnapshot, format_cents};
use crate::import::{HttpImportSource, ImportSource, StaticImportSource};
use crate::logging::init_tracing;

/// Tally - in-memory budget ledger
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Track income and expenses for one session, with optional expense import")]
#[command(version)]
pub struct Cli {
    /// JSON config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the import endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Override the maximum number of records taken per import
    #[arg(long)]
    pub import_limit: Option<usize>,

    /// Disable the network import source
    #[arg(long)]
    pub offline: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// One line typed into the budget shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Income(String),
    Add { amount: String, description: String },
    Remove(String),
    Fetch,
    Wait,
    List,
    Balance,
    Json,
    Help,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_lowercase().as_str() {
            "income" => Ok(ShellCommand::Income(rest.to_string())),
            "add" => {
                let (amount, description) = rest
                    .split_once(char::is_whitespace)
                    .ok_or("usage: add <amount> <description>")?;
                Ok(ShellCommand::Add {
                    amount: amount.to_string(),
                    description: description.trim().to_string(),
                })
            }
            "rm" | "remove" if !rest.is_empty() => Ok(ShellCommand::Remove(rest.to_string())),
            "rm" | "remove" => Err("usage: rm <id-prefix>".to_string()),
            "fetch" => Ok(ShellCommand::Fetch),
            "wait" => Ok(ShellCommand::Wait),
            "list" | "ls" => Ok(ShellCommand::List),
            "balance" => Ok(ShellCommand::Balance),
            "json" => Ok(ShellCommand::Json),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" => Ok(ShellCommand::Quit),
            other => Err(format!("unknown command '{}', try 'help'", other)),
        }
    }
}

const HELP: &str = "\
Commands:
  income <amount>              set monthly income (invalid input resets to 0)
  add <amount> <description>   add an expense
  rm <id-prefix>               remove an expense
  fetch                        import expenses in the background
  wait                         wait for running imports
  list                         show expenses
  balance                      show income, expenses and balance
  json                         dump the ledger as JSON
  quit                         end the session";

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Failed to load config from '{}'", path))?,
            None => Config::default(),
        };
        if let Some(endpoint) = &self.endpoint {
            config.import.endpoint = Some(endpoint.clone());
        }
        if let Some(limit) = self.import_limit {
            config.import.limit = limit;
        }
        Ok(config)
    }

    pub async fn run(self) -> Result<()> {
        init_tracing(self.verbose);

        let config = self.load_config()?;
        let source: Arc<dyn ImportSource> = if self.offline {
            Arc::new(StaticImportSource::new(Vec::new()))
        } else {
            Arc::new(
                HttpImportSource::new(&config.import)
                    .context("Failed to build HTTP import source")?,
            )
        };

        let session = BudgetSession::new(source, config.import);
        info!("budget session started");
        println!("Budget session started. Type 'help' for commands.");

        let mut pending: Vec<PendingImport> = Vec::new();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await.context("Failed to read input")? {
            if line.trim().is_empty() {
                continue;
            }

            let command = match ShellCommand::parse(&line) {
                Ok(command) => command,
                Err(message) => {
                    eprintln!("{}", message);
                    continue;
                }
            };
            debug!(?command, "shell command");

            if command == ShellCommand::Quit {
                break;
            }
            run_command(&session, command, &mut pending).await?;
            report_finished(&mut pending).await;
        }

        if !pending.is_empty() {
            info!(count = pending.len(), "discarding imports still in flight");
        }
        session.close();
        Ok(())
    }
}

async fn run_command(
    session: &BudgetSession,
    command: ShellCommand,
    pending: &mut Vec<PendingImport>,
) -> Result<()> {
    match command {
        ShellCommand::Income(text) => {
            session.set_income_text(&text).await;
            let snapshot = session.snapshot().await;
            println!("Income set to {}", format_cents(snapshot.income));
        }

        ShellCommand::Add {
            amount,
            description,
        } => match session.add_expense(&description, &amount).await {
            Some(id) => println!("Added expense {}", short_id(&id.to_string())),
            None => println!("Nothing added."),
        },

        ShellCommand::Remove(prefix) => match session.remove_by_prefix(&prefix).await {
            Ok(record) => println!(
                "Removed {} ({})",
                record.description,
                format_cents(record.amount_cents)
            ),
            Err(e @ AppError::ExpenseNotFound(_)) => println!("{}", e),
            Err(e) => return Err(e.into()),
        },

        ShellCommand::Fetch => {
            pending.push(session.start_import());
            println!("Import started.");
        }

        ShellCommand::Wait => {
            for import in pending.drain(..) {
                print_import_result(import.wait().await);
            }
        }

        ShellCommand::List => print!("{}", render_expenses(&session.snapshot().await)),

        ShellCommand::Balance => print!("{}", render_summary(&session.snapshot().await)),

        ShellCommand::Json => {
            let snapshot = session.snapshot().await;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }

        ShellCommand::Help => println!("{}", HELP),

        ShellCommand::Quit => {}
    }
    Ok(())
}

async fn report_finished(pending: &mut Vec<PendingImport>) {
    let (finished, running): (Vec<_>, Vec<_>) =
        pending.drain(..).partition(|import| import.is_finished());
    *pending = running;
    for import in finished {
        print_import_result(import.wait().await);
    }
}

fn print_import_result(result: Result<ImportSummary, AppError>) {
    match result {
        Ok(summary) => println!(
            "Imported {} expense(s) ({} fetched, {} skipped).",
            summary.imported.len(),
            summary.fetched,
            summary.skipped
        ),
        Err(e) => eprintln!("{}", e),
    }
}

fn short_id(id: &str) -> &str {
    &id[..8.min(id.len())]
}

/// Expense table, oldest first.
pub fn render_expenses(snapshot: &LedgerSnapshot) -> String {
    if snapshot.expenses.is_empty() {
        return "No expenses.\n".to_string();
    }

    let mut out = format!("{:<10} {:<30} {:>12}\n", "ID", "DESCRIPTION", "AMOUNT");
    out.push_str(&"-".repeat(54));
    out.push('\n');
    for expense in &snapshot.expenses {
        let id = expense.id.to_string();
        out.push_str(&format!(
            "{:<10} {:<30} {:>12}\n",
            short_id(&id),
            expense.description,
            format_cents(expense.amount_cents)
        ));
    }
    out
}

/// Income / expenses / balance block. A negative balance is flagged.
pub fn render_summary(snapshot: &LedgerSnapshot) -> String {
    let mut out = format!(
        "Income:   {:>12}\nExpenses: {:>12}\nBalance:  {:>12}",
        format_cents(snapshot.income),
        format_cents(snapshot.total_expenses),
        format_cents(snapshot.balance)
    );
    if snapshot.balance < 0 {
        out.push_str("  (overspent)");
    }
    out.push('\n');
    out
}
