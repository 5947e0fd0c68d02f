// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use expense_ledger::logging::{init_file_tracing, init_tracing};
use expense_ledger::{
    export_csv, import_csv, render_text, BudgetStatus, ExpenseId, ExpenseTracker, LedgerError,
    LedgerPaths, Settings,
};

#[derive(Parser)]
#[command(
    name = "expense-ledger",
    version,
    about = "Track dated expenses against a budget",
    long_about = "Records dated, categorized expenses in a local SQLite file, checks them \
                  against a budget over a date range, and charts totals by category."
)]
struct Cli {
    /// Database file (defaults to the one named in config.json)
    #[arg(long, global = true, env = "EXPENSE_LEDGER_DB")]
    db: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive TUI (default)
    #[command(alias = "ui")]
    Tui,

    /// Add an expense
    Add {
        /// Date (YYYY-MM-DD)
        date: String,
        category: String,
        /// Decimal amount, may be negative
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// List all expenses with the running total
    #[command(alias = "ls")]
    List,

    /// Delete an expense by id
    #[command(alias = "rm")]
    Delete {
        id: Option<i64>,
    },

    /// Delete one expense equal to (date, category, amount)
    DeleteMatch {
        date: String,
        category: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// Budget management
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Show remaining budget or overage
    Status,

    /// Bar chart of totals by category
    Chart,

    /// Import expenses from CSV (date,category,amount)
    Import { file: PathBuf },

    /// Export all expenses to CSV
    Export { file: PathBuf },

    /// Show configuration and paths
    Config,
}

#[derive(Subcommand)]
enum BudgetCommands {
    /// Set (replace) the budget
    Set {
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Start date (YYYY-MM-DD), inclusive
        start: String,
        /// End date (YYYY-MM-DD), inclusive
        end: String,
    },
    /// Show the current budget
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = LedgerPaths::new()?;
    paths
        .ensure_directories()
        .with_context(|| format!("Failed to create {}", paths.base_dir().display()))?;

    let command = cli.command.unwrap_or(Commands::Tui);
    if matches!(command, Commands::Tui) {
        init_file_tracing(&paths.log_file(), cli.verbose);
    } else {
        init_tracing(cli.verbose);
    }

    let settings = Settings::load_or_create(&paths)?;
    let db_path = cli
        .db
        .unwrap_or_else(|| paths.database_file(&settings.database_file));

    let mut tracker = ExpenseTracker::open(&db_path, &settings)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let result = match command {
        Commands::Tui => run_ui_mode(tracker, &settings),
        other => run_command(other, &mut tracker, &settings, &paths, &db_path),
    };

    match result {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<LedgerError>() {
            Some(ledger_err) if ledger_err.is_user_error() => {
                eprintln!("❌ {}", ledger_err.user_message());
                std::process::exit(1);
            }
            _ => Err(err),
        },
    }
}

fn run_command(
    command: Commands,
    tracker: &mut ExpenseTracker,
    settings: &Settings,
    paths: &LedgerPaths,
    db_path: &std::path::Path,
) -> Result<()> {
    match command {
        // Dispatched in main, the TUI takes ownership of the tracker
        Commands::Tui => {}
        Commands::Add {
            date,
            category,
            amount,
        } => {
            let expense = tracker.add_expense(&date, &category, &amount)?;
            println!("✓ Expense added successfully! (#{})", expense.id);
            print_status(tracker)?;
        }
        Commands::List => print_listing(tracker, settings)?,
        Commands::Delete { id } => {
            tracker.delete_selected(id.map(ExpenseId))?;
            println!("✓ Expense deleted successfully!");
            print_status(tracker)?;
        }
        Commands::DeleteMatch {
            date,
            category,
            amount,
        } => {
            if tracker.delete_matching(&date, &category, &amount)? {
                println!("✓ Expense deleted successfully!");
                print_status(tracker)?;
            } else {
                println!("No matching expense");
            }
        }
        Commands::Budget(BudgetCommands::Set { amount, start, end }) => {
            let status = tracker.set_budget(&amount, &start, &end)?;
            if let Some(budget) = tracker.budget() {
                println!("{}", budget.describe());
            }
            print_budget_status(&status);
            if !settings.persist_budget {
                println!("(budget persistence is off; this budget is not saved)");
            }
        }
        Commands::Budget(BudgetCommands::Show) => match tracker.budget() {
            Some(budget) => println!("{}", budget.describe()),
            None => println!("No budget set"),
        },
        Commands::Status => match tracker.status()? {
            Some(status) => print_budget_status(&status),
            None => println!("No budget set"),
        },
        Commands::Chart => {
            let chart = tracker.chart()?;
            print!(
                "{}",
                render_text(&chart, settings.chart_width, &settings.currency_symbol)
            );
        }
        Commands::Import { file } => {
            let summary = import_csv(tracker.store(), &file)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            println!("✓ Inserted: {} expenses", summary.inserted);
            println!("✓ Skipped invalid rows: {}", summary.skipped.len());
            for (line, reason) in &summary.skipped {
                println!("   line {}: {}", line, reason);
            }
            print_status(tracker)?;
        }
        Commands::Export { file } => {
            let written = export_csv(tracker.store(), &file)
                .with_context(|| format!("Failed to export {}", file.display()))?;
            println!("✓ Exported {} expenses to {}", written, file.display());
        }
        Commands::Config => {
            println!("Data directory: {}", paths.base_dir().display());
            println!("Settings file:  {}", paths.settings_file().display());
            println!("Database:       {}", db_path.display());
            println!("Log file:       {}", paths.log_file().display());
            println!("{}", serde_json::to_string_pretty(settings)?);
        }
    }

    Ok(())
}

fn print_listing(tracker: &ExpenseTracker, settings: &Settings) -> Result<()> {
    let listing = tracker.list()?;

    println!("{:>5}  {:<10}  {:<24}  {:>12}", "ID", "DATE", "CATEGORY", "AMOUNT");
    for expense in &listing.expenses {
        println!(
            "{:>5}  {:<10}  {:<24}  {:>12}",
            expense.id,
            expense.date_string(),
            expense.category,
            settings.format_amount(expense.amount)
        );
    }
    println!("Total Expense: {}", settings.format_amount(listing.total));

    Ok(())
}

fn print_budget_status(status: &BudgetStatus) {
    if status.is_over() {
        println!("⚠️  {}", status.message());
    } else {
        println!("{}", status.message());
    }
}

fn print_status(tracker: &ExpenseTracker) -> Result<()> {
    if let Some(status) = tracker.status()? {
        print_budget_status(&status);
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(tracker: ExpenseTracker, settings: &Settings) -> Result<()> {
    let mut app = ui::App::new(tracker, settings.clone())?;
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_tracker: ExpenseTracker, _settings: &Settings) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the subcommands: expense-ledger --help");
    std::process::exit(1);
}
