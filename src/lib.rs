// Expense Ledger - Core Library
// Exposes all modules for use in the CLI/TUI, the API server, and tests

pub mod budget;
pub mod chart;
pub mod config;
pub mod csv_io;
pub mod db;
pub mod error;
pub mod logging;
pub mod store;
pub mod tracker;
pub mod validation;

// Re-export commonly used types
pub use budget::{Budget, BudgetStatus, BudgetTracker};
pub use chart::{category_totals, render_text, CategoryTotal, ChartData};
pub use config::{LedgerPaths, Settings};
pub use csv_io::{export_csv, import_csv, ImportSummary};
pub use db::{setup_database, Expense, ExpenseId};
pub use error::{LedgerError, LedgerResult, ValidationError};
pub use store::ExpenseStore;
pub use tracker::{ExpenseTracker, Listing};
pub use validation::NewExpense;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
