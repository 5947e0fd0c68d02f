// Error taxonomy for the ledger
// Validation failures are recoverable at the UI boundary; everything else is plumbing.

use crate::db::ExpenseId;
use thiserror::Error;

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

/// Rejected user input. Raised before anything touches the store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be a number, got '{input}'")]
    BadNumber { field: &'static str, input: String },

    #[error("Date {input} is not in the correct format (YYYY-MM-DD)")]
    BadDate { field: &'static str, input: String },

    #[error("{field} is required")]
    EmptyField { field: &'static str },

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: String, end: String },
}

impl ValidationError {
    pub fn is_bad_number(&self) -> bool {
        matches!(self, ValidationError::BadNumber { .. })
    }

    pub fn is_bad_date(&self) -> bool {
        matches!(self, ValidationError::BadDate { .. })
    }
}

// ============================================================================
// LEDGER ERRORS
// ============================================================================

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Delete requested without a selected row
    #[error("nothing selected")]
    NoSelection,

    #[error("expense {0} not found")]
    NotFound(ExpenseId),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// True for failures caused by user input rather than the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            LedgerError::Validation(_) | LedgerError::NoSelection | LedgerError::NotFound(_)
        )
    }

    /// Text shown in the status line / error dialog.
    pub fn user_message(&self) -> String {
        match self {
            LedgerError::Validation(ValidationError::EmptyField { .. }) => {
                "Please fill all the fields!".to_string()
            }
            LedgerError::Validation(ValidationError::BadNumber { field, .. }) => {
                format!("Please enter a valid number for the {}.", field)
            }
            LedgerError::Validation(err) => err.to_string(),
            LedgerError::NoSelection => "Please select an expense to delete!".to_string(),
            LedgerError::NotFound(id) => format!("Expense #{} no longer exists.", id),
            other => format!("Something went wrong: {}", other),
        }
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
