// 📐 Input validation - raw text from the UI to typed values
// Every mutation path goes through here before touching SQLite.

use crate::error::ValidationError;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reject empty or whitespace-only input, returning the trimmed text.
pub fn require<'a>(field: &'static str, input: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyField { field })
    } else {
        Ok(trimmed)
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(field: &'static str, input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = require(field, input)?;
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| ValidationError::BadDate {
        field,
        input: trimmed.to_string(),
    })
}

/// Parse a decimal amount. Signed values are allowed, NaN and infinities are not.
pub fn parse_amount(field: &'static str, input: &str) -> Result<f64, ValidationError> {
    let trimmed = require(field, input)?;
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::BadNumber {
            field,
            input: trimmed.to_string(),
        }),
    }
}

/// Canonical storage form; keeps SQL `BETWEEN` on text equal to calendar order.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Validated expense that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
}

impl NewExpense {
    /// All three fields must be present before either value is parsed.
    pub fn parse(date: &str, category: &str, amount: &str) -> Result<Self, ValidationError> {
        require("date", date)?;
        let category = require("category", category)?;
        require("amount", amount)?;

        let amount = parse_amount("amount", amount)?;
        let date = parse_date("date", date)?;

        Ok(NewExpense {
            date,
            category: category.to_string(),
            amount,
        })
    }
}

/// Validated inclusive date range
pub fn parse_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let start_date = parse_date("start date", start)?;
    let end_date = parse_date("end date", end)?;
    if start_date > end_date {
        return Err(ValidationError::InvalidRange {
            start: format_date(start_date),
            end: format_date(end_date),
        });
    }
    Ok((start_date, end_date))
}
