use crate::budget::Budget;
use crate::chart::CategoryTotal;
use crate::error::LedgerResult;
use crate::validation::{format_date, NewExpense, DATE_FORMAT};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row identity assigned by SQLite (INTEGER PRIMARY KEY AUTOINCREMENT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(pub i64);

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
}

impl Expense {
    pub fn date_string(&self) -> String {
        format_date(self.date)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let date_str: String = row.get(1)?;
        let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

        Ok(Expense {
            id: ExpenseId(row.get(0)?),
            date,
            category: row.get(2)?,
            amount: row.get(3)?,
        })
    }
}

pub fn setup_database(conn: &Connection) -> LedgerResult<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Expenses Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            category TEXT NOT NULL,
            amount REAL NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Budget Table (single row, only written when persistence is enabled)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            max_amount REAL NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date)",
        [],
    )?;

    Ok(())
}

pub fn insert_expense(conn: &Connection, expense: &NewExpense) -> LedgerResult<Expense> {
    conn.execute(
        "INSERT INTO expenses (date, category, amount) VALUES (?1, ?2, ?3)",
        params![format_date(expense.date), expense.category, expense.amount],
    )?;

    Ok(Expense {
        id: ExpenseId(conn.last_insert_rowid()),
        date: expense.date,
        category: expense.category.clone(),
        amount: expense.amount,
    })
}

/// All expenses in storage order
pub fn get_all_expenses(conn: &Connection) -> LedgerResult<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, category, amount
         FROM expenses
         ORDER BY id",
    )?;

    let expenses = stmt
        .query_map([], Expense::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(expenses)
}

pub fn get_expense(conn: &Connection, id: ExpenseId) -> LedgerResult<Option<Expense>> {
    let expense = conn
        .query_row(
            "SELECT id, date, category, amount FROM expenses WHERE id = ?1",
            params![id.0],
            Expense::from_row,
        )
        .optional()?;

    Ok(expense)
}

/// Returns true when a row was removed
pub fn delete_expense(conn: &Connection, id: ExpenseId) -> LedgerResult<bool> {
    let removed = conn.execute("DELETE FROM expenses WHERE id = ?1", params![id.0])?;
    Ok(removed > 0)
}

/// Remove the oldest row equal to (date, category, amount), if any.
///
/// Exactly one row goes even when duplicates exist. This differs on purpose
/// from older desktop builds, which removed every matching row.
pub fn delete_one_matching(
    conn: &Connection,
    date: NaiveDate,
    category: &str,
    amount: f64,
) -> LedgerResult<Option<ExpenseId>> {
    let target: Option<i64> = conn.query_row(
        "SELECT MIN(id) FROM expenses WHERE date = ?1 AND category = ?2 AND amount = ?3",
        params![format_date(date), category, amount],
        |row| row.get(0),
    )?;

    match target {
        Some(id) => {
            conn.execute("DELETE FROM expenses WHERE id = ?1", params![id])?;
            Ok(Some(ExpenseId(id)))
        }
        None => Ok(None),
    }
}

pub fn verify_count(conn: &Connection) -> LedgerResult<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;

    Ok(count)
}

pub fn total_amount(conn: &Connection) -> LedgerResult<f64> {
    let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0.0) FROM expenses",
        [],
        |row| row.get(0),
    )?;

    Ok(total)
}

/// Sum of amounts with `start <= date <= end`
pub fn sum_in_range(conn: &Connection, start: NaiveDate, end: NaiveDate) -> LedgerResult<f64> {
    let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0.0) FROM expenses WHERE date BETWEEN ?1 AND ?2",
        params![format_date(start), format_date(end)],
        |row| row.get(0),
    )?;

    Ok(total)
}

/// Per-category sums within the range, ordered by category
pub fn sum_by_category_in_range(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> LedgerResult<Vec<CategoryTotal>> {
    let mut stmt = conn.prepare(
        "SELECT category, SUM(amount) as total
         FROM expenses
         WHERE date BETWEEN ?1 AND ?2
         GROUP BY category
         ORDER BY category",
    )?;

    let totals = stmt
        .query_map(params![format_date(start), format_date(end)], |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                total: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(totals)
}

/// Earliest and latest stored dates
pub fn date_span(conn: &Connection) -> LedgerResult<Option<(NaiveDate, NaiveDate)>> {
    let (min, max): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(date), MAX(date) FROM expenses",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let parse = |s: Option<String>| s.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok());

    Ok(match (parse(min), parse(max)) {
        (Some(start), Some(end)) => Some((start, end)),
        _ => None,
    })
}

pub fn save_budget(conn: &Connection, budget: &Budget) -> LedgerResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO budget (id, max_amount, start_date, end_date)
         VALUES (1, ?1, ?2, ?3)",
        params![
            budget.max_amount,
            format_date(budget.start),
            format_date(budget.end),
        ],
    )?;

    Ok(())
}

pub fn load_budget(conn: &Connection) -> LedgerResult<Option<Budget>> {
    let row: Option<(f64, String, String)> = conn
        .query_row(
            "SELECT max_amount, start_date, end_date FROM budget WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    let budget = row.and_then(|(max_amount, start, end)| {
        let start = NaiveDate::parse_from_str(&start, DATE_FORMAT).ok()?;
        let end = NaiveDate::parse_from_str(&end, DATE_FORMAT).ok()?;
        Some(Budget {
            max_amount,
            start,
            end,
        })
    });

    Ok(budget)
}
