// 🗄️ Expense Store - validated access to the expenses table

use crate::chart::CategoryTotal;
use crate::db::{self, Expense, ExpenseId};
use crate::error::LedgerResult;
use crate::validation::NewExpense;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info};

pub struct ExpenseStore {
    conn: Connection,
}

impl ExpenseStore {
    /// Open (or create) a file-backed store
    pub fn open(path: &Path) -> LedgerResult<Self> {
        let conn = Connection::open(path)?;
        db::setup_database(&conn)?;
        info!(path = %path.display(), "expense store opened");
        Ok(ExpenseStore { conn })
    }

    pub fn open_in_memory() -> LedgerResult<Self> {
        let conn = Connection::open_in_memory()?;
        db::setup_database(&conn)?;
        Ok(ExpenseStore { conn })
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Validate raw input and insert. The store is untouched on any validation failure.
    pub fn add(&self, date: &str, category: &str, amount: &str) -> LedgerResult<Expense> {
        let new_expense = NewExpense::parse(date, category, amount)?;
        self.insert(&new_expense)
    }

    pub fn insert(&self, new_expense: &NewExpense) -> LedgerResult<Expense> {
        let expense = db::insert_expense(&self.conn, new_expense)?;
        info!(
            id = expense.id.0,
            date = %expense.date,
            category = %expense.category,
            amount = expense.amount,
            "expense added"
        );
        Ok(expense)
    }

    pub fn list_all(&self) -> LedgerResult<Vec<Expense>> {
        db::get_all_expenses(&self.conn)
    }

    pub fn get(&self, id: ExpenseId) -> LedgerResult<Option<Expense>> {
        db::get_expense(&self.conn, id)
    }

    pub fn delete(&self, id: ExpenseId) -> LedgerResult<bool> {
        let removed = db::delete_expense(&self.conn, id)?;
        if removed {
            info!(id = id.0, "expense deleted");
        } else {
            debug!(id = id.0, "delete matched no expense");
        }
        Ok(removed)
    }

    /// Remove one row equal to the triple. No-op when nothing matches.
    pub fn delete_matching(
        &self,
        date: NaiveDate,
        category: &str,
        amount: f64,
    ) -> LedgerResult<bool> {
        match db::delete_one_matching(&self.conn, date, category, amount)? {
            Some(id) => {
                info!(id = id.0, "expense deleted by value");
                Ok(true)
            }
            None => {
                debug!(%date, category, amount, "delete by value matched nothing");
                Ok(false)
            }
        }
    }

    pub fn count(&self) -> LedgerResult<i64> {
        db::verify_count(&self.conn)
    }

    pub fn total(&self) -> LedgerResult<f64> {
        db::total_amount(&self.conn)
    }

    pub fn sum_in_range(&self, start: NaiveDate, end: NaiveDate) -> LedgerResult<f64> {
        db::sum_in_range(&self.conn, start, end)
    }

    pub fn sum_by_category_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<Vec<CategoryTotal>> {
        db::sum_by_category_in_range(&self.conn, start, end)
    }

    pub fn date_span(&self) -> LedgerResult<Option<(NaiveDate, NaiveDate)>> {
        db::date_span(&self.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_add_increases_count_and_total() {
        let store = ExpenseStore::open_in_memory().unwrap();
        store.add("2024-01-10", "food", "20").unwrap();

        let count_before = store.count().unwrap();
        let total_before = store.total().unwrap();

        let added = store.add("2024-01-11", "books", "12.25").unwrap();
        assert_eq!(added.amount, 12.25);

        assert_eq!(store.count().unwrap(), count_before + 1);
        assert_eq!(store.total().unwrap(), total_before + 12.25);
    }

    #[test]
    fn test_invalid_add_leaves_store_unchanged() {
        let store = ExpenseStore::open_in_memory().unwrap();
        store.add("2024-01-10", "food", "20").unwrap();

        let bad_date = store.add("2024-13-40", "food", "5").unwrap_err();
        assert!(matches!(bad_date, LedgerError::Validation(ref v) if v.is_bad_date()));

        let bad_amount = store.add("2024-01-12", "food", "five").unwrap_err();
        assert!(matches!(bad_amount, LedgerError::Validation(ref v) if v.is_bad_number()));

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.total().unwrap(), 20.0);
    }

    #[test]
    fn test_sum_in_range_empty_store() {
        let store = ExpenseStore::open_in_memory().unwrap();
        assert_eq!(store.sum_in_range(date("2024-01-01"), date("2024-01-31")).unwrap(), 0.0);
    }

    #[test]
    fn test_delete_matching_removes_exactly_one() {
        let store = ExpenseStore::open_in_memory().unwrap();
        store.add("2024-01-05", "coffee", "3.5").unwrap();
        store.add("2024-01-05", "coffee", "3.5").unwrap();
        store.add("2024-01-05", "coffee", "3.5").unwrap();

        assert!(store.delete_matching(date("2024-01-05"), "coffee", 3.5).unwrap());
        assert_eq!(store.count().unwrap(), 2);

        assert!(!store.delete_matching(date("2024-01-06"), "coffee", 3.5).unwrap());
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expenses.db");

        {
            let store = ExpenseStore::open(&path).unwrap();
            store.add("2024-06-01", "travel", "300").unwrap();
        }

        let store = ExpenseStore::open(&path).unwrap();
        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].category, "travel");
    }
}
