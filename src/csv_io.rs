// CSV import/export - header: date,category,amount
// Import pushes every row through the same validation as manual entry.

use crate::db::Expense;
use crate::error::{LedgerError, LedgerResult};
use crate::store::ExpenseStore;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

/// Raw CSV row, kept as text until validated
#[derive(Debug, Deserialize, Serialize)]
pub struct ExpenseRecord {
    pub date: String,
    pub category: String,
    pub amount: String,
}

impl From<&Expense> for ExpenseRecord {
    fn from(expense: &Expense) -> Self {
        ExpenseRecord {
            date: expense.date_string(),
            category: expense.category.clone(),
            amount: expense.amount.to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportSummary {
    pub inserted: usize,
    /// (1-based data line, reason)
    pub skipped: Vec<(usize, String)>,
}

pub fn import_csv(store: &ExpenseStore, path: &Path) -> LedgerResult<ImportSummary> {
    let file = std::fs::File::open(path)?;
    let summary = import_from_reader(store, file)?;
    info!(
        path = %path.display(),
        inserted = summary.inserted,
        skipped = summary.skipped.len(),
        "CSV import finished"
    );
    Ok(summary)
}

pub fn import_from_reader<R: Read>(store: &ExpenseStore, reader: R) -> LedgerResult<ImportSummary> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut summary = ImportSummary::default();

    for (index, result) in rdr.deserialize::<ExpenseRecord>().enumerate() {
        let line = index + 1;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(line, error = %e, "unreadable CSV row skipped");
                summary.skipped.push((line, e.to_string()));
                continue;
            }
        };

        match store.add(&record.date, &record.category, &record.amount) {
            Ok(_) => summary.inserted += 1,
            Err(LedgerError::Validation(e)) => {
                warn!(line, error = %e, "invalid CSV row skipped");
                summary.skipped.push((line, e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

pub fn export_csv(store: &ExpenseStore, path: &Path) -> LedgerResult<usize> {
    let file = std::fs::File::create(path)?;
    let written = export_to_writer(store, file)?;
    info!(path = %path.display(), written, "CSV export finished");
    Ok(written)
}

pub fn export_to_writer<W: Write>(store: &ExpenseStore, writer: W) -> LedgerResult<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    let expenses = store.list_all()?;

    for expense in &expenses {
        wtr.serialize(ExpenseRecord::from(expense))?;
    }
    wtr.flush()?;

    Ok(expenses.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_skips_invalid_rows() {
        let store = ExpenseStore::open_in_memory().unwrap();
        let data = "date,category,amount\n\
                    2024-01-01,food,12.5\n\
                    2024-13-40,food,3\n\
                    2024-01-02,,4\n\
                    2024-01-03,transport,abc\n\
                    2024-01-04, rent ,800\n";

        let summary = import_from_reader(&store, data.as_bytes()).unwrap();

        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.skipped.len(), 3);
        assert_eq!(summary.skipped[0].0, 2);
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.list_all().unwrap()[1].category, "rent");
    }

    #[test]
    fn test_export_then_import_into_fresh_store() {
        let source = ExpenseStore::open_in_memory().unwrap();
        source.add("2024-01-01", "food", "12.5").unwrap();
        source.add("2024-01-02", "books, used", "-3").unwrap();

        let mut buffer = Vec::new();
        assert_eq!(export_to_writer(&source, &mut buffer).unwrap(), 2);

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("date,category,amount\n"));
        assert!(text.contains("\"books, used\""));

        let target = ExpenseStore::open_in_memory().unwrap();
        let summary = import_from_reader(&target, buffer.as_slice()).unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(target.total().unwrap(), 9.5);
    }

    #[test]
    fn test_import_missing_file() {
        let store = ExpenseStore::open_in_memory().unwrap();
        let err = import_csv(&store, Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, LedgerError::Io(_)));
    }
}
