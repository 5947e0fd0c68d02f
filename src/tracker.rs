// Presentation boundary
// Every UI collaborator (TUI, CLI, HTTP) talks to the ledger through ExpenseTracker.
// Raw text goes in; typed outcomes or typed failures come out.

use crate::budget::{Budget, BudgetStatus, BudgetTracker};
use crate::chart::ChartData;
use crate::config::settings::Settings;
use crate::db::{Expense, ExpenseId};
use crate::error::{LedgerError, LedgerResult};
use crate::store::ExpenseStore;
use crate::validation::NewExpense;
use chrono::Local;
use serde::Serialize;
use std::path::Path;

/// Full list plus the running total shown under it
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub expenses: Vec<Expense>,
    pub total: f64,
}

pub struct ExpenseTracker {
    store: ExpenseStore,
    budget: BudgetTracker,
}

impl ExpenseTracker {
    pub fn new(store: ExpenseStore, budget: BudgetTracker) -> Self {
        ExpenseTracker { store, budget }
    }

    /// Open the database at `path`, honoring the budget persistence setting
    pub fn open(path: &Path, settings: &Settings) -> LedgerResult<Self> {
        let store = ExpenseStore::open(path)?;
        let budget = if settings.persist_budget {
            BudgetTracker::persistent(&store)?
        } else {
            BudgetTracker::new()
        };
        Ok(Self::new(store, budget))
    }

    pub fn in_memory() -> LedgerResult<Self> {
        Ok(Self::new(ExpenseStore::open_in_memory()?, BudgetTracker::new()))
    }

    pub fn store(&self) -> &ExpenseStore {
        &self.store
    }

    pub fn add_expense(&self, date: &str, category: &str, amount: &str) -> LedgerResult<Expense> {
        self.store.add(date, category, amount)
    }

    pub fn expense(&self, id: ExpenseId) -> LedgerResult<Expense> {
        self.store.get(id)?.ok_or(LedgerError::NotFound(id))
    }

    /// Delete the selected row; `None` means the user had nothing selected.
    pub fn delete_selected(&self, selected: Option<ExpenseId>) -> LedgerResult<()> {
        let id = selected.ok_or(LedgerError::NoSelection)?;
        if self.store.delete(id)? {
            Ok(())
        } else {
            Err(LedgerError::NotFound(id))
        }
    }

    /// Delete by value. Returns false when nothing matched.
    pub fn delete_matching(&self, date: &str, category: &str, amount: &str) -> LedgerResult<bool> {
        let target = NewExpense::parse(date, category, amount)?;
        self.store
            .delete_matching(target.date, &target.category, target.amount)
    }

    pub fn list(&self) -> LedgerResult<Listing> {
        Ok(Listing {
            expenses: self.store.list_all()?,
            total: self.store.total()?,
        })
    }

    pub fn set_budget(&mut self, amount: &str, start: &str, end: &str) -> LedgerResult<BudgetStatus> {
        self.budget.set_budget(&self.store, amount, start, end)
    }

    pub fn budget(&self) -> Option<&Budget> {
        self.budget.budget()
    }

    pub fn status(&self) -> LedgerResult<Option<BudgetStatus>> {
        self.budget.check_status(&self.store)
    }

    /// Chart over the budget range, falling back to the span of stored dates
    pub fn chart(&self) -> LedgerResult<ChartData> {
        if let Some(budget) = self.budget.budget() {
            return ChartData::for_range(&self.store, budget.start, budget.end);
        }

        match self.store.date_span()? {
            Some((start, end)) => ChartData::for_range(&self.store, start, end),
            None => Ok(ChartData::empty(Local::now().date_naive())),
        }
    }
}
