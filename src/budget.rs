// 💰 Budget Tracker - ceiling amount over an inclusive date range
//
//   remaining = max_amount - sum(expenses where start <= date <= end)
//
// State is owned by the tracker, never global. Persistence is opt-in per settings.

use crate::db;
use crate::error::LedgerResult;
use crate::store::ExpenseStore;
use crate::validation::{format_date, parse_amount, parse_range};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ============================================================================
// BUDGET
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub max_amount: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Budget {
    /// Parse raw form input. Number and date failures stay distinct.
    pub fn parse(amount: &str, start: &str, end: &str) -> LedgerResult<Self> {
        let max_amount = parse_amount("budget", amount)?;
        let (start, end) = parse_range(start, end)?;
        Ok(Budget {
            max_amount,
            start,
            end,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn describe(&self) -> String {
        format!(
            "Maximum Budget: {:.2} from {} to {}",
            self.max_amount,
            format_date(self.start),
            format_date(self.end)
        )
    }
}

// ============================================================================
// BUDGET STATUS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetStatus {
    /// Spending within the ceiling (remaining >= 0)
    UnderBudget { spent: f64, remaining: f64 },

    /// Spending exceeded the ceiling by `overage`
    OverBudget { spent: f64, overage: f64 },
}

/// Round to whole cents so float noise never flips the status.
/// Adding 0.0 turns -0.0 into 0.0.
fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0 + 0.0
}

impl BudgetStatus {
    pub fn from_totals(max_amount: f64, spent: f64) -> Self {
        let remaining = round_cents(max_amount - spent);
        if remaining < 0.0 {
            BudgetStatus::OverBudget {
                spent,
                overage: remaining.abs(),
            }
        } else {
            BudgetStatus::UnderBudget { spent, remaining }
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self, BudgetStatus::OverBudget { .. })
    }

    /// Signed remaining amount (negative when over)
    pub fn remaining(&self) -> f64 {
        match self {
            BudgetStatus::UnderBudget { remaining, .. } => *remaining,
            BudgetStatus::OverBudget { overage, .. } => -overage,
        }
    }

    pub fn spent(&self) -> f64 {
        match self {
            BudgetStatus::UnderBudget { spent, .. } | BudgetStatus::OverBudget { spent, .. } => {
                *spent
            }
        }
    }

    pub fn message(&self) -> String {
        match self {
            BudgetStatus::UnderBudget { remaining, .. } => {
                format!("Remaining Budget: {:.2}", remaining)
            }
            BudgetStatus::OverBudget { overage, .. } => {
                format!("Warning: You've exceeded your budget by {:.2}!", overage)
            }
        }
    }
}

// ============================================================================
// BUDGET TRACKER
// ============================================================================

pub struct BudgetTracker {
    budget: Option<Budget>,
    persist: bool,
}

impl BudgetTracker {
    /// In-memory only; the budget is gone when the process exits
    pub fn new() -> Self {
        BudgetTracker {
            budget: None,
            persist: false,
        }
    }

    /// Restore the saved budget (if any) and keep saving future changes
    pub fn persistent(store: &ExpenseStore) -> LedgerResult<Self> {
        let budget = db::load_budget(store.connection())?;
        if let Some(ref b) = budget {
            debug!(max_amount = b.max_amount, start = %b.start, end = %b.end, "budget restored");
        }
        Ok(BudgetTracker {
            budget,
            persist: true,
        })
    }

    pub fn budget(&self) -> Option<&Budget> {
        self.budget.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.budget.is_some()
    }

    /// Validate, replace the current budget, and return the fresh status.
    /// On failure the previous budget is kept.
    pub fn set_budget(
        &mut self,
        store: &ExpenseStore,
        amount: &str,
        start: &str,
        end: &str,
    ) -> LedgerResult<BudgetStatus> {
        let budget = Budget::parse(amount, start, end)?;
        self.replace(store, budget)
    }

    pub fn replace(&mut self, store: &ExpenseStore, budget: Budget) -> LedgerResult<BudgetStatus> {
        // Nothing is saved or swapped unless the status query succeeds
        let status = Self::status_for(&budget, store)?;
        if self.persist {
            db::save_budget(store.connection(), &budget)?;
        }
        info!(
            max_amount = budget.max_amount,
            start = %budget.start,
            end = %budget.end,
            persisted = self.persist,
            "budget set"
        );

        self.budget = Some(budget);
        Ok(status)
    }

    /// `None` while no budget has been set
    pub fn check_status(&self, store: &ExpenseStore) -> LedgerResult<Option<BudgetStatus>> {
        match self.budget {
            Some(ref budget) => Ok(Some(Self::status_for(budget, store)?)),
            None => Ok(None),
        }
    }

    fn status_for(budget: &Budget, store: &ExpenseStore) -> LedgerResult<BudgetStatus> {
        let spent = store.sum_in_range(budget.start, budget.end)?;
        let status = BudgetStatus::from_totals(budget.max_amount, spent);
        if status.is_over() {
            warn!(spent, max_amount = budget.max_amount, "budget exceeded");
        }
        Ok(status)
    }
}

impl Default for BudgetTracker {
    fn default() -> Self {
        Self::new()
    }
}
