// 📊 Chart data - per-category totals for a single bar chart
// Recomputed from the store on every call; no caching, no incremental updates.

use crate::error::LedgerResult;
use crate::store::ExpenseStore;
use crate::validation::format_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// (category, total) pairs within `[start, end]`, ordered by category
pub fn category_totals(
    store: &ExpenseStore,
    start: NaiveDate,
    end: NaiveDate,
) -> LedgerResult<Vec<CategoryTotal>> {
    store.sum_by_category_in_range(start, end)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bars: Vec<CategoryTotal>,
}

impl ChartData {
    pub fn for_range(store: &ExpenseStore, start: NaiveDate, end: NaiveDate) -> LedgerResult<Self> {
        Ok(ChartData {
            title: chart_title(start, end),
            start,
            end,
            bars: category_totals(store, start, end)?,
        })
    }

    /// Chart with no bars, used when the store has no dated expenses at all
    pub fn empty(today: NaiveDate) -> Self {
        ChartData {
            title: chart_title(today, today),
            start: today,
            end: today,
            bars: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn max_total(&self) -> f64 {
        self.bars.iter().map(|b| b.total).fold(0.0, f64::max)
    }
}

pub fn chart_title(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "Total Expenses by Category ({} to {})",
        format_date(start),
        format_date(end)
    )
}

/// Horizontal text bar chart. Negative totals render with no bar.
pub fn render_text(chart: &ChartData, width: usize, currency: &str) -> String {
    let mut out = String::new();
    out.push_str(&chart.title);
    out.push('\n');

    if chart.is_empty() {
        out.push_str("  (no expenses in range)\n");
        return out;
    }

    let label_width = chart
        .bars
        .iter()
        .map(|b| b.category.chars().count())
        .max()
        .unwrap_or(0);
    let max = chart.max_total();

    for bar in &chart.bars {
        let len = if max > 0.0 && bar.total > 0.0 {
            ((bar.total / max) * width as f64).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "  {:<label_width$} │{} {}{:.2}\n",
            bar.category,
            "█".repeat(len),
            currency,
            bar.total,
            label_width = label_width
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_category_totals_grouped() {
        let store = ExpenseStore::open_in_memory().unwrap();
        store.add("2024-01-05", "food", "20").unwrap();
        store.add("2024-01-06", "food", "5").unwrap();
        store.add("2024-01-07", "transport", "10").unwrap();

        let totals = category_totals(&store, date("2024-01-01"), date("2024-01-31")).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0], CategoryTotal { category: "food".into(), total: 25.0 });
        assert_eq!(totals[1], CategoryTotal { category: "transport".into(), total: 10.0 });

        // Stable across calls
        let again = category_totals(&store, date("2024-01-01"), date("2024-01-31")).unwrap();
        assert_eq!(totals, again);
    }

    #[test]
    fn test_chart_data_title() {
        let store = ExpenseStore::open_in_memory().unwrap();
        let chart = ChartData::for_range(&store, date("2024-01-01"), date("2024-01-31")).unwrap();
        assert_eq!(chart.title, "Total Expenses by Category (2024-01-01 to 2024-01-31)");
        assert!(chart.is_empty());
    }

    #[test]
    fn test_render_text_scales_bars() {
        let chart = ChartData {
            title: chart_title(date("2024-01-01"), date("2024-01-31")),
            start: date("2024-01-01"),
            end: date("2024-01-31"),
            bars: vec![
                CategoryTotal { category: "food".into(), total: 20.0 },
                CategoryTotal { category: "rent".into(), total: 40.0 },
            ],
        };

        let text = render_text(&chart, 10, "$");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains(&"█".repeat(5)));
        assert!(!lines[1].contains(&"█".repeat(6)));
        assert!(lines[2].contains(&"█".repeat(10)));
        assert!(lines[2].ends_with("$40.00"));
    }

    #[test]
    fn test_render_text_empty() {
        let chart = ChartData::empty(date("2024-01-01"));
        assert!(render_text(&chart, 20, "$").contains("no expenses in range"));
    }
}
