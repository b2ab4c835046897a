//! Budget service - monthly budget-vs-actual reconciliation

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::{month_date_range, parse_month, Budget, CategoryBudget, TransactionKind};

/// Budget service for monthly budgets and their summaries
pub struct BudgetService {
    repository: Arc<DuckDbRepository>,
}

impl BudgetService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// Budget-vs-actual summary for a month
    ///
    /// If the owner has no budget for the requested month, the most recent
    /// earlier month's budget stands in for it. The date range and the
    /// returned month label always come from the requested month, never the
    /// fallback's.
    pub fn get_summary(&self, owner: Uuid, month: &str) -> Result<BudgetSummary> {
        parse_month(month)?;

        let budget = match self.repository.get_budget(owner, month)? {
            Some(b) => b,
            None => self
                .repository
                .get_latest_prior_budget(owner, month)?
                .ok_or_else(|| Error::not_found(format!("No budget found for {} or any earlier month", month)))?,
        };

        let (start, end) = month_date_range(month)?;

        // Income never counts toward spend
        let expenses =
            self.repository
                .get_expenses_in_range(owner, start, end, TransactionKind::Expense)?;

        let total_spent: Decimal = expenses.iter().map(|e| e.amount).sum();
        let mut spent_by_category: HashMap<&str, Decimal> = HashMap::new();
        for e in &expenses {
            *spent_by_category.entry(e.category.as_str()).or_insert(Decimal::ZERO) += e.amount;
        }

        // Only budgeted categories appear; spend in other categories still
        // counts toward the overall totals above
        let categories = budget
            .categories
            .iter()
            .map(|cb| {
                let spent = spent_by_category
                    .get(cb.category.as_str())
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                CategorySummary {
                    category: cb.category.clone(),
                    budget: cb.amount,
                    spent,
                    percentage: percentage_of(spent, cb.amount),
                }
            })
            .collect();

        Ok(BudgetSummary {
            month: month.to_string(),
            overall: OverallSummary {
                budget: budget.total,
                spent: total_spent,
                // Overspend stays negative, not clamped
                remaining: budget.total - total_spent,
                percentage: percentage_of(total_spent, budget.total),
            },
            categories,
        })
    }

    /// Create or replace the budget for (owner, month)
    ///
    /// An existing budget keeps its identity but has its total and entire
    /// category list replaced; there is no category merge.
    pub fn save_budget(
        &self,
        owner: Uuid,
        month: &str,
        total: Decimal,
        categories: Vec<CategoryBudget>,
    ) -> Result<Budget> {
        parse_month(month)?;

        let mut budget = match self.repository.get_budget(owner, month)? {
            Some(existing) => existing,
            None => Budget::new(owner, month, total),
        };
        budget.total = total;
        budget.categories = categories;

        self.repository.save_budget(&budget)?;
        Ok(budget)
    }

    /// Delete the budget for (owner, month), cascading its categories
    pub fn delete_budget(&self, owner: Uuid, month: &str) -> Result<()> {
        parse_month(month)?;

        if !self.repository.delete_budget(owner, month)? {
            return Err(Error::not_found(format!("No budget found for {}", month)));
        }
        Ok(())
    }
}

/// spent/allocated as a percentage; 0 when nothing is allocated
fn percentage_of(spent: Decimal, allocated: Decimal) -> f64 {
    if allocated == Decimal::ZERO {
        0.0
    } else {
        (spent / allocated * Decimal::new(100, 0))
            .to_f64()
            .unwrap_or(0.0)
    }
}

/// Month summary: overall totals plus the per-category breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSummary {
    /// The requested month, even when a fallback budget was used
    pub month: String,
    pub overall: OverallSummary,
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallSummary {
    pub budget: Decimal,
    pub spent: Decimal,
    /// May be negative when overspent
    pub remaining: Decimal,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub budget: Decimal,
    pub spent: Decimal,
    pub percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(Decimal::new(50, 0), Decimal::new(200, 0)), 25.0);
        assert_eq!(percentage_of(Decimal::new(120, 0), Decimal::new(100, 0)), 120.0);
        // Zero allocation never divides
        assert_eq!(percentage_of(Decimal::new(75, 0), Decimal::ZERO), 0.0);
        assert_eq!(percentage_of(Decimal::ZERO, Decimal::ZERO), 0.0);
    }
}
