//! Expense service - owner-scoped ledger entry CRUD

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::{Expense, TransactionKind};

/// Fields for creating a ledger entry
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub title: String,
    pub amount: Decimal,
    pub category: String,
    /// Required; add() rejects None
    pub kind: Option<TransactionKind>,
    pub date: NaiveDate,
}

/// Fields for updating a ledger entry
///
/// Carries a kind so callers can pass one through, but update() ignores it:
/// the transaction kind is immutable after creation.
#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdate {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
}

/// Expense service for ledger entry management
pub struct ExpenseService {
    repository: Arc<DuckDbRepository>,
}

impl ExpenseService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// Add a ledger entry owned by the caller
    pub fn add(&self, owner: Uuid, new: NewExpense) -> Result<Expense> {
        let kind = new
            .kind
            .ok_or_else(|| Error::validation("Transaction kind is required"))?;
        if new.title.trim().is_empty() {
            return Err(Error::validation("Title is required"));
        }

        let expense = Expense::new(owner, new.title, new.amount, new.category, kind, new.date);
        self.repository.insert_expense(&expense)?;
        Ok(expense)
    }

    /// All ledger entries owned by the caller, newest first
    pub fn list(&self, owner: Uuid) -> Result<Vec<Expense>> {
        self.repository.get_expenses_by_user(owner)
    }

    /// Update an entry the caller owns
    ///
    /// Any kind in the update payload is discarded; the stored kind is kept
    /// as created.
    pub fn update(&self, owner: Uuid, id: Uuid, update: ExpenseUpdate) -> Result<Expense> {
        let mut expense = self
            .repository
            .get_expense_by_id(id)?
            .ok_or_else(|| Error::not_found("Expense not found"))?;

        if expense.user_id != owner {
            return Err(Error::Unauthorized);
        }

        if let Some(title) = update.title {
            expense.title = title;
        }
        if let Some(amount) = update.amount {
            expense.amount = amount;
        }
        if let Some(category) = update.category {
            expense.category = category;
        }
        if let Some(date) = update.date {
            expense.date = date;
        }
        expense.updated_at = Utc::now();

        self.repository.update_expense(&expense)?;
        Ok(expense)
    }

    /// Hard-delete an entry the caller owns
    pub fn delete(&self, owner: Uuid, id: Uuid) -> Result<()> {
        let expense = self
            .repository
            .get_expense_by_id(id)?
            .ok_or_else(|| Error::not_found("Expense not found"))?;

        if expense.user_id != owner {
            return Err(Error::Unauthorized);
        }

        self.repository.delete_expense(id)
    }
}
