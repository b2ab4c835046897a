//! Expense domain model - ledger entries (expenses and income)

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a ledger entry is spending or income
///
/// Required at creation and immutable afterwards: updates never change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "EXPENSE",
            TransactionKind::Income => "INCOME",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "EXPENSE" => Some(TransactionKind::Expense),
            "INCOME" => Some(TransactionKind::Income),
            _ => None,
        }
    }
}

/// A single ledger entry belonging to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// Positive magnitude; the kind carries the direction
    pub amount: Decimal,
    pub category: String,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        user_id: Uuid,
        title: impl Into<String>,
        amount: Decimal,
        category: impl Into<String>,
        kind: TransactionKind,
        date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            amount,
            category: category.into(),
            kind,
            date,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        assert_eq!(TransactionKind::parse("EXPENSE"), Some(TransactionKind::Expense));
        assert_eq!(TransactionKind::parse("income"), Some(TransactionKind::Income));
        assert_eq!(TransactionKind::parse("TRANSFER"), None);
        assert_eq!(TransactionKind::Expense.as_str(), "EXPENSE");
    }

    #[test]
    fn test_new_expense() {
        let user_id = Uuid::new_v4();
        let expense = Expense::new(
            user_id,
            "Groceries",
            Decimal::new(4250, 2),
            "Food",
            TransactionKind::Expense,
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        );
        assert_eq!(expense.user_id, user_id);
        assert_eq!(expense.kind, TransactionKind::Expense);
    }
}
