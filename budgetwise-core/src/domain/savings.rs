//! Savings goal domain model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A savings goal owned by a user
///
/// Aggregate root: entries live and die with their goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub target: Decimal,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<SavingsEntry>,
}

/// A single contribution toward a goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsEntry {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl SavingsGoal {
    pub fn new(user_id: Uuid, name: impl Into<String>, target: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            target,
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Sum of all entry amounts
    pub fn total_saved(&self) -> Decimal {
        self.entries.iter().map(|e| e.amount).sum()
    }
}

impl SavingsEntry {
    pub fn new(goal_id: Uuid, amount: Decimal, date: NaiveDate, note: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal_id,
            amount,
            date,
            note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_saved() {
        let mut goal = SavingsGoal::new(Uuid::new_v4(), "Emergency fund", Decimal::new(1000, 0));
        assert_eq!(goal.total_saved(), Decimal::ZERO);

        let date = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        goal.entries.push(SavingsEntry::new(goal.id, Decimal::new(100, 0), date, None));
        goal.entries.push(SavingsEntry::new(goal.id, Decimal::new(250, 0), date, Some("bonus".into())));
        assert_eq!(goal.total_saved(), Decimal::new(350, 0));
    }
}
