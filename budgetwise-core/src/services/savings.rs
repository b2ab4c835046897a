//! Savings service - goals, entries, and progress aggregation

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::{SavingsEntry, SavingsGoal};

/// Savings service for goal management and progress calculation
pub struct SavingsService {
    repository: Arc<DuckDbRepository>,
}

impl SavingsService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// Progress for every goal the caller owns, in storage order
    pub fn get_goals(&self, owner: Uuid) -> Result<Vec<GoalProgress>> {
        let goals = self.repository.get_goals_by_user(owner)?;
        Ok(goals.into_iter().map(GoalProgress::from_goal).collect())
    }

    pub fn create_goal(&self, owner: Uuid, name: &str, target: Decimal) -> Result<SavingsGoal> {
        if name.trim().is_empty() {
            return Err(Error::validation("Goal name is required"));
        }

        let goal = SavingsGoal::new(owner, name.trim(), target);
        self.repository.insert_goal(&goal)?;
        Ok(goal)
    }

    /// Rename or retarget a goal the caller owns
    pub fn update_goal(
        &self,
        owner: Uuid,
        goal_id: Uuid,
        name: Option<String>,
        target: Option<Decimal>,
    ) -> Result<SavingsGoal> {
        let mut goal = self.owned_goal(owner, goal_id)?;

        if let Some(name) = name {
            goal.name = name;
        }
        if let Some(target) = target {
            goal.target = target;
        }

        self.repository.update_goal(&goal)?;
        Ok(goal)
    }

    /// Delete a goal the caller owns, cascading its entries
    pub fn delete_goal(&self, owner: Uuid, goal_id: Uuid) -> Result<()> {
        let goal = self.owned_goal(owner, goal_id)?;
        self.repository.delete_goal(goal.id)
    }

    /// Record a contribution toward a goal the caller owns
    pub fn add_entry(
        &self,
        owner: Uuid,
        goal_id: Uuid,
        amount: Decimal,
        date: NaiveDate,
        note: Option<String>,
    ) -> Result<SavingsEntry> {
        let goal = self.owned_goal(owner, goal_id)?;

        let entry = SavingsEntry::new(goal.id, amount, date, note);
        self.repository.insert_savings_entry(&entry)?;
        Ok(entry)
    }

    /// Delete an entry after walking the entry -> goal -> owner chain
    pub fn delete_entry(&self, owner: Uuid, entry_id: Uuid) -> Result<()> {
        let entry = self
            .repository
            .get_savings_entry(entry_id)?
            .ok_or_else(|| Error::not_found("Savings entry not found"))?;

        let goal_owner = self.repository.get_goal_owner(entry.goal_id)?;
        if goal_owner != Some(owner) {
            return Err(Error::Unauthorized);
        }

        self.repository.delete_savings_entry(entry_id)
    }

    /// Single owner-scoped lookup: a miss for someone else's goal id is the
    /// same NotFound as for a nonexistent one.
    fn owned_goal(&self, owner: Uuid, goal_id: Uuid) -> Result<SavingsGoal> {
        self.repository
            .get_goal_by_id_and_owner(goal_id, owner)?
            .ok_or_else(|| Error::not_found("Savings goal not found"))
    }
}

/// A goal with its computed progress metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalProgress {
    pub id: Uuid,
    pub name: String,
    pub target: Decimal,
    pub total_saved: Decimal,
    /// May be negative once the goal is exceeded
    pub remaining: Decimal,
    pub percentage: f64,
    pub entries: Vec<SavingsEntry>,
}

impl GoalProgress {
    fn from_goal(goal: SavingsGoal) -> Self {
        let total_saved = goal.total_saved();
        let percentage = if goal.target == Decimal::ZERO {
            0.0
        } else {
            (total_saved / goal.target * Decimal::new(100, 0))
                .to_f64()
                .unwrap_or(0.0)
        };

        Self {
            id: goal.id,
            name: goal.name,
            target: goal.target,
            total_saved,
            remaining: goal.target - total_saved,
            percentage,
            entries: goal.entries,
        }
    }
}
