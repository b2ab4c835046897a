//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod budget;
mod expense;
pub mod result;
mod savings;
mod user;

pub use budget::{month_date_range, parse_month, Budget, CategoryBudget};
pub use expense::{Expense, TransactionKind};
pub use savings::{SavingsEntry, SavingsGoal};
pub use user::User;
