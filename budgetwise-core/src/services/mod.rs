//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic over the repository. Each service
//! focuses on one feature area. Every operation takes the caller's resolved
//! identity as an explicit parameter - there is no ambient security context.

mod auth;
mod budget;
mod expense;
pub mod logging;
pub mod migration;
mod reset;
mod savings;
mod token;

pub use auth::AuthService;
pub use budget::{BudgetService, BudgetSummary, CategorySummary, OverallSummary};
pub use expense::{ExpenseService, ExpenseUpdate, NewExpense};
pub use logging::{LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use reset::{IssuedResetToken, PasswordResetService};
pub use savings::{GoalProgress, SavingsService};
pub use token::TokenService;
