//! Budgetwise Core - business logic for personal budget management
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (User, Budget, Expense, SavingsGoal)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::duckdb::DuckDbRepository;
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result as CoreResult};
pub use domain::{
    Budget, CategoryBudget, Expense, SavingsEntry, SavingsGoal, TransactionKind, User,
};

/// Main context for Budgetwise operations
///
/// This is the primary entry point for all business logic. It holds
/// the database connection, configuration, and all services.
pub struct BudgetwiseContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub token_service: Arc<TokenService>,
    pub auth_service: AuthService,
    pub reset_service: PasswordResetService,
    pub budget_service: BudgetService,
    pub expense_service: ExpenseService,
    pub savings_service: SavingsService,
}

impl BudgetwiseContext {
    /// Create a new Budgetwise context
    pub fn new(budgetwise_dir: &Path) -> Result<Self> {
        let config = Config::load(budgetwise_dir)?;

        let db_path = budgetwise_dir.join("budgetwise.duckdb");
        let repository = Arc::new(DuckDbRepository::new(&db_path)?);

        // Initialize schema
        repository.ensure_schema()?;

        let token_service = Arc::new(TokenService::new(
            &config.token_secret,
            config.token_ttl_hours,
        )?);

        let auth_service = AuthService::new(Arc::clone(&repository), Arc::clone(&token_service));
        let reset_service = PasswordResetService::new(Arc::clone(&repository));
        let budget_service = BudgetService::new(Arc::clone(&repository));
        let expense_service = ExpenseService::new(Arc::clone(&repository));
        let savings_service = SavingsService::new(Arc::clone(&repository));

        Ok(Self {
            config,
            repository,
            token_service,
            auth_service,
            reset_service,
            budget_service,
            expense_service,
            savings_service,
        })
    }
}
