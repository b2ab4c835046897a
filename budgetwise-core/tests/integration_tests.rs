//! Integration tests for budgetwise-core services
//!
//! These tests verify the reconciliation, credential, and savings logic
//! against a real DuckDB database in a temp directory.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;

use base64::Engine;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;
use uuid::Uuid;

use budgetwise_core::adapters::duckdb::DuckDbRepository;
use budgetwise_core::domain::result::Error;
use budgetwise_core::domain::{CategoryBudget, TransactionKind, User};
use budgetwise_core::services::{
    AuthService, BudgetService, ExpenseService, ExpenseUpdate, NewExpense, PasswordResetService,
    SavingsService, TokenService,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Create a test repository with schema initialized
fn create_test_repo(temp_dir: &TempDir) -> Arc<DuckDbRepository> {
    let db_path = temp_dir.path().join("test.duckdb");
    let repo = DuckDbRepository::new(&db_path).expect("Failed to create repository");
    repo.ensure_schema().expect("Failed to initialize schema");
    Arc::new(repo)
}

fn token_service() -> Arc<TokenService> {
    let secret = base64::engine::general_purpose::STANDARD.encode([42u8; 32]);
    Arc::new(TokenService::new(&secret, 24).unwrap())
}

fn auth_service(repo: &Arc<DuckDbRepository>) -> AuthService {
    AuthService::new(Arc::clone(repo), token_service())
}

/// Register a user and return it
fn register_user(repo: &Arc<DuckDbRepository>, email: &str) -> User {
    auth_service(repo)
        .register(email, "initial password")
        .expect("Failed to register")
}

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_expense(
    title: &str,
    amount: i64,
    category: &str,
    kind: TransactionKind,
    on: NaiveDate,
) -> NewExpense {
    NewExpense {
        title: title.to_string(),
        amount: dec(amount),
        category: category.to_string(),
        kind: Some(kind),
        date: on,
    }
}

// ============================================================================
// Registration and Login
// ============================================================================

#[test]
fn test_register_and_login() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let auth = auth_service(&repo);

    let user = auth.register("alice@example.com", "s3cret").unwrap();
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.role, "USER");
    assert!(!user.password_hash.contains("s3cret"));

    let token = auth.login("alice@example.com", "s3cret").unwrap();
    assert_eq!(token_service().verify(&token).unwrap(), "alice@example.com");
}

#[test]
fn test_duplicate_email_conflicts() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let auth = auth_service(&repo);

    auth.register("alice@example.com", "pw").unwrap();
    let err = auth.register("alice@example.com", "other pw").unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // Email comparison is case-insensitive
    let err = auth.register("ALICE@example.com", "pw").unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[test]
fn test_login_failures_are_indistinguishable() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let auth = auth_service(&repo);

    auth.register("alice@example.com", "right password").unwrap();

    let unknown = auth.login("nobody@example.com", "whatever").unwrap_err();
    let wrong = auth.login("alice@example.com", "wrong password").unwrap_err();

    // Same variant, same rendered message: no account-existence oracle
    assert!(matches!(unknown, Error::Unauthorized));
    assert!(matches!(wrong, Error::Unauthorized));
    assert_eq!(unknown.to_string(), wrong.to_string());
}

// ============================================================================
// Password Reset Lifecycle
// ============================================================================

#[test]
fn test_reset_token_is_single_use() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let auth = auth_service(&repo);
    let reset = PasswordResetService::new(Arc::clone(&repo));

    auth.register("alice@example.com", "old password").unwrap();
    let issued = reset.generate_reset_token("alice@example.com").unwrap();

    reset.reset_password(&issued.token, "new password").unwrap();

    // Old password is gone, new one works
    assert!(matches!(
        auth.login("alice@example.com", "old password").unwrap_err(),
        Error::Unauthorized
    ));
    auth.login("alice@example.com", "new password").unwrap();

    // Second use of the same token fails
    let err = reset.reset_password(&issued.token, "another").unwrap_err();
    assert!(matches!(err, Error::InvalidToken));
}

#[test]
fn test_expired_token_is_consumed() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let reset = PasswordResetService::new(Arc::clone(&repo));

    register_user(&repo, "alice@example.com");
    let issued = reset.generate_reset_token("alice@example.com").unwrap();

    // Age the stored expiry past the 15-minute window
    let mut user = repo.find_user_by_email("alice@example.com").unwrap().unwrap();
    user.reset_token_expiry = Some(Utc::now().timestamp_millis() - 1_000);
    repo.update_user(&user).unwrap();

    let err = reset.reset_password(&issued.token, "new password").unwrap_err();
    assert!(matches!(err, Error::TokenExpired));

    // The failed attempt consumed the token: retrying is InvalidToken now
    let err = reset.reset_password(&issued.token, "new password").unwrap_err();
    assert!(matches!(err, Error::InvalidToken));

    let user = repo.find_user_by_email("alice@example.com").unwrap().unwrap();
    assert!(user.reset_token.is_none() && user.reset_token_expiry.is_none());
}

#[test]
fn test_reissue_invalidates_prior_token() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let reset = PasswordResetService::new(Arc::clone(&repo));

    register_user(&repo, "alice@example.com");
    let first = reset.generate_reset_token("alice@example.com").unwrap();
    let second = reset.generate_reset_token("alice@example.com").unwrap();
    assert_ne!(first.token, second.token);

    let err = reset.reset_password(&first.token, "pw").unwrap_err();
    assert!(matches!(err, Error::InvalidToken));

    reset.reset_password(&second.token, "pw").unwrap();
}

#[test]
fn test_reset_for_unknown_email() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let reset = PasswordResetService::new(Arc::clone(&repo));

    let err = reset.generate_reset_token("nobody@example.com").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

// ============================================================================
// Budget Summary
// ============================================================================

#[test]
fn test_budget_summary_worked_example() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user = register_user(&repo, "alice@example.com");
    let budgets = BudgetService::new(Arc::clone(&repo));
    let expenses = ExpenseService::new(Arc::clone(&repo));

    budgets
        .save_budget(
            user.id,
            "2026-03",
            dec(500),
            vec![
                CategoryBudget { category: "Food".into(), amount: dec(200) },
                CategoryBudget { category: "Transport".into(), amount: dec(100) },
            ],
        )
        .unwrap();

    let in_march = date(2026, 3, 10);
    expenses
        .add(user.id, new_expense("Groceries", 50, "Food", TransactionKind::Expense, in_march))
        .unwrap();
    // Income in a budgeted category never counts as spend
    expenses
        .add(user.id, new_expense("Refund", 30, "Food", TransactionKind::Income, in_march))
        .unwrap();
    expenses
        .add(user.id, new_expense("Fuel", 120, "Transport", TransactionKind::Expense, in_march))
        .unwrap();

    let summary = budgets.get_summary(user.id, "2026-03").unwrap();
    assert_eq!(summary.month, "2026-03");
    assert_eq!(summary.overall.budget, dec(500));
    assert_eq!(summary.overall.spent, dec(170));
    assert_eq!(summary.overall.remaining, dec(330));
    assert_eq!(summary.overall.percentage, 34.0);

    let food = summary.categories.iter().find(|c| c.category == "Food").unwrap();
    assert_eq!(food.spent, dec(50));
    assert_eq!(food.percentage, 25.0);

    let transport = summary.categories.iter().find(|c| c.category == "Transport").unwrap();
    assert_eq!(transport.spent, dec(120));
    assert_eq!(transport.percentage, 120.0);
}

#[test]
fn test_fallback_to_latest_prior_month() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user = register_user(&repo, "alice@example.com");
    let budgets = BudgetService::new(Arc::clone(&repo));
    let expenses = ExpenseService::new(Arc::clone(&repo));

    budgets
        .save_budget(
            user.id,
            "2025-11",
            dec(300),
            vec![CategoryBudget { category: "Food".into(), amount: dec(150) }],
        )
        .unwrap();
    budgets.save_budget(user.id, "2026-01", dec(400), vec![]).unwrap();

    // January spend must not bleed into the March summary
    expenses
        .add(user.id, new_expense("Dinner", 90, "Food", TransactionKind::Expense, date(2026, 1, 20)))
        .unwrap();
    expenses
        .add(user.id, new_expense("Lunch", 25, "Food", TransactionKind::Expense, date(2026, 3, 5)))
        .unwrap();

    // No 2026-03 budget: the most recent earlier one (2026-01) stands in,
    // but the label and date range stay the requested month
    let summary = budgets.get_summary(user.id, "2026-03").unwrap();
    assert_eq!(summary.month, "2026-03");
    assert_eq!(summary.overall.budget, dec(400));
    assert_eq!(summary.overall.spent, dec(25));
}

#[test]
fn test_no_budget_and_no_prior_budget() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user = register_user(&repo, "alice@example.com");
    let budgets = BudgetService::new(Arc::clone(&repo));

    // Only a later month exists; fallback is strictly earlier
    budgets.save_budget(user.id, "2026-05", dec(400), vec![]).unwrap();

    let err = budgets.get_summary(user.id, "2026-03").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_summary_range_covers_exact_month() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user = register_user(&repo, "alice@example.com");
    let budgets = BudgetService::new(Arc::clone(&repo));
    let expenses = ExpenseService::new(Arc::clone(&repo));

    budgets.save_budget(user.id, "2026-02", dec(100), vec![]).unwrap();

    for (title, on) in [
        ("before", date(2026, 1, 31)),
        ("first", date(2026, 2, 1)),
        ("last", date(2026, 2, 28)),
        ("after", date(2026, 3, 1)),
    ] {
        expenses
            .add(user.id, new_expense(title, 10, "Misc", TransactionKind::Expense, on))
            .unwrap();
    }

    let summary = budgets.get_summary(user.id, "2026-02").unwrap();
    assert_eq!(summary.overall.spent, dec(20));
}

#[test]
fn test_zero_amounts_never_divide() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user = register_user(&repo, "alice@example.com");
    let budgets = BudgetService::new(Arc::clone(&repo));
    let expenses = ExpenseService::new(Arc::clone(&repo));

    budgets
        .save_budget(
            user.id,
            "2026-04",
            Decimal::ZERO,
            vec![CategoryBudget { category: "Food".into(), amount: Decimal::ZERO }],
        )
        .unwrap();
    expenses
        .add(user.id, new_expense("Snack", 15, "Food", TransactionKind::Expense, date(2026, 4, 2)))
        .unwrap();

    let summary = budgets.get_summary(user.id, "2026-04").unwrap();
    assert_eq!(summary.overall.percentage, 0.0);
    assert_eq!(summary.categories[0].percentage, 0.0);
    // Overspend is represented, not clamped
    assert_eq!(summary.overall.remaining, dec(-15));
}

#[test]
fn test_unbudgeted_category_spend_only_in_totals() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user = register_user(&repo, "alice@example.com");
    let budgets = BudgetService::new(Arc::clone(&repo));
    let expenses = ExpenseService::new(Arc::clone(&repo));

    budgets
        .save_budget(
            user.id,
            "2026-03",
            dec(500),
            vec![CategoryBudget { category: "Food".into(), amount: dec(200) }],
        )
        .unwrap();
    expenses
        .add(user.id, new_expense("Concert", 80, "Fun", TransactionKind::Expense, date(2026, 3, 12)))
        .unwrap();

    let summary = budgets.get_summary(user.id, "2026-03").unwrap();
    // "Fun" has no budget line, so no breakdown row...
    assert!(summary.categories.iter().all(|c| c.category != "Fun"));
    // ...but the spend still counts overall
    assert_eq!(summary.overall.spent, dec(80));
}

#[test]
fn test_save_budget_replaces_category_list() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user = register_user(&repo, "alice@example.com");
    let budgets = BudgetService::new(Arc::clone(&repo));

    budgets
        .save_budget(
            user.id,
            "2026-03",
            dec(500),
            vec![
                CategoryBudget { category: "Food".into(), amount: dec(200) },
                CategoryBudget { category: "Transport".into(), amount: dec(100) },
            ],
        )
        .unwrap();

    // Re-saving replaces the whole list, no merge with the old categories
    budgets
        .save_budget(
            user.id,
            "2026-03",
            dec(600),
            vec![CategoryBudget { category: "Rent".into(), amount: dec(450) }],
        )
        .unwrap();

    let stored = repo.get_budget(user.id, "2026-03").unwrap().unwrap();
    assert_eq!(stored.total, dec(600));
    assert_eq!(stored.categories.len(), 1);
    assert_eq!(stored.categories[0].category, "Rent");
}

#[test]
fn test_delete_budget_cascades() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user = register_user(&repo, "alice@example.com");
    let budgets = BudgetService::new(Arc::clone(&repo));

    budgets
        .save_budget(
            user.id,
            "2026-03",
            dec(500),
            vec![CategoryBudget { category: "Food".into(), amount: dec(200) }],
        )
        .unwrap();

    budgets.delete_budget(user.id, "2026-03").unwrap();
    assert!(repo.get_budget(user.id, "2026-03").unwrap().is_none());

    // A fresh budget for the same month starts with an empty category slate
    budgets.save_budget(user.id, "2026-03", dec(100), vec![]).unwrap();
    let stored = repo.get_budget(user.id, "2026-03").unwrap().unwrap();
    assert!(stored.categories.is_empty());

    let err = budgets.delete_budget(user.id, "2026-07").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_malformed_month_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user = register_user(&repo, "alice@example.com");
    let budgets = BudgetService::new(Arc::clone(&repo));

    for bad in ["2026-3", "202-603", "march", "2026-13"] {
        let err = budgets.get_summary(user.id, bad).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{} should be rejected", bad);
    }
}

// ============================================================================
// Expense CRUD
// ============================================================================

#[test]
fn test_add_requires_transaction_kind() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user = register_user(&repo, "alice@example.com");
    let expenses = ExpenseService::new(Arc::clone(&repo));

    let mut missing_kind = new_expense("Lunch", 12, "Food", TransactionKind::Expense, date(2026, 3, 1));
    missing_kind.kind = None;

    let err = expenses.add(user.id, missing_kind).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn test_update_never_changes_kind() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user = register_user(&repo, "alice@example.com");
    let expenses = ExpenseService::new(Arc::clone(&repo));

    let created = expenses
        .add(user.id, new_expense("Salary", 3000, "Work", TransactionKind::Income, date(2026, 3, 1)))
        .unwrap();

    let updated = expenses
        .update(
            user.id,
            created.id,
            ExpenseUpdate {
                title: Some("Salary (corrected)".into()),
                amount: Some(dec(3100)),
                // A kind in the payload is ignored outright
                kind: Some(TransactionKind::Expense),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.kind, TransactionKind::Income);
    assert_eq!(updated.amount, dec(3100));

    let stored = repo.get_expense_by_id(created.id).unwrap().unwrap();
    assert_eq!(stored.kind, TransactionKind::Income);
}

#[test]
fn test_expense_ownership_enforced() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = register_user(&repo, "alice@example.com");
    let mallory = register_user(&repo, "mallory@example.com");
    let expenses = ExpenseService::new(Arc::clone(&repo));

    let created = expenses
        .add(alice.id, new_expense("Lunch", 12, "Food", TransactionKind::Expense, date(2026, 3, 1)))
        .unwrap();

    let err = expenses
        .update(mallory.id, created.id, ExpenseUpdate::default())
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized));

    let err = expenses.delete(mallory.id, created.id).unwrap_err();
    assert!(matches!(err, Error::Unauthorized));

    // The owner can still delete it
    expenses.delete(alice.id, created.id).unwrap();
    assert!(repo.get_expense_by_id(created.id).unwrap().is_none());
}

#[test]
fn test_list_is_owner_scoped() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = register_user(&repo, "alice@example.com");
    let bob = register_user(&repo, "bob@example.com");
    let expenses = ExpenseService::new(Arc::clone(&repo));

    expenses
        .add(alice.id, new_expense("Lunch", 12, "Food", TransactionKind::Expense, date(2026, 3, 1)))
        .unwrap();
    expenses
        .add(bob.id, new_expense("Coffee", 4, "Food", TransactionKind::Expense, date(2026, 3, 1)))
        .unwrap();

    let alices = expenses.list(alice.id).unwrap();
    assert_eq!(alices.len(), 1);
    assert_eq!(alices[0].title, "Lunch");
}

// ============================================================================
// Savings Goals
// ============================================================================

#[test]
fn test_goal_progress_worked_example() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user = register_user(&repo, "alice@example.com");
    let savings = SavingsService::new(Arc::clone(&repo));

    let goal = savings.create_goal(user.id, "Emergency fund", dec(1000)).unwrap();
    savings.add_entry(user.id, goal.id, dec(100), date(2026, 1, 5), None).unwrap();
    savings
        .add_entry(user.id, goal.id, dec(250), date(2026, 2, 5), Some("bonus".into()))
        .unwrap();

    let goals = savings.get_goals(user.id).unwrap();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].total_saved, dec(350));
    assert_eq!(goals[0].remaining, dec(650));
    assert_eq!(goals[0].percentage, 35.0);
    assert_eq!(goals[0].entries.len(), 2);
}

#[test]
fn test_goal_lookup_is_owner_scoped() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = register_user(&repo, "alice@example.com");
    let mallory = register_user(&repo, "mallory@example.com");
    let savings = SavingsService::new(Arc::clone(&repo));

    let goal = savings.create_goal(alice.id, "Vacation", dec(2000)).unwrap();

    // Someone else's goal id looks exactly like a nonexistent one
    let err = savings.update_goal(mallory.id, goal.id, Some("Mine".into()), None).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    let err = savings.delete_goal(mallory.id, goal.id).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    let err = savings
        .add_entry(mallory.id, goal.id, dec(1), date(2026, 1, 1), None)
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    let err = savings.delete_goal(alice.id, Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_entry_deletion_checks_owner_chain() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let alice = register_user(&repo, "alice@example.com");
    let mallory = register_user(&repo, "mallory@example.com");
    let savings = SavingsService::new(Arc::clone(&repo));

    let goal = savings.create_goal(alice.id, "Vacation", dec(2000)).unwrap();
    let entry = savings.add_entry(alice.id, goal.id, dec(50), date(2026, 1, 1), None).unwrap();

    // The entry exists globally, but the entry -> goal -> owner chain fails
    let err = savings.delete_entry(mallory.id, entry.id).unwrap_err();
    assert!(matches!(err, Error::Unauthorized));

    savings.delete_entry(alice.id, entry.id).unwrap();
    let err = savings.delete_entry(alice.id, entry.id).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_delete_goal_cascades_entries() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user = register_user(&repo, "alice@example.com");
    let savings = SavingsService::new(Arc::clone(&repo));

    let goal = savings.create_goal(user.id, "Vacation", dec(2000)).unwrap();
    let entry = savings.add_entry(user.id, goal.id, dec(50), date(2026, 1, 1), None).unwrap();

    savings.delete_goal(user.id, goal.id).unwrap();

    assert!(savings.get_goals(user.id).unwrap().is_empty());
    assert!(repo.get_savings_entry(entry.id).unwrap().is_none());
}
