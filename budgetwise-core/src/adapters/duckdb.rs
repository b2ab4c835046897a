//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use duckdb::{params, Connection};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Budget, CategoryBudget, Expense, SavingsEntry, SavingsGoal, TransactionKind, User};
use crate::services::MigrationService;

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_default()
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Amounts are stored as DOUBLE; dates as DATE with ::VARCHAR casts on read
fn decimal_to_db(d: Decimal) -> f64 {
    d.to_string().parse::<f64>().unwrap_or(0.0)
}

fn decimal_from_db(f: f64) -> Decimal {
    Decimal::try_from(f).unwrap_or_default()
}

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Create a new DuckDB repository
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which can occur when two bw invocations race on the same database.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[budgetwise] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::database(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// Attempt to open a database connection (called by new() with retry logic)
    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Disable extension autoloading to avoid macOS code signing issues
        // (cached extensions in ~/.duckdb/extensions may have different Team IDs)
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_with_flags(db_path, config)?;
        Ok(conn)
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<crate::services::MigrationResult> {
        let conn = self.conn.lock().unwrap();
        let migration_service = MigrationService::new(&conn);
        migration_service.run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // === User operations ===

    pub fn insert_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sys_users (user_id, email, password_hash, role,
                                    reset_token, reset_token_expiry, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.role,
                user.reset_token,
                user.reset_token_expiry,
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Overwrite a user's mutable fields in a single row update
    ///
    /// Password hash, reset token, and expiry change together here, which is
    /// what keeps token consumption atomic per user record.
    pub fn update_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE sys_users
             SET password_hash = ?, role = ?, reset_token = ?, reset_token_expiry = ?
             WHERE user_id = ?",
            params![
                user.password_hash,
                user.role,
                user.reset_token,
                user.reset_token_expiry,
                user.id.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, email, password_hash, role, reset_token, reset_token_expiry, created_at
             FROM sys_users WHERE email = ?",
        )?;

        match stmt.query_row(params![email], |row| Ok(row_to_user(row))) {
            Ok(user) => Ok(Some(user)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Point lookup on the indexed reset_token column
    pub fn find_user_by_reset_token(&self, token: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, email, password_hash, role, reset_token, reset_token_expiry, created_at
             FROM sys_users WHERE reset_token = ?",
        )?;

        match stmt.query_row(params![token], |row| Ok(row_to_user(row))) {
            Ok(user) => Ok(Some(user)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // === Expense operations ===

    pub fn insert_expense(&self, expense: &Expense) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sys_expenses (expense_id, user_id, title, amount, category,
                                       kind, entry_date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                expense.id.to_string(),
                expense.user_id.to_string(),
                expense.title,
                decimal_to_db(expense.amount),
                expense.category,
                expense.kind.as_str(),
                expense.date.to_string(),
                expense.created_at.to_rfc3339(),
                expense.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Update an expense's editable fields. The kind column is deliberately
    /// absent from the SET list: it is immutable after creation.
    pub fn update_expense(&self, expense: &Expense) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE sys_expenses
             SET title = ?, amount = ?, category = ?, entry_date = ?, updated_at = ?
             WHERE expense_id = ?",
            params![
                expense.title,
                decimal_to_db(expense.amount),
                expense.category,
                expense.date.to_string(),
                expense.updated_at.to_rfc3339(),
                expense.id.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn delete_expense(&self, id: Uuid) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM sys_expenses WHERE expense_id = ?",
            params![id.to_string()],
        )?;
        Ok(())
    }

    pub fn get_expense_by_id(&self, id: Uuid) -> Result<Option<Expense>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT expense_id, user_id, title, amount, category, kind,
                    entry_date::VARCHAR, created_at, updated_at
             FROM sys_expenses WHERE expense_id = ?",
        )?;

        match stmt.query_row(params![id.to_string()], |row| Ok(row_to_expense(row))) {
            Ok(expense) => Ok(Some(expense)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_expenses_by_user(&self, user_id: Uuid) -> Result<Vec<Expense>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT expense_id, user_id, title, amount, category, kind,
                    entry_date::VARCHAR, created_at, updated_at
             FROM sys_expenses WHERE user_id = ?
             ORDER BY entry_date DESC",
        )?;

        let expenses = stmt
            .query_map(params![user_id.to_string()], |row| Ok(row_to_expense(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(expenses)
    }

    /// Expenses for a user within an inclusive date range, restricted to one kind
    pub fn get_expenses_in_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        kind: TransactionKind,
    ) -> Result<Vec<Expense>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT expense_id, user_id, title, amount, category, kind,
                    entry_date::VARCHAR, created_at, updated_at
             FROM sys_expenses
             WHERE user_id = ? AND entry_date >= ? AND entry_date <= ? AND kind = ?
             ORDER BY entry_date",
        )?;

        let expenses = stmt
            .query_map(
                params![
                    user_id.to_string(),
                    start.to_string(),
                    end.to_string(),
                    kind.as_str()
                ],
                |row| Ok(row_to_expense(row)),
            )?
            .filter_map(|r| r.ok())
            .collect();

        Ok(expenses)
    }

    // === Budget operations ===

    pub fn get_budget(&self, user_id: Uuid, month: &str) -> Result<Option<Budget>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT budget_id, user_id, month, total
             FROM sys_budgets WHERE user_id = ? AND month = ?",
        )?;

        let budget = match stmt.query_row(params![user_id.to_string(), month], |row| {
            Ok(row_to_budget(row))
        }) {
            Ok(b) => b,
            Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let categories = Self::load_categories(&conn, budget.id)?;
        Ok(Some(Budget { categories, ..budget }))
    }

    /// The most recent budget strictly before the given month
    ///
    /// Months are zero-padded YYYY-MM strings, so string comparison is
    /// chronological comparison.
    pub fn get_latest_prior_budget(&self, user_id: Uuid, month: &str) -> Result<Option<Budget>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT budget_id, user_id, month, total
             FROM sys_budgets WHERE user_id = ? AND month < ?
             ORDER BY month DESC LIMIT 1",
        )?;

        let budget = match stmt.query_row(params![user_id.to_string(), month], |row| {
            Ok(row_to_budget(row))
        }) {
            Ok(b) => b,
            Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let categories = Self::load_categories(&conn, budget.id)?;
        Ok(Some(Budget { categories, ..budget }))
    }

    /// Persist a budget aggregate: the row and its full category list
    ///
    /// Clear-then-rebuild inside one transaction, so a reader never sees a
    /// new total with a stale category list or vice versa.
    pub fn save_budget(&self, budget: &Budget) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch("BEGIN TRANSACTION")?;

        let result = (|| -> Result<()> {
            let id = budget.id.to_string();
            conn.execute(
                "DELETE FROM sys_budget_categories WHERE budget_id = ?",
                params![id],
            )?;
            conn.execute("DELETE FROM sys_budgets WHERE budget_id = ?", params![id])?;
            conn.execute(
                "INSERT INTO sys_budgets (budget_id, user_id, month, total) VALUES (?, ?, ?, ?)",
                params![
                    id,
                    budget.user_id.to_string(),
                    budget.month,
                    decimal_to_db(budget.total)
                ],
            )?;
            for cb in &budget.categories {
                conn.execute(
                    "INSERT INTO sys_budget_categories (budget_id, category, amount) VALUES (?, ?, ?)",
                    params![id, cb.category, decimal_to_db(cb.amount)],
                )?;
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                conn.execute_batch("COMMIT")?;
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Delete a budget and cascade its category rows. Returns false if no
    /// budget existed for (user, month).
    pub fn delete_budget(&self, user_id: Uuid, month: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();

        let budget_id: Option<String> = match conn.query_row(
            "SELECT budget_id FROM sys_budgets WHERE user_id = ? AND month = ?",
            params![user_id.to_string(), month],
            |row| row.get(0),
        ) {
            Ok(id) => Some(id),
            Err(duckdb::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        let Some(budget_id) = budget_id else {
            return Ok(false);
        };

        // Children first, then the aggregate root
        conn.execute(
            "DELETE FROM sys_budget_categories WHERE budget_id = ?",
            params![budget_id],
        )?;
        conn.execute(
            "DELETE FROM sys_budgets WHERE budget_id = ?",
            params![budget_id],
        )?;
        Ok(true)
    }

    fn load_categories(conn: &Connection, budget_id: Uuid) -> Result<Vec<CategoryBudget>> {
        let mut stmt = conn.prepare(
            "SELECT category, amount FROM sys_budget_categories WHERE budget_id = ?",
        )?;

        let categories = stmt
            .query_map(params![budget_id.to_string()], |row| {
                Ok(CategoryBudget {
                    category: row.get(0).unwrap_or_default(),
                    amount: decimal_from_db(row.get(1).unwrap_or(0.0)),
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(categories)
    }

    // === Savings goal operations ===

    pub fn insert_goal(&self, goal: &SavingsGoal) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sys_savings_goals (goal_id, user_id, name, target, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                goal.id.to_string(),
                goal.user_id.to_string(),
                goal.name,
                decimal_to_db(goal.target),
                goal.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn update_goal(&self, goal: &SavingsGoal) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE sys_savings_goals SET name = ?, target = ? WHERE goal_id = ?",
            params![goal.name, decimal_to_db(goal.target), goal.id.to_string()],
        )?;
        Ok(())
    }

    /// Delete a goal and cascade its entries
    pub fn delete_goal(&self, goal_id: Uuid) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM sys_savings_entries WHERE goal_id = ?",
            params![goal_id.to_string()],
        )?;
        conn.execute(
            "DELETE FROM sys_savings_goals WHERE goal_id = ?",
            params![goal_id.to_string()],
        )?;
        Ok(())
    }

    pub fn get_goals_by_user(&self, user_id: Uuid) -> Result<Vec<SavingsGoal>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT goal_id, user_id, name, target, created_at
             FROM sys_savings_goals WHERE user_id = ?
             ORDER BY created_at",
        )?;

        let goals: Vec<SavingsGoal> = stmt
            .query_map(params![user_id.to_string()], |row| Ok(row_to_goal(row)))?
            .filter_map(|r| r.ok())
            .collect();

        goals
            .into_iter()
            .map(|goal| {
                let entries = Self::load_entries(&conn, goal.id)?;
                Ok(SavingsGoal { entries, ..goal })
            })
            .collect()
    }

    /// Owner-scoped lookup in a single query, so a miss reveals nothing about
    /// goals belonging to other users.
    pub fn get_goal_by_id_and_owner(&self, goal_id: Uuid, user_id: Uuid) -> Result<Option<SavingsGoal>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT goal_id, user_id, name, target, created_at
             FROM sys_savings_goals WHERE goal_id = ? AND user_id = ?",
        )?;

        let goal = match stmt.query_row(
            params![goal_id.to_string(), user_id.to_string()],
            |row| Ok(row_to_goal(row)),
        ) {
            Ok(g) => g,
            Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entries = Self::load_entries(&conn, goal.id)?;
        Ok(Some(SavingsGoal { entries, ..goal }))
    }

    /// Owner of a goal, for the entry -> goal -> owner chain check
    pub fn get_goal_owner(&self, goal_id: Uuid) -> Result<Option<Uuid>> {
        let conn = self.conn.lock().unwrap();
        let owner: Option<String> = match conn.query_row(
            "SELECT user_id FROM sys_savings_goals WHERE goal_id = ?",
            params![goal_id.to_string()],
            |row| row.get(0),
        ) {
            Ok(id) => Some(id),
            Err(duckdb::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        Ok(owner.and_then(|s| Uuid::parse_str(&s).ok()))
    }

    pub fn insert_savings_entry(&self, entry: &SavingsEntry) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sys_savings_entries (entry_id, goal_id, amount, entry_date, note)
             VALUES (?, ?, ?, ?, ?)",
            params![
                entry.id.to_string(),
                entry.goal_id.to_string(),
                decimal_to_db(entry.amount),
                entry.date.to_string(),
                entry.note,
            ],
        )?;
        Ok(())
    }

    pub fn get_savings_entry(&self, entry_id: Uuid) -> Result<Option<SavingsEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT entry_id, goal_id, amount, entry_date::VARCHAR, note
             FROM sys_savings_entries WHERE entry_id = ?",
        )?;

        match stmt.query_row(params![entry_id.to_string()], |row| Ok(row_to_entry(row))) {
            Ok(entry) => Ok(Some(entry)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn delete_savings_entry(&self, entry_id: Uuid) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM sys_savings_entries WHERE entry_id = ?",
            params![entry_id.to_string()],
        )?;
        Ok(())
    }

    fn load_entries(conn: &Connection, goal_id: Uuid) -> Result<Vec<SavingsEntry>> {
        let mut stmt = conn.prepare(
            "SELECT entry_id, goal_id, amount, entry_date::VARCHAR, note
             FROM sys_savings_entries WHERE goal_id = ?
             ORDER BY entry_date",
        )?;

        let entries = stmt
            .query_map(params![goal_id.to_string()], |row| Ok(row_to_entry(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(entries)
    }
}

// === Row mappers ===

fn row_to_user(row: &duckdb::Row) -> User {
    let id_str: String = row.get(0).unwrap_or_default();
    let created_str: String = row.get(6).unwrap_or_default();

    User {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::new_v4()),
        email: row.get(1).unwrap_or_default(),
        password_hash: row.get(2).unwrap_or_default(),
        role: row.get(3).unwrap_or_else(|_| "USER".to_string()),
        reset_token: row.get(4).ok(),
        reset_token_expiry: row.get::<_, Option<i64>>(5).ok().flatten(),
        created_at: parse_timestamp(&created_str),
    }
}

fn row_to_expense(row: &duckdb::Row) -> Expense {
    let id_str: String = row.get(0).unwrap_or_default();
    let user_str: String = row.get(1).unwrap_or_default();
    let kind_str: String = row.get(5).unwrap_or_default();
    let date_str: String = row.get(6).unwrap_or_default();
    let created_str: String = row.get(7).unwrap_or_default();
    let updated_str: String = row.get(8).unwrap_or_default();

    Expense {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::new_v4()),
        user_id: Uuid::parse_str(&user_str).unwrap_or_else(|_| Uuid::new_v4()),
        title: row.get(2).unwrap_or_default(),
        amount: decimal_from_db(row.get(3).unwrap_or(0.0)),
        category: row.get(4).unwrap_or_default(),
        kind: TransactionKind::parse(&kind_str).unwrap_or(TransactionKind::Expense),
        date: parse_date(&date_str),
        created_at: parse_timestamp(&created_str),
        updated_at: parse_timestamp(&updated_str),
    }
}

fn row_to_budget(row: &duckdb::Row) -> Budget {
    let id_str: String = row.get(0).unwrap_or_default();
    let user_str: String = row.get(1).unwrap_or_default();

    Budget {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::new_v4()),
        user_id: Uuid::parse_str(&user_str).unwrap_or_else(|_| Uuid::new_v4()),
        month: row.get(2).unwrap_or_default(),
        total: decimal_from_db(row.get(3).unwrap_or(0.0)),
        categories: Vec::new(),
    }
}

fn row_to_goal(row: &duckdb::Row) -> SavingsGoal {
    let id_str: String = row.get(0).unwrap_or_default();
    let user_str: String = row.get(1).unwrap_or_default();
    let created_str: String = row.get(4).unwrap_or_default();

    SavingsGoal {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::new_v4()),
        user_id: Uuid::parse_str(&user_str).unwrap_or_else(|_| Uuid::new_v4()),
        name: row.get(2).unwrap_or_default(),
        target: decimal_from_db(row.get(3).unwrap_or(0.0)),
        created_at: parse_timestamp(&created_str),
        entries: Vec::new(),
    }
}

fn row_to_entry(row: &duckdb::Row) -> SavingsEntry {
    let id_str: String = row.get(0).unwrap_or_default();
    let goal_str: String = row.get(1).unwrap_or_default();
    let date_str: String = row.get(3).unwrap_or_default();

    SavingsEntry {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::new_v4()),
        goal_id: Uuid::parse_str(&goal_str).unwrap_or_else(|_| Uuid::new_v4()),
        amount: decimal_from_db(row.get(2).unwrap_or(0.0)),
        date: parse_date(&date_str),
        note: row.get(4).ok(),
    }
}
