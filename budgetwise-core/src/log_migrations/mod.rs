//! Migrations for the logs database (logs.duckdb)
//!
//! Kept separate from the main database migrations so the log store can
//! evolve independently.

pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_logs.sql", include_str!("001_logs.sql")),
];
