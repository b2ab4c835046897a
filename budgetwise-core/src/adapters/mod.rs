//! Adapter implementations for external dependencies

pub mod duckdb;
