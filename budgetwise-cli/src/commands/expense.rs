//! Expense commands - add, list, update, delete

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use rust_decimal::Decimal;
use uuid::Uuid;

use budgetwise_core::services::{ExpenseUpdate, NewExpense};
use budgetwise_core::TransactionKind;

use super::{get_context, require_user};
use crate::output;

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense or income entry
    Add {
        /// Short description
        title: String,
        /// Amount (positive magnitude)
        amount: Decimal,
        /// Category label
        #[arg(long)]
        category: String,
        /// Transaction kind: expense or income
        #[arg(long)]
        kind: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List your entries, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update an entry (the kind can never be changed)
    Update {
        /// Entry id
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Delete an entry
    Delete {
        /// Entry id
        id: Uuid,
    },
}

pub fn run(command: ExpenseCommands) -> Result<()> {
    let ctx = get_context()?;
    let user = require_user(&ctx)?;

    match command {
        ExpenseCommands::Add { title, amount, category, kind, date } => {
            let expense = ctx.expense_service.add(
                user.id,
                NewExpense {
                    title,
                    amount,
                    category,
                    kind: TransactionKind::parse(&kind),
                    date: date.unwrap_or_else(|| Local::now().date_naive()),
                },
            )?;
            output::success(&format!(
                "Recorded {} {} ({}) on {}",
                expense.kind.as_str().to_lowercase(),
                expense.amount,
                expense.category,
                expense.date
            ));
            println!("id: {}", expense.id);
            Ok(())
        }

        ExpenseCommands::List { json } => {
            let expenses = ctx.expense_service.list(user.id)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&expenses)?);
                return Ok(());
            }

            if expenses.is_empty() {
                output::info("No entries yet");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Date", "Title", "Category", "Kind", "Amount", "Id"]);
            for e in &expenses {
                table.add_row(vec![
                    e.date.to_string(),
                    e.title.clone(),
                    e.category.clone(),
                    e.kind.as_str().to_string(),
                    e.amount.to_string(),
                    e.id.to_string(),
                ]);
            }
            println!("{}", table);
            Ok(())
        }

        ExpenseCommands::Update { id, title, amount, category, date } => {
            let expense = ctx.expense_service.update(
                user.id,
                id,
                ExpenseUpdate {
                    title,
                    amount,
                    category,
                    date,
                    kind: None,
                },
            )?;
            output::success(&format!("Updated '{}'", expense.title));
            Ok(())
        }

        ExpenseCommands::Delete { id } => {
            ctx.expense_service.delete(user.id, id)?;
            output::success("Entry deleted");
            Ok(())
        }
    }
}
