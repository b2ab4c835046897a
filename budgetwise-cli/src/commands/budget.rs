//! Budget commands - set, show, delete

use anyhow::Result;
use clap::Subcommand;
use rust_decimal::Decimal;

use budgetwise_core::CategoryBudget;

use super::{get_context, require_user};
use crate::output;

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Create or replace the budget for a month
    Set {
        /// Month in YYYY-MM format
        month: String,
        /// Total budget amount
        total: Decimal,
        /// Category allocations as NAME=AMOUNT (repeatable)
        #[arg(long = "category", value_name = "NAME=AMOUNT")]
        categories: Vec<String>,
    },

    /// Show budget vs actual for a month
    Show {
        /// Month in YYYY-MM format
        month: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete the budget for a month
    Delete {
        /// Month in YYYY-MM format
        month: String,
    },
}

pub fn run(command: BudgetCommands) -> Result<()> {
    let ctx = get_context()?;
    let user = require_user(&ctx)?;

    match command {
        BudgetCommands::Set { month, total, categories } => {
            let categories = parse_categories(&categories)?;
            let budget = ctx
                .budget_service
                .save_budget(user.id, &month, total, categories)?;
            output::success(&format!(
                "Budget for {} set to {} ({} categories)",
                budget.month,
                budget.total,
                budget.categories.len()
            ));
            Ok(())
        }

        BudgetCommands::Show { month, json } => {
            let summary = ctx.budget_service.get_summary(user.id, &month)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!("Budget summary for {}", summary.month);
            println!();

            let mut table = output::create_table();
            table.set_header(vec!["Category", "Budget", "Spent", "Used"]);
            for c in &summary.categories {
                table.add_row(vec![
                    c.category.clone(),
                    c.budget.to_string(),
                    c.spent.to_string(),
                    output::format_percentage(c.percentage),
                ]);
            }
            table.add_row(vec![
                "Overall".to_string(),
                summary.overall.budget.to_string(),
                summary.overall.spent.to_string(),
                output::format_percentage(summary.overall.percentage),
            ]);
            println!("{}", table);

            if summary.overall.remaining < Decimal::ZERO {
                output::warning(&format!(
                    "Over budget by {}",
                    -summary.overall.remaining
                ));
            } else {
                println!("Remaining: {}", summary.overall.remaining);
            }
            Ok(())
        }

        BudgetCommands::Delete { month } => {
            ctx.budget_service.delete_budget(user.id, &month)?;
            output::success(&format!("Budget for {} deleted", month));
            Ok(())
        }
    }
}

/// Parse repeated NAME=AMOUNT flags into category allocations
fn parse_categories(raw: &[String]) -> Result<Vec<CategoryBudget>> {
    raw.iter()
        .map(|s| {
            let (name, amount) = s
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("Expected NAME=AMOUNT, got '{}'", s))?;
            let amount: Decimal = amount
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid amount in '{}'", s))?;
            Ok(CategoryBudget {
                category: name.trim().to_string(),
                amount,
            })
        })
        .collect()
}
