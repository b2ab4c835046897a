//! Savings goal commands - goals and their entries

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{get_context, require_user};
use crate::output;

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a savings goal
    New {
        /// Goal name
        name: String,
        /// Target amount
        target: Decimal,
    },

    /// List your goals with progress
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rename or retarget a goal
    Update {
        /// Goal id
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        target: Option<Decimal>,
    },

    /// Delete a goal and all its entries
    Delete {
        /// Goal id
        id: Uuid,
    },

    /// Record a contribution toward a goal
    AddEntry {
        /// Goal id
        goal: Uuid,
        /// Contribution amount
        amount: Decimal,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Optional note
        #[arg(long)]
        note: Option<String>,
    },

    /// Delete a contribution
    DeleteEntry {
        /// Entry id
        id: Uuid,
    },
}

pub fn run(command: GoalCommands) -> Result<()> {
    let ctx = get_context()?;
    let user = require_user(&ctx)?;

    match command {
        GoalCommands::New { name, target } => {
            let goal = ctx.savings_service.create_goal(user.id, &name, target)?;
            output::success(&format!("Goal '{}' created (target {})", goal.name, goal.target));
            println!("id: {}", goal.id);
            Ok(())
        }

        GoalCommands::List { json } => {
            let goals = ctx.savings_service.get_goals(user.id)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&goals)?);
                return Ok(());
            }

            if goals.is_empty() {
                output::info("No savings goals yet");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Goal", "Target", "Saved", "Remaining", "Progress", "Id"]);
            for g in &goals {
                table.add_row(vec![
                    g.name.clone(),
                    g.target.to_string(),
                    g.total_saved.to_string(),
                    g.remaining.to_string(),
                    output::format_percentage(g.percentage),
                    g.id.to_string(),
                ]);
            }
            println!("{}", table);
            Ok(())
        }

        GoalCommands::Update { id, name, target } => {
            let goal = ctx.savings_service.update_goal(user.id, id, name, target)?;
            output::success(&format!("Goal '{}' updated", goal.name));
            Ok(())
        }

        GoalCommands::Delete { id } => {
            ctx.savings_service.delete_goal(user.id, id)?;
            output::success("Goal deleted");
            Ok(())
        }

        GoalCommands::AddEntry { goal, amount, date, note } => {
            let entry = ctx.savings_service.add_entry(
                user.id,
                goal,
                amount,
                date.unwrap_or_else(|| Local::now().date_naive()),
                note,
            )?;
            output::success(&format!("Saved {} on {}", entry.amount, entry.date));
            println!("id: {}", entry.id);
            Ok(())
        }

        GoalCommands::DeleteEntry { id } => {
            ctx.savings_service.delete_entry(user.id, id)?;
            output::success("Entry deleted");
            Ok(())
        }
    }
}
