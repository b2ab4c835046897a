//! Budgetwise CLI - personal budgeting in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use budgetwise_core::services::LogEvent;
use commands::{auth, budget, expense, goal};

/// Budgetwise - personal budgeting in your terminal
#[derive(Parser)]
#[command(name = "bw", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account
    Register {
        /// Email address
        email: String,
        /// Password (prompted interactively if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log in and store a session token
    Login {
        /// Email address
        email: String,
        /// Password (prompted interactively if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Discard the stored session token
    Logout,

    /// Request a password reset token
    ForgotPassword {
        /// Email address of the account
        email: String,
    },

    /// Set a new password using a reset token
    ResetPassword {
        /// The reset token from forgot-password
        token: String,
        /// New password (prompted interactively if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Manage monthly budgets
    Budget {
        #[command(subcommand)]
        command: budget::BudgetCommands,
    },

    /// Manage expenses and income
    Expense {
        #[command(subcommand)]
        command: expense::ExpenseCommands,
    },

    /// Manage savings goals
    Goal {
        #[command(subcommand)]
        command: goal::GoalCommands,
    },
}

impl Commands {
    /// Command name for event logging (names only, never arguments)
    fn name(&self) -> &'static str {
        match self {
            Commands::Register { .. } => "register",
            Commands::Login { .. } => "login",
            Commands::Logout => "logout",
            Commands::ForgotPassword { .. } => "forgot_password",
            Commands::ResetPassword { .. } => "reset_password",
            Commands::Budget { .. } => "budget",
            Commands::Expense { .. } => "expense",
            Commands::Goal { .. } => "goal",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command_name = cli.command.name();

    let logger = commands::get_logger();
    let result = run(cli);

    match result {
        Ok(()) => {
            commands::log_event(
                &logger,
                LogEvent::new("command_ok").with_command(command_name),
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            let kind = e
                .downcast_ref::<budgetwise_core::Error>()
                .map(|ce| ce.kind())
                .unwrap_or("other");
            commands::log_event(
                &logger,
                LogEvent::new("command_failed")
                    .with_command(command_name)
                    .with_error_kind(kind),
            );
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Register { email, password } => auth::register(&email, password),
        Commands::Login { email, password } => auth::login(&email, password),
        Commands::Logout => auth::logout(),
        Commands::ForgotPassword { email } => auth::forgot_password(&email),
        Commands::ResetPassword { token, password } => auth::reset_password(&token, password),
        Commands::Budget { command } => budget::run(command),
        Commands::Expense { command } => expense::run(command),
        Commands::Goal { command } => goal::run(command),
    }
}
