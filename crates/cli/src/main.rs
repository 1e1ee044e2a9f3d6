//! Recipe Book CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! recipe-cli migrate
//!
//! # Block until the database accepts connections
//! recipe-cli db wait --attempts 30 --interval-secs 1
//!
//! # Create a staff superuser
//! recipe-cli user create-superuser -e admin@example.com -p 'correct horse' -n "Admin"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `db wait` - Wait for the database to become reachable
//! - `user create-superuser` - Provision a staff superuser account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "recipe-cli")]
#[command(author, version, about = "Recipe Book CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Database utilities
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Poll the database until it accepts connections
    Wait {
        /// Number of connection attempts before giving up
        #[arg(long, default_value_t = 30)]
        attempts: u32,

        /// Seconds to sleep between attempts
        #[arg(long, default_value_t = 1)]
        interval_secs: u64,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an active staff superuser
    CreateSuperuser {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 5 characters)
        #[arg(short, long, env = "RECIPE_SUPERUSER_PASSWORD")]
        password: String,

        /// Display name
        #[arg(short, long, default_value = "")]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Db { action } => match action {
            DbAction::Wait {
                attempts,
                interval_secs,
            } => commands::db::wait(attempts, interval_secs).await?,
        },
        Commands::User { action } => match action {
            UserAction::CreateSuperuser {
                email,
                password,
                name,
            } => {
                commands::user::create_superuser(&email, &password, &name).await?;
            }
        },
    }
    Ok(())
}
