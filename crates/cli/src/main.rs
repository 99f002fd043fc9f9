//! Atelier CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! atelier migrate
//!
//! # Bootstrap the first admin
//! atelier user create -e admin@example.com -n "Admin Name" -r admin -p 'long passphrase'
//!
//! # Insert the demo catalog (safe to run twice)
//! atelier seed
//! ```
//!
//! # Environment Variables
//!
//! - `ATELIER_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `ATELIER_USER_PASSWORD` - Password for `user create` when `-p` is omitted

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(author, version, about = "Atelier CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Insert demo products and services
    Seed,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user with any role
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`customer`, `editor`, `admin`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Password (at least 8 characters)
        #[arg(short, long, env = "ATELIER_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::user::create(&email, &name, &role, &password).await?;
            }
        },
        Commands::Seed => commands::seed::run().await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_user_create() {
        let cli = Cli::try_parse_from([
            "atelier", "user", "create", "-e", "a@example.com", "-n", "Ada", "-r", "editor", "-p",
            "passphrase",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::User {
                action: UserAction::Create { .. }
            })
        ));
    }
}
