//! Clinic CLI - database migrations and doctor account administration.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! clinic-cli migrate
//!
//! # Create a doctor (password on stdin)
//! echo 'a-long-password' | clinic-cli doctor create -e house@example.com -f Gregory -l House
//!
//! # Deactivate, reactivate, or delete a doctor
//! clinic-cli doctor deactivate -e house@example.com
//! clinic-cli doctor activate -e house@example.com
//! clinic-cli doctor delete -e house@example.com
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "clinic-cli")]
#[command(author, version, about = "Clinic backend CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage doctor accounts
    Doctor {
        #[command(subcommand)]
        action: DoctorAction,
    },
}

#[derive(Subcommand)]
enum DoctorAction {
    /// Create a doctor account; the password is read from stdin
    Create {
        /// Doctor email address
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,
    },
    /// Allow a doctor to log in again
    Activate {
        #[arg(short, long)]
        email: String,
    },
    /// Block a doctor from logging in and being booked
    Deactivate {
        #[arg(short, long)]
        email: String,
    },
    /// Permanently delete a doctor with their patients and appointments
    Delete {
        #[arg(short, long)]
        email: String,
    },
    /// List all doctors
    List,
}

#[tokio::main]
async fn main() {
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
        Commands::Doctor { action } => match action {
            DoctorAction::Create {
                email,
                first_name,
                last_name,
            } => {
                commands::doctor::create(&email, &first_name, &last_name, std::io::stdin().lock())
                    .await?;
            }
            DoctorAction::Activate { email } => commands::doctor::set_active(&email, true).await?,
            DoctorAction::Deactivate { email } => {
                commands::doctor::set_active(&email, false).await?;
            }
            DoctorAction::Delete { email } => commands::doctor::delete(&email).await?,
            DoctorAction::List => commands::doctor::list().await?,
        },
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
    fn test_parses_doctor_create() {
        let cli = Cli::try_parse_from([
            "clinic-cli", "doctor", "create", "-e", "a@b.co", "-f", "Ada", "-l", "Lovelace",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Doctor {
                action: DoctorAction::Create { .. }
            })
        ));
    }
}
