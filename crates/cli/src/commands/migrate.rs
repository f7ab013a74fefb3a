//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! clinic-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CLINIC_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migrations live in `crates/server/migrations/` and are embedded at build
//! time.

use super::{CliError, connect};

/// Run all pending clinic migrations.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running clinic migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Clinic migrations complete!");
    Ok(())
}
