//! CLI subcommands.

pub mod doctor;
pub mod migrate;

use thiserror::Error;

use clinic_core::FieldErrors;
use clinic_server::config::ConfigError;
use clinic_server::db::RepositoryError;
use clinic_server::services::auth::AuthError;

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Environment is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Input was rejected.
    #[error("Invalid input: {0}")]
    Invalid(#[from] FieldErrors),

    /// No doctor with the given email.
    #[error("No doctor with email: {0}")]
    DoctorNotFound(String),

    /// A doctor with the given email already exists.
    #[error("Doctor already exists with email: {0}")]
    DoctorExists(String),

    /// Password could not be read or hashed.
    #[error("Password error: {0}")]
    Password(String),
}

impl From<AuthError> for CliError {
    fn from(err: AuthError) -> Self {
        Self::Password(err.to_string())
    }
}

/// Connect to the clinic database named by the environment.
async fn connect() -> Result<sqlx::PgPool, CliError> {
    let database_url = clinic_server::config::database_url_from_env()?;
    tracing::info!("Connecting to clinic database...");
    Ok(clinic_server::db::create_pool(&database_url).await?)
}
