//! Error types for settings store operations

use thiserror::Error;

/// Result type alias for settings operations
pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to connect to settings store: {0}")]
    ConnectionFailed(String),

    #[error("settings query failed: {0}")]
    QueryFailed(String),

    #[error("settings migration failed: {0}")]
    MigrationFailed(String),

    #[error("invalid settings configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "storage-sqlite")]
impl From<sqlx::Error> for SettingsError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(io_err) => SettingsError::Io(io_err),
            _ => SettingsError::QueryFailed(err.to_string()),
        }
    }
}

#[cfg(feature = "storage-sqlite")]
impl From<sqlx::migrate::MigrateError> for SettingsError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        SettingsError::MigrationFailed(err.to_string())
    }
}
