//! SQLite settings store
//!
//! One row per user in `user_settings`. The schema is created by the
//! migrations in `./migrations`.

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument};

use super::error::{SettingsError, SettingsResult};
use super::{SettingsStore, UserSettings};

pub struct SqliteSettingsStore {
    pool: Pool<Sqlite>,
}

impl SqliteSettingsStore {
    /// Open (and create if missing) the database at `db_path`, then run migrations
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> SettingsResult<Self> {
        let db_path = db_path.as_ref();

        info!("opening settings database at: {}", db_path.display());

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .map_err(|e| SettingsError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    #[instrument(skip(self))]
    async fn get(&self, user: &str) -> SettingsResult<UserSettings> {
        let row = sqlx::query("SELECT id, checks_disabled FROM user_settings WHERE id = ?")
            .bind(user)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(row) => UserSettings {
                id: row.try_get("id")?,
                checks_disabled: row.try_get("checks_disabled")?,
            },
            None => UserSettings::new(user),
        })
    }

    #[instrument(skip(self))]
    async fn set(&self, settings: &UserSettings) -> SettingsResult<()> {
        sqlx::query(
            "INSERT INTO user_settings (id, checks_disabled) VALUES (?, ?) \
             ON CONFLICT(id) DO UPDATE SET checks_disabled = excluded.checks_disabled",
        )
        .bind(&settings.id)
        .bind(settings.checks_disabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn all(&self) -> SettingsResult<Vec<UserSettings>> {
        let rows = sqlx::query("SELECT id, checks_disabled FROM user_settings ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> SettingsResult<UserSettings> {
                Ok(UserSettings {
                    id: row.try_get("id")?,
                    checks_disabled: row.try_get("checks_disabled")?,
                })
            })
            .collect()
    }
}
