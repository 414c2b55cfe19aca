//! Connection provider: the application-lifetime SQLite pool and per-request scoped sessions.

use crate::error::AppError;
use crate::settings::Settings;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, Transaction};
use std::str::FromStr;
use std::time::Duration;

/// Cheap to clone; every clone shares the same pool. Created once at startup and handed to each router.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

impl Database {
    pub async fn connect(settings: &Settings) -> Result<Self, AppError> {
        let memory = is_memory_url(&settings.database_url);
        let mut opts = SqliteConnectOptions::from_str(&settings.database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        if !memory {
            opts = opts.journal_mode(SqliteJournalMode::Wal);
        }
        // Every connection to an in-memory url is its own database; keep exactly one alive.
        let pool_opts = if memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(settings.max_connections)
        };
        let pool = pool_opts
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(opts)
            .await?;
        tracing::info!(url = %settings.database_url, "database connected");
        Ok(Database { pool })
    }

    /// Private in-memory database, used by tests and throwaway runs.
    pub async fn connect_in_memory() -> Result<Self, AppError> {
        let settings = Settings {
            database_url: "sqlite::memory:".into(),
            ..Settings::default()
        };
        Self::connect(&settings).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a request-scoped session. Dropping it without `commit` rolls the transaction back.
    pub async fn acquire(&self) -> Result<Session, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Session { tx })
    }

    /// Liveness check: a trivial query through the pool.
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// One transaction, owned by one request handler.
pub struct Session {
    tx: Transaction<'static, Sqlite>,
}

impl Session {
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }

    /// Close the session with the handler's outcome: commit on success, roll back on any error.
    /// The handler's error wins over a failed rollback.
    pub async fn finish<T>(self, result: Result<T, AppError>) -> Result<T, AppError> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let AppError::Integrity(ref msg) = e {
                    tracing::warn!(error = %msg, "integrity violation, rolling back");
                }
                if let Err(rb) = self.rollback().await {
                    tracing::error!(error = %rb, "rollback failed");
                }
                Err(e)
            }
        }
    }
}
