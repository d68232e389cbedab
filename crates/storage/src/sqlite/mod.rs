use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::record::SheetRow;
use crate::repository::{SheetBackend, Storage, StorageError};

mod mapping;
mod migrate;

use mapping::{map_sheet_row, row_index_to_i64};

/// Worksheets stored in a local `SQLite` database.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl SqliteRepository {
    /// Connect to `SQLite` using the given URL.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or if
    /// a connection PRAGMA fails during setup.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA foreign_keys = ON;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

#[async_trait]
impl SheetBackend for SqliteRepository {
    async fn read_table(&self, worksheet: &str) -> Result<Vec<SheetRow>, StorageError> {
        let exists = sqlx::query("SELECT 1 FROM worksheets WHERE name = ?1")
            .bind(worksheet)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        let rows = sqlx::query(
            r"
            SELECT user_id, history, marked, stats, last_question_index, updated_at
            FROM sheet_rows
            WHERE worksheet = ?1
            ORDER BY row_index ASC
            ",
        )
        .bind(worksheet)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_sheet_row).collect()
    }

    async fn write_table(&self, worksheet: &str, rows: &[SheetRow]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO worksheets (name, updated_at)
            VALUES (?1, ?2)
            ON CONFLICT(name) DO UPDATE SET updated_at = excluded.updated_at
            ",
        )
        .bind(worksheet)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM sheet_rows WHERE worksheet = ?1")
            .bind(worksheet)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (index, row) in rows.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO sheet_rows (worksheet, row_index, user_id, history, marked, stats, last_question_index, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )
            .bind(worksheet)
            .bind(row_index_to_i64(index)?)
            .bind(&row.user_id)
            .bind(row.history.as_deref())
            .bind(row.marked.as_deref())
            .bind(row.stats.as_deref())
            .bind(row.last_question_index)
            .bind(row.updated_at.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}

impl Storage {
    /// Build a `Storage` backed by `SQLite`, with progress rows kept in
    /// `worksheet`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str, worksheet: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        Ok(Self::from_backend(repo, worksheet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }
}
