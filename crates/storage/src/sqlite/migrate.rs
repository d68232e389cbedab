use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs pending schema migrations.
///
/// Version 1 creates the worksheet registry and the row table. A worksheet
/// exists once it has been written, even with zero rows.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS worksheets (
                    name TEXT PRIMARY KEY,
                    updated_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // Cells are stored as the text the row codec produces; no uniqueness
        // on user_id, duplicates are resolved by the reader.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS sheet_rows (
                    worksheet TEXT NOT NULL,
                    row_index INTEGER NOT NULL CHECK (row_index >= 0),
                    user_id TEXT NOT NULL,
                    history TEXT,
                    marked TEXT,
                    stats TEXT,
                    last_question_index INTEGER,
                    updated_at TEXT,
                    PRIMARY KEY (worksheet, row_index),
                    FOREIGN KEY (worksheet) REFERENCES worksheets(name) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_sheet_rows_worksheet_user
                    ON sheet_rows (worksheet, user_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
