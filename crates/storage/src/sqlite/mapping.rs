use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::record::SheetRow;
use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn row_index_to_i64(index: usize) -> Result<i64, StorageError> {
    i64::try_from(index).map_err(|_| StorageError::Serialization("row_index overflow".into()))
}

pub(crate) fn map_sheet_row(row: &SqliteRow) -> Result<SheetRow, StorageError> {
    Ok(SheetRow {
        user_id: row.try_get("user_id").map_err(ser)?,
        history: row.try_get("history").map_err(ser)?,
        marked: row.try_get("marked").map_err(ser)?,
        stats: row.try_get("stats").map_err(ser)?,
        last_question_index: row.try_get("last_question_index").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}
