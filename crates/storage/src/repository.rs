use async_trait::async_trait;
use quiz_core::model::UserId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::record::{PersistedRecord, SheetRow};

/// Worksheet that holds one row per user.
pub const DEFAULT_WORKSHEET: &str = "UserData";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Load and save one user's progress.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the record stored for `user`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read or the
    /// stored row cannot be decoded. A user without a row yields `Ok(None)`.
    async fn load(&self, user: &UserId) -> Result<Option<PersistedRecord>, StorageError>;

    /// Store `record` as the row for `user`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read or written.
    async fn save(&self, user: &UserId, record: &PersistedRecord) -> Result<(), StorageError>;
}

/// A tabular store addressed by worksheet name. Reads and writes are always
/// whole-table.
#[async_trait]
pub trait SheetBackend: Send + Sync {
    /// Read every row of `worksheet` in stored order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the worksheet does not exist, or
    /// another `StorageError` if the store is unreachable.
    async fn read_table(&self, worksheet: &str) -> Result<Vec<SheetRow>, StorageError>;

    /// Replace the full contents of `worksheet`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store rejects the write.
    async fn write_table(&self, worksheet: &str, rows: &[SheetRow]) -> Result<(), StorageError>;
}

//
// ─── GATEWAY ───────────────────────────────────────────────────────────────────
//

/// Progress repository over a whole-table backend.
///
/// `save` is read-modify-write: read the table, overwrite the first row whose
/// `user_id` matches (or append one), then write the table back. Nothing
/// guards the window between read and write, so two writers racing on the
/// same table lose updates: the last write wins, including over rows that
/// belong to other users.
#[derive(Clone)]
pub struct SheetGateway<B> {
    backend: B,
    worksheet: String,
}

impl<B: SheetBackend> SheetGateway<B> {
    pub fn new(backend: B) -> Self {
        Self::with_worksheet(backend, DEFAULT_WORKSHEET)
    }

    pub fn with_worksheet(backend: B, worksheet: impl Into<String>) -> Self {
        Self {
            backend,
            worksheet: worksheet.into(),
        }
    }

    #[must_use]
    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B: SheetBackend> ProgressRepository for SheetGateway<B> {
    async fn load(&self, user: &UserId) -> Result<Option<PersistedRecord>, StorageError> {
        let rows = match self.backend.read_table(&self.worksheet).await {
            Ok(rows) => rows,
            Err(StorageError::NotFound) => return Ok(None),
            Err(err) => return Err(err),
        };
        rows.iter()
            .find(|row| row.user_id == user.as_str())
            .map(SheetRow::to_record)
            .transpose()
    }

    async fn save(&self, user: &UserId, record: &PersistedRecord) -> Result<(), StorageError> {
        let new_row = record.to_row(user)?;

        let mut rows = match self.backend.read_table(&self.worksheet).await {
            Ok(rows) => rows,
            Err(StorageError::NotFound) => {
                tracing::debug!(worksheet = %self.worksheet, "worksheet missing; starting a new table");
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        match rows.iter_mut().find(|row| row.user_id == user.as_str()) {
            Some(existing) => *existing = new_row,
            None => rows.push(new_row),
        }

        self.backend.write_table(&self.worksheet, &rows).await?;
        tracing::debug!(worksheet = %self.worksheet, user_id = %user, rows = rows.len(), "progress saved");
        Ok(())
    }
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

/// Worksheets kept in process memory, for tests and offline runs.
///
/// Clones share the same tables. `set_available(false)` makes every call fail
/// with a connection error, to exercise degraded paths.
#[derive(Clone)]
pub struct InMemorySheet {
    tables: Arc<Mutex<HashMap<String, Vec<SheetRow>>>>,
    available: Arc<AtomicBool>,
}

impl Default for InMemorySheet {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySheet {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Connection("sheet store unavailable".into()))
        }
    }
}

#[async_trait]
impl SheetBackend for InMemorySheet {
    async fn read_table(&self, worksheet: &str) -> Result<Vec<SheetRow>, StorageError> {
        self.check_available()?;
        let guard = self
            .tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(worksheet).cloned().ok_or(StorageError::NotFound)
    }

    async fn write_table(&self, worksheet: &str, rows: &[SheetRow]) -> Result<(), StorageError> {
        self.check_available()?;
        let mut guard = self
            .tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(worksheet.to_owned(), rows.to_vec());
        Ok(())
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Progress repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_backend(InMemorySheet::new(), DEFAULT_WORKSHEET)
    }

    pub fn from_backend<B: SheetBackend + 'static>(backend: B, worksheet: impl Into<String>) -> Self {
        let progress: Arc<dyn ProgressRepository> =
            Arc::new(SheetGateway::with_worksheet(backend, worksheet));
        Self { progress }
    }
}
