#![forbid(unsafe_code)]

pub mod http;
pub mod record;
pub mod repository;
pub mod sqlite;

pub use record::{PersistedRecord, SheetRow};
pub use repository::{
    InMemorySheet, ProgressRepository, SheetBackend, SheetGateway, Storage, StorageError,
    DEFAULT_WORKSHEET,
};
