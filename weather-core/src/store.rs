//! Local persistence of fetched readings.
//!
//! # Invariants
//! - Every insert appends one row with a fresh, monotonic id.
//! - `load` enumerates rows in ascending id order.
//! - Calls against one store never interleave at the statement level.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{StoredRecord, WeatherReading};

mod migrations;
pub mod sqlite;

pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },

    /// The blocking worker running the statement panicked or was cancelled.
    #[error("store worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Empty,
    Found(Vec<StoredRecord>),
}

impl LoadOutcome {
    /// `Empty` and `Found([])` are the same observable case.
    pub fn into_records(self) -> Vec<StoredRecord> {
        match self {
            LoadOutcome::Empty => Vec::new(),
            LoadOutcome::Found(records) => records,
        }
    }
}

#[async_trait]
pub trait LocalStore: Send + Sync + Debug {
    async fn insert(
        &self,
        reading: &WeatherReading,
        captured_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn load(&self) -> StoreResult<LoadOutcome>;
}
