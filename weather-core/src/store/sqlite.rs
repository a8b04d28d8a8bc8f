//! SQLite-backed [`LocalStore`].
//!
//! The connection lives behind a mutex and every statement runs on the
//! blocking pool, so callers on any task may share one store.

use std::{path::Path, sync::Arc, time::Duration, time::Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, Row, params};
use tracing::{debug, error, info};

use super::{LoadOutcome, LocalStore, StoreError, StoreResult, migrations::apply_migrations};
use crate::model::{StoredRecord, WeatherReading};

const INSERT_READING: &str = "INSERT INTO weather_data_table
    (name, weather, temp, humidity, date, latitude, longitude)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);";

const SELECT_ALL: &str = "SELECT id, name, weather, temp, humidity, date, latitude, longitude
    FROM weather_data_table
    ORDER BY id ASC;";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and makes sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        Self::bootstrap("file", || {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Ok(Connection::open(path)?)
        })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::bootstrap("memory", || Ok(Connection::open_in_memory()?))
    }

    fn bootstrap(
        mode: &'static str,
        open: impl FnOnce() -> StoreResult<Connection>,
    ) -> StoreResult<Self> {
        let started_at = Instant::now();
        info!(event = "db_open", status = "start", mode);

        let result = open().and_then(|mut conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            apply_migrations(&mut conn)?;
            Ok(conn)
        });

        match result {
            Ok(conn) => {
                info!(
                    event = "db_open",
                    status = "ok",
                    mode,
                    duration_ms = (started_at.elapsed().as_millis() as u64)
                );
                Ok(Self { conn: Arc::new(Mutex::new(conn)) })
            }
            Err(err) => {
                error!(
                    event = "db_open",
                    status = "error",
                    mode,
                    duration_ms = (started_at.elapsed().as_millis() as u64),
                    error = %err
                );
                Err(err)
            }
        }
    }

    /// Runs `op` on the blocking pool while holding the connection lock.
    async fn with_connection<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            op(&conn)
        })
        .await
        .map_err(|err| StoreError::Worker(err.to_string()))?
    }
}

#[async_trait]
impl LocalStore for SqliteStore {
    async fn insert(
        &self,
        reading: &WeatherReading,
        captured_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let reading = reading.clone();
        let id = self
            .with_connection(move |conn| {
                conn.execute(
                    INSERT_READING,
                    params![
                        reading.name,
                        reading.weather_summary,
                        reading.temperature_c,
                        reading.humidity_pct,
                        captured_at,
                        reading.latitude,
                        reading.longitude,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        debug!(event = "reading_insert", id, "stored weather reading");
        Ok(())
    }

    async fn load(&self) -> StoreResult<LoadOutcome> {
        let records = self
            .with_connection(|conn| {
                let mut stmt = conn.prepare(SELECT_ALL)?;
                let rows = stmt.query_map([], map_row)?;
                let records = rows.collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await?;

        debug!(event = "reading_load", count = records.len(), "loaded weather readings");

        if records.is_empty() {
            Ok(LoadOutcome::Empty)
        } else {
            Ok(LoadOutcome::Found(records))
        }
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    Ok(StoredRecord {
        id: row.get("id")?,
        reading: WeatherReading {
            name: row.get("name")?,
            latitude: row.get("latitude")?,
            longitude: row.get("longitude")?,
            weather_summary: row.get("weather")?,
            temperature_c: row.get("temp")?,
            humidity_pct: row.get("humidity")?,
        },
        captured_at: row.get("date")?,
    })
}
