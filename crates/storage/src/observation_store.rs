//! SQLite observation store
//!
//! Implements [`ObservationStore`] over the r2d2 pool, pushing the blocking
//! rusqlite work onto the tokio blocking pool. Observation writes are
//! idempotent: the `(station_id, observed_at)` primary key turns a re-poll
//! of the same provider reading into an in-place overwrite.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::NormalizedObservation;
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::connection::{ConnectionPool, PersistError};

/// Bookkeeping row for one finished polling cycle.
#[derive(Debug, Clone)]
pub struct CycleRecord {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_stations: usize,
    pub error_stations: usize,
    /// Failure message per failed station
    pub errors: BTreeMap<Uuid, String>,
}

/// Health bookkeeping for one station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationState {
    pub station_id: Uuid,
    pub last_success_at: Option<DateTime<Utc>>,
    pub incident_count: i64,
}

/// Persistence port for the gatherer.
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Insert or overwrite one observation.
    async fn upsert(&self, observation: &NormalizedObservation) -> Result<(), PersistError>;

    /// Record a successful poll for a station and reset its incident count.
    async fn mark_success(&self, station_id: Uuid, at: DateTime<Utc>) -> Result<(), PersistError>;

    /// Bump a station's consecutive incident count.
    async fn record_incident(&self, station_id: Uuid) -> Result<(), PersistError>;

    /// Append the run log row for a finished cycle.
    async fn record_cycle(&self, record: &CycleRecord) -> Result<(), PersistError>;
}

/// SQLite-backed observation store
#[derive(Debug, Clone)]
pub struct SqliteObservationStore {
    pool: Arc<ConnectionPool>,
}

fn parse_utc(raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

fn parse_station_id(raw: &str) -> Result<Uuid, rusqlite::Error> {
    Uuid::parse_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_observation(row: &Row<'_>) -> Result<NormalizedObservation, rusqlite::Error> {
    let station_id = parse_station_id(&row.get::<_, String>(0)?)?;
    let observed_at = parse_utc(&row.get::<_, String>(1)?)?;
    let mut obs = NormalizedObservation::new(station_id, observed_at);
    obs.taken_at = parse_utc(&row.get::<_, String>(2)?)?;
    obs.temperature = row.get(3)?;
    obs.humidity = row.get(4)?;
    obs.pressure = row.get(5)?;
    obs.wind_speed = row.get(6)?;
    obs.wind_gust = row.get(7)?;
    obs.wind_direction = row.get(8)?;
    obs.rain_rate = row.get(9)?;
    obs.rain_day = row.get(10)?;
    obs.max_temperature = row.get(11)?;
    obs.min_temperature = row.get(12)?;
    obs.max_wind_speed = row.get(13)?;
    obs.max_wind_gust = row.get(14)?;
    obs.dew_point = row.get(15)?;
    obs.heat_index = row.get(16)?;
    obs.flagged = row.get(17)?;
    Ok(obs)
}

impl SqliteObservationStore {
    #[must_use]
    pub const fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Read one observation back, mainly for tests and ad-hoc inspection.
    ///
    /// # Errors
    ///
    /// Returns an error when the pool or query fails.
    pub async fn observation(
        &self,
        station_id: Uuid,
        observed_at: DateTime<Utc>,
    ) -> Result<Option<NormalizedObservation>, PersistError> {
        let pool = Arc::clone(&self.pool);
        task::spawn_blocking(move || {
            let conn = pool.get()?;
            let obs = conn
                .query_row(
                    "SELECT station_id, observed_at, taken_at, temperature, humidity,
                            pressure, wind_speed, wind_gust, wind_direction, rain_rate,
                            rain_day, max_temperature, min_temperature, max_wind_speed,
                            max_wind_gust, dew_point, heat_index, flagged
                     FROM observations WHERE station_id = ?1 AND observed_at = ?2",
                    params![station_id.to_string(), observed_at.to_rfc3339()],
                    row_to_observation,
                )
                .optional()?;
            Ok(obs)
        })
        .await
        .map_err(|e| PersistError::Runtime(e.to_string()))?
    }

    /// Total stored observation rows.
    ///
    /// # Errors
    ///
    /// Returns an error when the pool or query fails.
    pub async fn observation_count(&self) -> Result<i64, PersistError> {
        let pool = Arc::clone(&self.pool);
        task::spawn_blocking(move || {
            let conn = pool.get()?;
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM observations", [], |row| {
                row.get(0)
            })?;
            Ok(count)
        })
        .await
        .map_err(|e| PersistError::Runtime(e.to_string()))?
    }

    /// Health bookkeeping row for a station, if any poll was recorded.
    ///
    /// # Errors
    ///
    /// Returns an error when the pool or query fails.
    pub async fn station_state(
        &self,
        station_id: Uuid,
    ) -> Result<Option<StationState>, PersistError> {
        let pool = Arc::clone(&self.pool);
        task::spawn_blocking(move || {
            let conn = pool.get()?;
            let state = conn
                .query_row(
                    "SELECT station_id, last_success_at, incident_count
                     FROM station_state WHERE station_id = ?1",
                    [station_id.to_string()],
                    |row| {
                        let station_id = parse_station_id(&row.get::<_, String>(0)?)?;
                        let last_success_at = row
                            .get::<_, Option<String>>(1)?
                            .map(|raw| parse_utc(&raw))
                            .transpose()?;
                        Ok(StationState {
                            station_id,
                            last_success_at,
                            incident_count: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(state)
        })
        .await
        .map_err(|e| PersistError::Runtime(e.to_string()))?
    }
}

#[async_trait]
impl ObservationStore for SqliteObservationStore {
    #[instrument(skip(self, observation), fields(station = %observation.station_id))]
    async fn upsert(&self, observation: &NormalizedObservation) -> Result<(), PersistError> {
        let pool = Arc::clone(&self.pool);
        let obs = observation.clone();

        task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO observations (
                    station_id, observed_at, taken_at, temperature, humidity,
                    pressure, wind_speed, wind_gust, wind_direction, rain_rate,
                    rain_day, max_temperature, min_temperature, max_wind_speed,
                    max_wind_gust, dew_point, heat_index, flagged
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
                 ON CONFLICT(station_id, observed_at) DO UPDATE SET
                    taken_at = excluded.taken_at,
                    temperature = excluded.temperature,
                    humidity = excluded.humidity,
                    pressure = excluded.pressure,
                    wind_speed = excluded.wind_speed,
                    wind_gust = excluded.wind_gust,
                    wind_direction = excluded.wind_direction,
                    rain_rate = excluded.rain_rate,
                    rain_day = excluded.rain_day,
                    max_temperature = excluded.max_temperature,
                    min_temperature = excluded.min_temperature,
                    max_wind_speed = excluded.max_wind_speed,
                    max_wind_gust = excluded.max_wind_gust,
                    dew_point = excluded.dew_point,
                    heat_index = excluded.heat_index,
                    flagged = excluded.flagged",
                params![
                    obs.station_id.to_string(),
                    obs.observed_at.to_rfc3339(),
                    obs.taken_at.to_rfc3339(),
                    obs.temperature,
                    obs.humidity,
                    obs.pressure,
                    obs.wind_speed,
                    obs.wind_gust,
                    obs.wind_direction,
                    obs.rain_rate,
                    obs.rain_day,
                    obs.max_temperature,
                    obs.min_temperature,
                    obs.max_wind_speed,
                    obs.max_wind_gust,
                    obs.dew_point,
                    obs.heat_index,
                    obs.flagged,
                ],
            )?;
            debug!("Observation stored");
            Ok(())
        })
        .await
        .map_err(|e| PersistError::Runtime(e.to_string()))?
    }

    #[instrument(skip(self), fields(station = %station_id))]
    async fn mark_success(&self, station_id: Uuid, at: DateTime<Utc>) -> Result<(), PersistError> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO station_state (station_id, last_success_at, incident_count)
                 VALUES (?1, ?2, 0)
                 ON CONFLICT(station_id) DO UPDATE SET
                    last_success_at = excluded.last_success_at,
                    incident_count = 0",
                params![station_id.to_string(), at.to_rfc3339()],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| PersistError::Runtime(e.to_string()))?
    }

    #[instrument(skip(self), fields(station = %station_id))]
    async fn record_incident(&self, station_id: Uuid) -> Result<(), PersistError> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO station_state (station_id, last_success_at, incident_count)
                 VALUES (?1, NULL, 1)
                 ON CONFLICT(station_id) DO UPDATE SET
                    incident_count = incident_count + 1",
                [station_id.to_string()],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| PersistError::Runtime(e.to_string()))?
    }

    #[instrument(skip(self, record), fields(run = %record.run_id))]
    async fn record_cycle(&self, record: &CycleRecord) -> Result<(), PersistError> {
        let pool = Arc::clone(&self.pool);
        let record = record.clone();

        task::spawn_blocking(move || {
            let conn = pool.get()?;
            let errors: BTreeMap<String, &String> = record
                .errors
                .iter()
                .map(|(id, message)| (id.to_string(), message))
                .collect();
            let errors_json = if errors.is_empty() {
                None
            } else {
                serde_json::to_string(&errors).ok()
            };
            conn.execute(
                "INSERT INTO cycle_runs (
                    run_id, started_at, finished_at, total_stations, error_stations, errors
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.run_id.to_string(),
                    record.started_at.to_rfc3339(),
                    record.finished_at.to_rfc3339(),
                    record.total_stations,
                    record.error_stations,
                    errors_json,
                ],
            )?;
            debug!("Cycle run recorded");
            Ok(())
        })
        .await
        .map_err(|e| PersistError::Runtime(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{create_pool, DatabaseConfig};

    fn store() -> SqliteObservationStore {
        let config = DatabaseConfig {
            path: ":memory:".to_string(),
            max_connections: 1,
            run_migrations: true,
        };
        let pool = create_pool(&config).unwrap();
        SqliteObservationStore::new(Arc::new(pool))
    }

    fn observation(station_id: Uuid, observed_at: DateTime<Utc>) -> NormalizedObservation {
        let mut obs = NormalizedObservation::new(station_id, observed_at);
        obs.temperature = Some(12.5);
        obs.wind_speed = Some(3.4);
        obs
    }

    #[tokio::test]
    async fn upsert_then_read_back() {
        let store = store();
        let station_id = Uuid::new_v4();
        let observed_at = Utc::now();

        store
            .upsert(&observation(station_id, observed_at))
            .await
            .unwrap();

        let stored = store
            .observation(station_id, observed_at)
            .await
            .unwrap()
            .expect("row should exist");
        assert_eq!(stored.temperature, Some(12.5));
        assert!(stored.pressure.is_none());
        assert!(!stored.flagged);
    }

    #[tokio::test]
    async fn upsert_same_key_overwrites_in_place() {
        let store = store();
        let station_id = Uuid::new_v4();
        let observed_at = Utc::now();

        store
            .upsert(&observation(station_id, observed_at))
            .await
            .unwrap();

        let mut updated = observation(station_id, observed_at);
        updated.temperature = Some(13.0);
        updated.flagged = true;
        store.upsert(&updated).await.unwrap();

        assert_eq!(store.observation_count().await.unwrap(), 1);
        let stored = store
            .observation(station_id, observed_at)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.temperature, Some(13.0));
        assert!(stored.flagged);
    }

    #[tokio::test]
    async fn incidents_accumulate_until_success_resets() {
        let store = store();
        let station_id = Uuid::new_v4();

        store.record_incident(station_id).await.unwrap();
        store.record_incident(station_id).await.unwrap();
        let state = store.station_state(station_id).await.unwrap().unwrap();
        assert_eq!(state.incident_count, 2);
        assert!(state.last_success_at.is_none());

        let at = Utc::now();
        store.mark_success(station_id, at).await.unwrap();
        let state = store.station_state(station_id).await.unwrap().unwrap();
        assert_eq!(state.incident_count, 0);
        assert_eq!(
            state.last_success_at.map(|t| t.timestamp()),
            Some(at.timestamp())
        );
    }

    #[tokio::test]
    async fn cycle_run_row_is_appended() {
        let store = store();
        let station_id = Uuid::new_v4();
        let mut errors = BTreeMap::new();
        errors.insert(station_id, "timeout: request timed out".to_string());

        store
            .record_cycle(&CycleRecord {
                run_id: Uuid::new_v4(),
                started_at: Utc::now(),
                finished_at: Utc::now(),
                total_stations: 3,
                error_stations: 1,
                errors,
            })
            .await
            .unwrap();

        let pool = Arc::clone(&store.pool);
        let (count, errors_json): (i64, Option<String>) = task::spawn_blocking(move || {
            let conn = pool.get().unwrap();
            conn.query_row(
                "SELECT COUNT(*), MAX(errors) FROM cycle_runs",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap()
        })
        .await
        .unwrap();
        assert_eq!(count, 1);
        assert!(errors_json.unwrap().contains("timeout"));
    }

    #[tokio::test]
    async fn missing_rows_read_as_none() {
        let store = store();
        assert!(store
            .observation(Uuid::new_v4(), Utc::now())
            .await
            .unwrap()
            .is_none());
        assert!(store.station_state(Uuid::new_v4()).await.unwrap().is_none());
    }
}
