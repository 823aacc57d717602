//! SQLite persistence for the weather observation gatherer
//!
//! Observation upserts keyed by `(station_id, observed_at)`, per-station
//! health bookkeeping and a per-cycle run log.

pub mod connection;
pub mod migrations;
pub mod observation_store;

pub use connection::{create_pool, ConnectionPool, DatabaseConfig, PersistError};
pub use observation_store::{CycleRecord, ObservationStore, SqliteObservationStore, StationState};
