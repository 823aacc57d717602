//! Database migrations
//!
//! Schema versioning with embedded migration code. The SQL files under
//! `/migrations` at the project root mirror the embedded statements and
//! serve as documentation for manual setup.
//!
//! Adding a migration:
//! 1. Create `migrations/VXXX__description.sql`
//! 2. Increment `SCHEMA_VERSION`
//! 3. Add a `migrate_vX` function and call it from `run_migrations`

use rusqlite::Connection;
use tracing::{debug, error, info};

use super::connection::PersistError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if a migration statement fails; the schema version is
/// only advanced after every pending migration succeeded.
pub fn run_migrations(conn: &Connection) -> Result<(), PersistError> {
    let current_version = get_schema_version(conn)?;

    if current_version < SCHEMA_VERSION {
        info!(
            from_version = current_version,
            to_version = SCHEMA_VERSION,
            "Running database migrations"
        );

        if current_version < 1 {
            if let Err(e) = migrate_v1(conn) {
                error!(
                    version = 1,
                    error = %e,
                    "Migration V001 (initial schema) failed. Check migrations/V001__initial_schema.sql for the expected schema."
                );
                return Err(e);
            }
        }

        set_schema_version(conn, SCHEMA_VERSION)?;
        info!(version = SCHEMA_VERSION, "Database migrations complete");
    } else {
        debug!(version = current_version, "Database schema is up to date");
    }

    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32, PersistError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), PersistError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// V001: observations, per-station state and the cycle run log
fn migrate_v1(conn: &Connection) -> Result<(), PersistError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS observations (
            station_id TEXT NOT NULL,
            observed_at TEXT NOT NULL,
            taken_at TEXT NOT NULL,
            temperature REAL,
            humidity REAL,
            pressure REAL,
            wind_speed REAL,
            wind_gust REAL,
            wind_direction REAL,
            rain_rate REAL,
            rain_day REAL,
            max_temperature REAL,
            min_temperature REAL,
            max_wind_speed REAL,
            max_wind_gust REAL,
            dew_point REAL,
            heat_index REAL,
            flagged INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (station_id, observed_at)
        );

        CREATE INDEX IF NOT EXISTS idx_observations_observed_at
            ON observations(observed_at);

        CREATE TABLE IF NOT EXISTS station_state (
            station_id TEXT PRIMARY KEY,
            last_success_at TEXT,
            incident_count INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS cycle_runs (
            run_id TEXT PRIMARY KEY,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            total_stations INTEGER NOT NULL,
            error_stations INTEGER NOT NULL,
            errors TEXT
        );
        ",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_connection() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn migrations_run_from_scratch() {
        let conn = test_connection();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = test_connection();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn schema_has_expected_tables() {
        let conn = test_connection();
        run_migrations(&conn).unwrap();

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('observations', 'station_state', 'cycle_runs')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }
}
