//! End-to-end cycle tests with mock providers
//!
//! Each test wires a Gatherer against a wiremock provider and either an
//! in-memory SQLite store or a mocked store, then checks the report and
//! the persisted rows.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{FailureKind, NormalizedObservation, Provider, StationConfig};
use gatherer::{CycleState, Gatherer, GathererConfig};
use mockall::mock;
use mockall::predicate::always;
use readers::EndpointConfig;
use storage::{
    create_pool, CycleRecord, DatabaseConfig, ObservationStore, PersistError,
    SqliteObservationStore,
};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mock! {
    Store {}

    #[async_trait]
    impl ObservationStore for Store {
        async fn upsert(&self, observation: &NormalizedObservation) -> Result<(), PersistError>;
        async fn mark_success(
            &self,
            station_id: Uuid,
            at: DateTime<Utc>,
        ) -> Result<(), PersistError>;
        async fn record_incident(&self, station_id: Uuid) -> Result<(), PersistError>;
        async fn record_cycle(&self, record: &CycleRecord) -> Result<(), PersistError>;
    }
}

fn sqlite_store() -> Arc<SqliteObservationStore> {
    let config = DatabaseConfig {
        path: ":memory:".to_string(),
        max_connections: 1,
        run_migrations: true,
    };
    let pool = create_pool(&config).unwrap();
    Arc::new(SqliteObservationStore::new(Arc::new(pool)))
}

fn config_for(mock_server: &MockServer) -> GathererConfig {
    GathererConfig {
        endpoints: EndpointConfig::rooted_at(&mock_server.uri()),
        ..GathererConfig::default()
    }
}

fn holfuy_station() -> StationConfig {
    let mut station = StationConfig::new(Uuid::new_v4(), Provider::Holfuy);
    station.station_key = Some("101".to_string());
    station.api_secret = Some("secret".to_string());
    station
}

async fn mount_holfuy_success(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/live/live.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "stationId": 101,
            "dateTime": Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            "temperature": 17.23,
            "humidity": 66,
            "pressure": 1014.0,
            "rain": 0.0,
            "wind": {"speed": 21.6, "gust": 32.4, "direction": 90},
            "daily": {"max_temp": 19.0, "min_temp": 9.0, "max_wind_speed": 40.0,
                      "max_wind_gust": 55.0, "sum_rain": 4.0}
        })))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn cycle_fetches_postprocesses_and_persists() {
    let mock_server = MockServer::start().await;
    mount_holfuy_success(&mock_server).await;

    let store = sqlite_store();
    let mut station = holfuy_station();
    station.pressure_offset = Some(-4.0);

    let gatherer = Gatherer::new(config_for(&mock_server), Arc::clone(&store)).unwrap();
    assert_eq!(gatherer.state(), CycleState::NotStarted);

    let report = gatherer.run(std::slice::from_ref(&station)).await;

    assert_eq!(gatherer.state(), CycleState::Completed);
    assert_eq!(report.len(), 1);
    let summary = report.summary();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);

    let outcome = &report.outcomes[0];
    let obs = outcome.result.as_ref().unwrap();
    // Rounded, offset applied, wind converted to m/s, derived field filled
    assert_eq!(obs.temperature, Some(17.2));
    assert_eq!(obs.pressure, Some(1010.0));
    assert_eq!(obs.wind_speed, Some(6.0));
    assert!(obs.dew_point.is_some());

    assert_eq!(store.observation_count().await.unwrap(), 1);
    let state = store.station_state(station.id).await.unwrap().unwrap();
    assert_eq!(state.incident_count, 0);
    assert!(state.last_success_at.is_some());
}

#[tokio::test]
async fn auth_failure_is_reported_and_counted_as_incident() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/live/live.php"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad password"))
        .mount(&mock_server)
        .await;

    let store = sqlite_store();
    let station = holfuy_station();
    let gatherer = Gatherer::new(config_for(&mock_server), Arc::clone(&store)).unwrap();

    let report = gatherer.run(std::slice::from_ref(&station)).await;

    assert!(report.has_auth_failures());
    let (_, failure) = report.failures().next().unwrap();
    assert_eq!(failure.kind, FailureKind::Auth);

    assert_eq!(store.observation_count().await.unwrap(), 0);
    let state = store.station_state(station.id).await.unwrap().unwrap();
    assert_eq!(state.incident_count, 1);
}

#[tokio::test]
async fn slow_provider_times_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/live/live.php"))
        .respond_with(
            ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let store = sqlite_store();
    let config = GathererConfig {
        request_timeout_secs: 1,
        ..config_for(&mock_server)
    };
    let gatherer = Gatherer::new(config, store).unwrap();

    let report = gatherer.run(&[holfuy_station()]).await;

    let (_, failure) = report.failures().next().unwrap();
    assert_eq!(failure.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn mixed_outcomes_give_one_outcome_per_station() {
    let mock_server = MockServer::start().await;
    mount_holfuy_success(&mock_server).await;

    let healthy = holfuy_station();
    let mut unreachable = StationConfig::new(Uuid::new_v4(), Provider::Realtime);
    unreachable.endpoint = Some("http://127.0.0.1:1".to_string());

    let store = sqlite_store();
    let gatherer = Gatherer::new(config_for(&mock_server), Arc::clone(&store)).unwrap();

    let report = gatherer.run(&[healthy.clone(), unreachable.clone()]).await;

    assert_eq!(report.len(), 2);
    let summary = report.summary();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert!(!report.has_auth_failures());

    let (outcome, failure) = report.failures().next().unwrap();
    assert_eq!(outcome.station_id, unreachable.id);
    assert_eq!(failure.kind, FailureKind::ConnectionFailed);

    assert_eq!(store.observation_count().await.unwrap(), 1);
    let state = store.station_state(unreachable.id).await.unwrap().unwrap();
    assert_eq!(state.incident_count, 1);
}

#[tokio::test]
async fn dry_run_reports_without_persisting() {
    let mock_server = MockServer::start().await;
    mount_holfuy_success(&mock_server).await;

    let store = sqlite_store();
    let config = GathererConfig {
        dry_run: true,
        ..config_for(&mock_server)
    };
    let gatherer = Gatherer::new(config, Arc::clone(&store)).unwrap();

    let report = gatherer.run(&[holfuy_station()]).await;

    assert_eq!(report.summary().succeeded, 1);
    assert_eq!(store.observation_count().await.unwrap(), 0);
    assert!(store
        .station_state(report.outcomes[0].station_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn store_failure_becomes_persist_outcome() {
    let mock_server = MockServer::start().await;
    mount_holfuy_success(&mock_server).await;

    let mut store = MockStore::new();
    store
        .expect_upsert()
        .with(always())
        .returning(|_| Err(PersistError::Runtime("disk full".to_string())));
    store.expect_record_incident().returning(|_| Ok(()));
    store.expect_record_cycle().times(1).returning(|_| Ok(()));

    let gatherer = Gatherer::new(config_for(&mock_server), Arc::new(store)).unwrap();
    let report = gatherer.run(&[holfuy_station()]).await;

    let (_, failure) = report.failures().next().unwrap();
    assert_eq!(failure.kind, FailureKind::Persist);
    assert!(failure.message.contains("disk full"));
}

#[tokio::test]
async fn single_worker_still_covers_every_station() {
    let mock_server = MockServer::start().await;
    mount_holfuy_success(&mock_server).await;

    let stations: Vec<_> = (0..3).map(|_| holfuy_station()).collect();
    let store = sqlite_store();
    let config = GathererConfig {
        max_workers: 1,
        ..config_for(&mock_server)
    };
    let gatherer = Gatherer::new(config, Arc::clone(&store)).unwrap();

    let report = gatherer.run(&stations).await;

    assert_eq!(report.len(), 3);
    assert_eq!(report.summary().succeeded, 3);
    assert_eq!(store.observation_count().await.unwrap(), 3);
}

#[tokio::test]
async fn empty_station_list_is_an_empty_report() {
    let mock_server = MockServer::start().await;
    let store = sqlite_store();
    let gatherer = Gatherer::new(config_for(&mock_server), store).unwrap();

    let report = gatherer.run(&[]).await;

    assert!(report.is_empty());
    assert!(!report.has_auth_failures());
    assert_eq!(gatherer.state(), CycleState::Completed);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
