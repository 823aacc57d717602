//! Polling cycle execution
//!
//! One [`Gatherer::run`] call polls every configured station once, with at
//! most `max_workers` fetches in flight. Every station produces exactly one
//! outcome; a failing station never aborts the cycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use domain::{CycleReport, FailureKind, StationConfig, StationFailure, StationOutcome};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use readers::{HttpClient, ReadError, ReaderSet};
use storage::{CycleRecord, ObservationStore};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::GathererConfig;
use crate::postprocess;

/// Lifecycle of a gatherer's current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    NotStarted,
    Running,
    Completed,
}

/// Polls stations and persists their observations.
pub struct Gatherer<S> {
    readers: ReaderSet,
    store: Arc<S>,
    config: GathererConfig,
    state: Mutex<CycleState>,
}

impl<S: ObservationStore> Gatherer<S> {
    /// Build a gatherer with its own HTTP client and reader set.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(config: GathererConfig, store: Arc<S>) -> Result<Self, ReadError> {
        let http = HttpClient::new(Duration::from_secs(config.request_timeout_secs))?;
        let readers = ReaderSet::new(&config.endpoints, http);
        Ok(Self {
            readers,
            store,
            config,
            state: Mutex::new(CycleState::NotStarted),
        })
    }

    /// Current cycle state.
    pub fn state(&self) -> CycleState {
        *self.state.lock()
    }

    /// Poll every station once and return the cycle report.
    ///
    /// An empty station list yields an empty report. Unless `dry_run` is
    /// set, the run row is persisted after the cycle; a bookkeeping failure
    /// is logged but never fails the run.
    #[instrument(skip_all, fields(run_id, stations = stations.len()))]
    pub async fn run(&self, stations: &[StationConfig]) -> CycleReport {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        let started_at = Utc::now();
        *self.state.lock() = CycleState::Running;
        info!(dry_run = self.config.dry_run, "Starting polling cycle");

        let workers = self.config.max_workers.max(1);
        let outcomes: Vec<StationOutcome> = stream::iter(stations)
            .map(|station| self.poll_station(station))
            .buffer_unordered(workers)
            .collect()
            .await;

        let report = CycleReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        let summary = report.summary();
        info!(%summary, "Polling cycle finished");

        if !self.config.dry_run {
            let record = CycleRecord {
                run_id: report.run_id,
                started_at: report.started_at,
                finished_at: report.finished_at,
                total_stations: summary.total,
                error_stations: summary.failed,
                errors: report.failure_messages(),
            };
            if let Err(e) = self.store.record_cycle(&record).await {
                error!(error = %e, "Failed to record cycle run");
            }
        }

        *self.state.lock() = CycleState::Completed;
        report
    }

    #[instrument(skip_all, fields(station = %station.id, provider = %station.provider))]
    async fn poll_station(&self, station: &StationConfig) -> StationOutcome {
        let result = self.fetch_and_store(station).await;

        match &result {
            Ok(observation) => {
                if !self.config.dry_run {
                    if let Err(e) = self
                        .store
                        .mark_success(station.id, observation.observed_at)
                        .await
                    {
                        warn!(error = %e, "Failed to record station success");
                    }
                }
            }
            Err(failure) => {
                warn!(kind = %failure.kind, message = %failure.message, "Station poll failed");
                if !self.config.dry_run {
                    if let Err(e) = self.store.record_incident(station.id).await {
                        warn!(error = %e, "Failed to record station incident");
                    }
                }
            }
        }

        StationOutcome {
            station_id: station.id,
            provider: station.provider,
            result,
        }
    }

    async fn fetch_and_store(
        &self,
        station: &StationConfig,
    ) -> Result<domain::NormalizedObservation, StationFailure> {
        let reader = self.readers.get(station.provider);
        let budget = Duration::from_secs(self.config.request_timeout_secs);

        let observation = match timeout(budget, reader.fetch(station)).await {
            Err(_) => {
                return Err(StationFailure {
                    kind: FailureKind::Timeout,
                    message: format!("no response within {}s", budget.as_secs()),
                });
            }
            Ok(Err(e)) => {
                return Err(StationFailure {
                    kind: e.failure_kind(),
                    message: e.to_string(),
                });
            }
            Ok(Ok(observation)) => observation,
        };

        let observation = postprocess::apply(observation, station);

        if self.config.dry_run {
            debug!(observed_at = %observation.observed_at, "Dry run, observation not persisted");
        } else {
            self.store
                .upsert(&observation)
                .await
                .map_err(|e| StationFailure {
                    kind: FailureKind::Persist,
                    message: e.to_string(),
                })?;
        }

        Ok(observation)
    }
}
