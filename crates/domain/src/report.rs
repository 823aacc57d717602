//! Per-cycle reporting
//!
//! A [`CycleReport`] carries exactly one [`StationOutcome`] per configured
//! station, regardless of worker scheduling. Failures are classified by
//! [`FailureKind`] so the caller can tell a misconfigured credential apart
//! from a transient network fault.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::observation::NormalizedObservation;
use crate::station::Provider;

/// Classification of a station failure within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The per-request timeout elapsed before the provider answered
    Timeout,
    /// Transport-level failure (DNS, refused connection, reset)
    ConnectionFailed,
    /// The provider answered with an unexpected HTTP status
    HttpStatus(u16),
    /// The provider rejected the configured credentials
    Auth,
    /// The response body did not match the expected shape, or carried
    /// values the normalization layer refused
    Parse,
    /// The store rejected or failed the upsert
    Persist,
}

impl FailureKind {
    /// True for failures that indicate a configuration defect rather than
    /// transience; the process exit contract keys on this.
    #[must_use]
    pub const fn is_configuration_defect(self) -> bool {
        matches!(self, Self::Auth)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::ConnectionFailed => f.write_str("connection_failed"),
            Self::HttpStatus(code) => write!(f, "http_status_{code}"),
            Self::Auth => f.write_str("auth"),
            Self::Parse => f.write_str("parse"),
            Self::Persist => f.write_str("persist"),
        }
    }
}

/// One station's failure within a cycle.
#[derive(Debug, Clone)]
pub struct StationFailure {
    pub kind: FailureKind,
    /// Diagnostic context: provider error text, HTTP status, parse detail
    pub message: String,
}

impl fmt::Display for StationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome for one station in one cycle.
#[derive(Debug, Clone)]
pub struct StationOutcome {
    pub station_id: Uuid,
    pub provider: Provider,
    pub result: Result<NormalizedObservation, StationFailure>,
}

/// Aggregate outcome of one polling cycle.
///
/// Built by the gatherer while the cycle runs, immutable once returned.
#[derive(Debug)]
pub struct CycleReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<StationOutcome>,
}

impl CycleReport {
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Outcomes that produced a persisted observation.
    pub fn successes(&self) -> impl Iterator<Item = &StationOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    /// Outcomes that failed, with their classified failure.
    pub fn failures(&self) -> impl Iterator<Item = (&StationOutcome, &StationFailure)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|f| (o, f)))
    }

    /// True when at least one station failed with a configuration-class
    /// error; the CLI exits non-zero on this.
    #[must_use]
    pub fn has_auth_failures(&self) -> bool {
        self.failures()
            .any(|(_, f)| f.kind.is_configuration_defect())
    }

    /// Collapse the outcomes into per-provider counts for the cycle log.
    #[must_use]
    pub fn summary(&self) -> CycleSummary {
        let mut by_provider: BTreeMap<Provider, BTreeMap<String, usize>> = BTreeMap::new();
        for outcome in &self.outcomes {
            let bucket = by_provider.entry(outcome.provider).or_default();
            let key = match &outcome.result {
                Ok(_) => "success".to_string(),
                Err(failure) => failure.kind.to_string(),
            };
            *bucket.entry(key).or_insert(0) += 1;
        }
        CycleSummary {
            total: self.outcomes.len(),
            succeeded: self.successes().count(),
            failed: self.failures().count(),
            by_provider,
        }
    }

    /// Failure messages keyed by station id, for run bookkeeping.
    #[must_use]
    pub fn failure_messages(&self) -> BTreeMap<Uuid, String> {
        self.failures()
            .map(|(o, f)| (o.station_id, f.to_string()))
            .collect()
    }
}

/// Counts of outcomes per provider and failure kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// provider → outcome label ("success" or a failure kind) → count
    pub by_provider: BTreeMap<Provider, BTreeMap<String, usize>>,
}

impl fmt::Display for CycleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} stations, {} ok, {} failed",
            self.total, self.succeeded, self.failed
        )?;
        for (provider, buckets) in &self.by_provider {
            write!(f, "; {provider}:")?;
            for (label, count) in buckets {
                write!(f, " {label}={count}")?;
            }
        }
        Ok(())
    }
}
