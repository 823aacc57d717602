//! Domain layer for the weather observation gatherer
//!
//! Station configuration, the canonical observation record, per-cycle
//! reporting types and the unit conversion layer. This crate holds no I/O;
//! readers, storage and orchestration build on top of it.

pub mod observation;
pub mod report;
pub mod station;
pub mod units;

pub use observation::NormalizedObservation;
pub use report::{CycleReport, CycleSummary, FailureKind, StationFailure, StationOutcome};
pub use station::{ParseProviderError, Provider, StationConfig};
pub use units::ConvertError;
