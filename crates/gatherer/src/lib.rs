//! Polling cycle orchestration
//!
//! Fans station polls out over a bounded worker pool, postprocesses every
//! observation (correction, range validation, derived fields) and hands the
//! result to the observation store. One [`CycleReport`] per run, one outcome
//! per station.
//!
//! [`CycleReport`]: domain::CycleReport

pub mod config;
pub mod cycle;
pub mod postprocess;

pub use config::GathererConfig;
pub use cycle::{CycleState, Gatherer};
