//! Observation postprocessing
//!
//! Applied to every observation between fetch and upsert, in a fixed order:
//! correction (station calibration, rounding), range validation, then
//! derived fields. Pure transformations, no failure mode.

pub mod corrector;
pub mod derive;
pub mod validator;

use domain::{NormalizedObservation, StationConfig};

/// Run the full postprocessing chain for one station's observation.
#[must_use]
pub fn apply(
    mut observation: NormalizedObservation,
    station: &StationConfig,
) -> NormalizedObservation {
    corrector::apply(&mut observation, station.pressure_offset);
    validator::apply(&mut observation);
    derive::apply(&mut observation);
    observation
}
